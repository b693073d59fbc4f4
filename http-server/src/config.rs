use cards::claim::ClaimConfig;
use cards::cooldown::DEFAULT_COOLDOWN_HOURS;
use chrono::TimeDelta;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// | Env var                    | Default   |
/// |----------------------------|-----------|
/// | `HOST`                     | `0.0.0.0` |
/// | `PORT`                     | `6957`    |
/// | `CLAIM_COOLDOWN_HOURS`     | `24`      |
/// | `CLAIM_CURRENCY_BONUS`     | `0`       |
/// | `STARTING_CURRENCY`        | `0`       |
/// | `CLAIM_SERIALIZE_PER_USER` | `true`    |
/// | `CHAT_AUTO_REGISTER`       | `true`    |
/// | `ADMIN_TOKEN`              | unset     |
/// | `CHAT_BRIDGE_TOKEN`        | unset     |
/// | `SEED_CARDS_FILE`          | unset     |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub claim: ClaimConfig,
    /// Register chat senders the first time they are seen
    pub chat_auto_register: bool,
    /// Bearer token for admin routes; admin routes reject everything when unset
    pub admin_token: Option<String>,
    /// Bearer token chat connectors send to `/chat/message`; the bridge rejects everything when unset
    pub chat_bridge_token: Option<String>,
    /// JSON array of card definition requests loaded at startup
    pub seed_cards_file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 6957,
            claim: ClaimConfig::default(),
            chat_auto_register: true,
            admin_token: None,
            chat_bridge_token: None,
            seed_cards_file: None,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn optional_var(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source, `from_env` reads the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let cooldown_hours: i64 =
            parse_var(&lookup, "CLAIM_COOLDOWN_HOURS", DEFAULT_COOLDOWN_HOURS)?;
        let cooldown_window =
            TimeDelta::try_hours(cooldown_hours)
                .filter(|window| *window >= TimeDelta::zero())
                .ok_or_else(|| ConfigError::Invalid {
                    name: "CLAIM_COOLDOWN_HOURS",
                    value: cooldown_hours.to_string(),
                })?;

        Ok(ServerConfig {
            host: optional_var(&lookup, "HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            claim: ClaimConfig {
                cooldown_window,
                currency_bonus: parse_var(
                    &lookup,
                    "CLAIM_CURRENCY_BONUS",
                    defaults.claim.currency_bonus,
                )?,
                starting_currency: parse_var(
                    &lookup,
                    "STARTING_CURRENCY",
                    defaults.claim.starting_currency,
                )?,
                serialize_per_user: parse_var(
                    &lookup,
                    "CLAIM_SERIALIZE_PER_USER",
                    defaults.claim.serialize_per_user,
                )?,
            },
            chat_auto_register: parse_var(
                &lookup,
                "CHAT_AUTO_REGISTER",
                defaults.chat_auto_register,
            )?,
            admin_token: optional_var(&lookup, "ADMIN_TOKEN"),
            chat_bridge_token: optional_var(&lookup, "CHAT_BRIDGE_TOKEN"),
            seed_cards_file: optional_var(&lookup, "SEED_CARDS_FILE"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    fn invalid_name(result: Result<ServerConfig, ConfigError>) -> &'static str {
        match result {
            Err(ConfigError::Invalid { name, .. }) => name,
            Ok(_) => panic!("expected an invalid config"),
        }
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 6957);
        assert_eq!(
            config.claim.cooldown_window,
            TimeDelta::hours(DEFAULT_COOLDOWN_HOURS)
        );
        assert!(config.claim.serialize_per_user);
        assert!(config.chat_auto_register);
        assert!(config.admin_token.is_none());
        assert!(config.chat_bridge_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", " 8080 "),
            ("CLAIM_COOLDOWN_HOURS", "0"),
            ("CLAIM_CURRENCY_BONUS", "50"),
            ("CLAIM_SERIALIZE_PER_USER", "false"),
            ("ADMIN_TOKEN", "secret"),
            ("CHAT_BRIDGE_TOKEN", "  "),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.claim.cooldown_window, TimeDelta::zero());
        assert_eq!(config.claim.currency_bonus, 50);
        assert!(!config.claim.serialize_per_user);
        assert_eq!(config.admin_token.as_deref(), Some("secret"));
        // Blank tokens count as unset
        assert!(config.chat_bridge_token.is_none());
    }

    #[test]
    fn test_invalid_cooldown_hours() {
        for value in ["abc", "-1", "1.5", "9223372036854775807"] {
            assert_eq!(
                invalid_name(load(&[("CLAIM_COOLDOWN_HOURS", value)])),
                "CLAIM_COOLDOWN_HOURS",
                "value {value}"
            );
        }
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        assert_eq!(
            invalid_name(load(&[("CLAIM_SERIALIZE_PER_USER", "yes")])),
            "CLAIM_SERIALIZE_PER_USER"
        );
        assert_eq!(invalid_name(load(&[("PORT", "70000")])), "PORT");
        assert_eq!(
            invalid_name(load(&[("STARTING_CURRENCY", "lots")])),
            "STARTING_CURRENCY"
        );
    }
}
