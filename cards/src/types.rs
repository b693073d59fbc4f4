use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClaimError;

/// `max_supply` sentinel for definitions that can be minted without limit
pub const UNLIMITED_SUPPLY: i64 = -1;

/// A card template. Never owned by a user; instances are minted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinition {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub rarity: String,
    pub attack: i64,
    pub defense: i64,
    pub image_url: String,
    /// Supply cap, or [`UNLIMITED_SUPPLY`]
    pub max_supply: i64,
    /// Number of instances minted against this definition
    pub current_supply: u64,
}

impl CardDefinition {
    pub fn is_unlimited(&self) -> bool {
        self.max_supply == UNLIMITED_SUPPLY
    }

    /// A capped definition whose minted count has reached the cap
    pub fn is_exhausted(&self) -> bool {
        !self.is_unlimited() && self.current_supply >= self.max_supply as u64
    }

    /// Units left to mint, `None` when unlimited
    pub fn remaining_supply(&self) -> Option<u64> {
        if self.is_unlimited() {
            None
        } else {
            Some((self.max_supply as u64).saturating_sub(self.current_supply))
        }
    }

    pub fn matches(&self, name: &str, card_type: &str, rarity: &str) -> bool {
        self.name == name && self.card_type == card_type && self.rarity == rarity
    }
}

/// Validated fields for a definition that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCardDefinition {
    pub name: String,
    pub card_type: String,
    pub rarity: String,
    pub attack: i64,
    pub defense: i64,
    pub image_url: String,
    pub max_supply: i64,
}

/// A concrete card owned by a user. Immutable once minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInstance {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub rarity: String,
    pub attack: i64,
    pub defense: i64,
    pub image_url: String,
    /// Definition supply numbers at mint time
    pub max_supply: i64,
    pub current_supply: u64,
    pub owner_id: Option<String>,
    pub minted_at: DateTime<Utc>,
}

/// Instance fields before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCardInstance {
    pub name: String,
    pub card_type: String,
    pub rarity: String,
    pub attack: i64,
    pub defense: i64,
    pub image_url: String,
    pub max_supply: i64,
    pub current_supply: u64,
    pub owner_id: Option<String>,
    pub minted_at: DateTime<Utc>,
}

impl NewCardInstance {
    pub fn with_id(self, id: u64) -> CardInstance {
        CardInstance {
            id,
            name: self.name,
            card_type: self.card_type,
            rarity: self.rarity,
            attack: self.attack,
            defense: self.defense,
            image_url: self.image_url,
            max_supply: self.max_supply,
            current_supply: self.current_supply,
            owner_id: self.owner_id,
            minted_at: self.minted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub twitch_id: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub currency: i64,
    pub last_pack_claimed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Profile fields handed over by the identity collaborator (login or chat)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub twitch_id: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Numeric request field: a JSON integer, an integral float, or an integer string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumericField {
    fn coerce(&self, field: &str) -> Result<i64, ClaimError> {
        match self {
            NumericField::Integer(value) => Ok(*value),
            // `as` saturates, so out-of-range floats are rejected before the cast
            NumericField::Float(value)
                if value.fract() == 0.0 && *value >= i64::MIN as f64 && *value < i64::MAX as f64 =>
            {
                Ok(*value as i64)
            }
            NumericField::Float(_) => Err(ClaimError::Validation(format!(
                "{field} must be a whole number in range"
            ))),
            NumericField::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                ClaimError::Validation(format!("{field} must be numeric, got '{text}'"))
            }),
        }
    }
}

/// Raw admin "add card" body, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinitionRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
    pub rarity: Option<String>,
    pub attack: Option<NumericField>,
    pub defense: Option<NumericField>,
    pub image_url: Option<String>,
    pub max_supply: Option<NumericField>,
}

fn required_text(value: &Option<String>, field: &str) -> Result<String, ClaimError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ClaimError::Validation(format!("{field} is required"))),
    }
}

fn required_number(value: &Option<NumericField>, field: &str) -> Result<i64, ClaimError> {
    value
        .as_ref()
        .ok_or_else(|| ClaimError::Validation(format!("{field} is required")))?
        .coerce(field)
}

impl CardDefinitionRequest {
    /// Required: name, type, rarity, attack, defense.
    /// Optional: imageUrl (empty), maxSupply (unlimited, must be >= -1).
    pub fn validate(&self) -> Result<NewCardDefinition, ClaimError> {
        let name = required_text(&self.name, "name")?;
        let card_type = required_text(&self.card_type, "type")?;
        let rarity = required_text(&self.rarity, "rarity")?;
        let attack = required_number(&self.attack, "attack")?;
        let defense = required_number(&self.defense, "defense")?;

        let max_supply = match &self.max_supply {
            Some(field) => field.coerce("maxSupply")?,
            None => UNLIMITED_SUPPLY,
        };
        if max_supply < UNLIMITED_SUPPLY {
            return Err(ClaimError::Validation(format!(
                "maxSupply must be -1 (unlimited) or non-negative, got {max_supply}"
            )));
        }

        Ok(NewCardDefinition {
            name,
            card_type,
            rarity,
            attack,
            defense,
            image_url: self.image_url.clone().unwrap_or_default(),
            max_supply,
        })
    }
}
