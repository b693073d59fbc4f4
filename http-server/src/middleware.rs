use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use sha2::{Digest, Sha256};

use crate::{AppState, error::AppError, models::AuthenticatedUser};

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    // Extract the Authorization header
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))
}

// Axum extractor for logged-in users
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let twitch_id = state
            .sessions
            .twitch_id_for_session(token)
            .map_err(cards::error::ClaimError::from)?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        let user = state.claims.get_user(&twitch_id)?;
        Ok(AuthUser(AuthenticatedUser::from(user)))
    }
}

// Compare digests so the check does not short-circuit on the first differing byte
fn token_matches(expected: &str, presented: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(presented.as_bytes())
}

fn check_shared_token(
    parts: &Parts,
    expected: Option<&str>,
    surface: &str,
) -> Result<(), AppError> {
    let token = bearer_token(parts)?;

    match expected {
        Some(expected) if token_matches(expected, token) => Ok(()),
        Some(_) => Err(AppError::Unauthorized(format!("Invalid {surface} token"))),
        None => Err(AppError::Unauthorized(format!(
            "{surface} token is not configured"
        ))),
    }
}

// Axum extractor guarding admin routes with the configured token
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check_shared_token(parts, state.config.admin_token.as_deref(), "admin")?;
        Ok(AdminAuth)
    }
}

// Axum extractor for chat connectors relaying messages to the bot
#[derive(Debug, Clone, Copy)]
pub struct ChatBridgeAuth;

impl FromRequestParts<AppState> for ChatBridgeAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check_shared_token(parts, state.config.chat_bridge_token.as_deref(), "chat bridge")?;
        Ok(ChatBridgeAuth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut request = Request::builder().uri("/admin/cards");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("admin-secret", "admin-secret"));
        assert!(!token_matches("admin-secret", "admin-secreT"));
        assert!(!token_matches("admin-secret", "admin"));
        assert!(!token_matches("admin-secret", ""));
    }

    #[test]
    fn test_shared_token_check() {
        let expected = Some("bridge-secret");

        assert!(
            check_shared_token(&parts(Some("Bearer bridge-secret")), expected, "chat bridge")
                .is_ok()
        );
        assert!(matches!(
            check_shared_token(&parts(Some("Bearer bridge")), expected, "chat bridge"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_shared_token(&parts(Some("bridge-secret")), expected, "chat bridge"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_shared_token(&parts(None), expected, "chat bridge"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_shared_token(&parts(Some("Bearer bridge-secret")), None, "chat bridge"),
            Err(AppError::Unauthorized(message)) if message == "chat bridge token is not configured"
        ));
    }
}
