use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cards::error::ClaimError;
use serde_json::json;

/// Handler-level error, rendered as `{ success: false, message, code }` JSON
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Claim(err) => match err {
                ClaimError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                ClaimError::UnknownUser(_) => (
                    StatusCode::NOT_FOUND,
                    "UNKNOWN_USER",
                    "User not found, log in first".to_string(),
                ),
                ClaimError::CooldownActive { remaining } => {
                    let body = json!({
                        "success": false,
                        "code": "COOLDOWN_ACTIVE",
                        "message": format!(
                            "You can claim your next pack in {} hours and {} minutes",
                            remaining.hours(),
                            remaining.minutes()
                        ),
                        "hours": remaining.hours(),
                        "minutes": remaining.minutes(),
                    });
                    return (StatusCode::BAD_REQUEST, Json(body)).into_response();
                }
                ClaimError::NoEligibleCards => (
                    StatusCode::NOT_FOUND,
                    "NO_ELIGIBLE_CARDS",
                    "No cards are available to claim right now".to_string(),
                ),
                ClaimError::SupplyExhausted(name) => (
                    StatusCode::CONFLICT,
                    "SUPPLY_EXHAUSTED",
                    format!("'{name}' ran out while claiming, try again"),
                ),
                ClaimError::Storage(store_err) => {
                    tracing::error!(error = %store_err, "Storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        };

        let body = json!({
            "success": false,
            "code": code,
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}
