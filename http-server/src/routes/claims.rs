use axum::{Json, extract::State, http::StatusCode};
use cards::cooldown::CooldownStatus;
use cards::types::CardInstance;
use chrono::Utc;
use serde::Serialize;

use crate::{AppState, error::AppResult, middleware::AuthUser, websocket::announce_claim};

// Claim response
#[derive(Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub message: String,
    pub card: CardInstance,
    pub currency: i64,
}

// Redeem the daily pack for the logged-in user
pub async fn claim_pack(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<(StatusCode, Json<ClaimResponse>)> {
    let outcome = state.claims.claim_daily_pack(&user.twitch_id, Utc::now())?;
    announce_claim(&state.overlay, &outcome.user, &outcome.card);

    let response = ClaimResponse {
        success: true,
        message: format!("You got {} ({})!", outcome.card.name, outcome.card.rarity),
        currency: outcome.new_currency(),
        card: outcome.card,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

// Claim status response
#[derive(Serialize)]
pub struct ClaimStatusResponse {
    pub ready: bool,
    pub hours: i64,
    pub minutes: i64,
}

// Whether the daily pack can be claimed, and if not, how long to wait
pub async fn claim_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ClaimStatusResponse>> {
    let response = match state.claims.claim_status(&user.twitch_id, Utc::now())? {
        CooldownStatus::Ready => ClaimStatusResponse {
            ready: true,
            hours: 0,
            minutes: 0,
        },
        CooldownStatus::OnCooldown { remaining } => ClaimStatusResponse {
            ready: false,
            hours: remaining.hours(),
            minutes: remaining.minutes(),
        },
    };
    Ok(Json(response))
}
