use axum::{Json, extract::State, http::StatusCode};
use cards::types::{CardInstance, UserProfile};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::AuthenticatedUser,
};

// Login request, as handed over by the identity provider callback
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub twitch_id: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

// Login response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
    pub user: AuthenticatedUser,
}

// Login endpoint: registers the user on first login, syncs the profile afterwards
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let user = state.claims.register_user(
        UserProfile {
            twitch_id: payload.twitch_id,
            display_name: payload.display_name,
            profile_image_url: payload.profile_image_url,
        },
        Utc::now(),
    )?;

    let session_id = state
        .sessions
        .create_session(&user.twitch_id)
        .map_err(cards::error::ClaimError::from)?;
    tracing::info!(user_id = %user.twitch_id, "User logged in");

    let response = LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        session_id,
        user: AuthenticatedUser::from(user),
    };
    Ok((StatusCode::OK, Json(response)))
}

// User profile response
#[derive(Serialize)]
pub struct UserProfileResponse {
    pub success: bool,
    pub user: AuthenticatedUser,
    pub message: String,
}

// Get user profile endpoint (protected route)
pub async fn get_profile(AuthUser(user): AuthUser) -> (StatusCode, Json<UserProfileResponse>) {
    let response = UserProfileResponse {
        success: true,
        user,
        message: "Profile retrieved successfully".to_string(),
    };
    (StatusCode::OK, Json(response))
}

// Collection response
#[derive(Serialize)]
pub struct CollectionResponse {
    pub success: bool,
    pub cards: Vec<CardInstance>,
}

// Cards owned by the logged-in user, in mint order
pub async fn get_collection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CollectionResponse>, AppError> {
    let cards = state.claims.collection(&user.twitch_id)?;
    Ok(Json(CollectionResponse {
        success: true,
        cards,
    }))
}
