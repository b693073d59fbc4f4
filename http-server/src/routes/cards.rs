use axum::{Json, extract::State, http::StatusCode};
use cards::types::{CardDefinition, CardDefinitionRequest};
use serde::Serialize;

use crate::{AppState, error::AppResult, middleware::AdminAuth};

// Catalog response
#[derive(Serialize)]
pub struct CatalogResponse {
    pub success: bool,
    pub cards: Vec<CardDefinition>,
}

// Public catalog, exhausted definitions included
pub async fn get_cards(State(state): State<AppState>) -> AppResult<Json<CatalogResponse>> {
    let cards = state.claims.catalog()?;
    Ok(Json(CatalogResponse {
        success: true,
        cards,
    }))
}

// Add card response
#[derive(Serialize)]
pub struct AddCardResponse {
    pub success: bool,
    pub message: String,
    pub card: CardDefinition,
}

// Admin: create a definition, or restock one with the same name, type and rarity
pub async fn add_card(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Json(payload): Json<CardDefinitionRequest>,
) -> AppResult<(StatusCode, Json<AddCardResponse>)> {
    let outcome = state.claims.add_card(&payload)?;

    let (status, message) = if outcome.created {
        (StatusCode::CREATED, "Card created")
    } else {
        (StatusCode::OK, "Card restocked")
    };

    Ok((
        status,
        Json(AddCardResponse {
            success: true,
            message: message.to_string(),
            card: outcome.definition,
        }),
    ))
}
