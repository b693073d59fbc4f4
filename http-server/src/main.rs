use axum::{
    Router,
    routing::{any, get, post},
};
use cards::claim::ClaimOrchestrator;
use cards::store::InMemoryStorage;
use cards::types::CardDefinitionRequest;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod chat;
mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod websocket;

use chat::CommandRegistry;
use config::ServerConfig;
use models::SessionStorage;
use routes::cards::{add_card, get_cards};
use routes::chat::chat_message;
use routes::claims::{claim_pack, claim_status};
use routes::users::{get_collection, get_profile, login};
use websocket::{OverlayFeed, create_overlay_feed, overlay_handler};

// Application state shared by the web API, the chat bridge and the overlay feed
#[derive(Clone)]
pub struct AppState {
    pub claims: Arc<ClaimOrchestrator<InMemoryStorage>>,
    pub sessions: SessionStorage,
    pub chat: Arc<CommandRegistry>,
    pub overlay: OverlayFeed,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            claims: Arc::new(ClaimOrchestrator::new(
                InMemoryStorage::new(),
                config.claim.clone(),
            )),
            sessions: SessionStorage::new(),
            chat: Arc::new(CommandRegistry::with_default_commands()),
            overlay: create_overlay_feed(),
            config: Arc::new(config),
        }
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/profile", get(get_profile))
        .route("/cards", get(get_cards))
        .route("/cards/collection", get(get_collection))
        .route("/claim", post(claim_pack))
        .route("/claim/status", get(claim_status))
        .route("/admin/cards", post(add_card))
        .route("/chat/message", post(chat_message))
        .route("/overlay", any(overlay_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// Load card definitions from a JSON array of add-card requests
fn seed_cards(state: &AppState, path: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let requests: Vec<CardDefinitionRequest> = serde_json::from_str(&contents)?;
    for request in &requests {
        state.claims.add_card(request)?;
    }
    Ok(requests.len())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "http_server=debug,cards=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN is not set, admin routes are disabled");
    }
    if config.chat_bridge_token.is_none() {
        tracing::warn!("CHAT_BRIDGE_TOKEN is not set, the chat bridge is disabled");
    }

    let state = AppState::new(config.clone());
    tracing::info!("In-memory storage initialized successfully");

    if let Some(path) = &config.seed_cards_file {
        let loaded = seed_cards(&state, path)?;
        tracing::info!("Loaded {} card definitions from {}", loaded, path);
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// Root endpoint
async fn root() -> &'static str {
    "Card Pack API - Use POST /login to authenticate, POST /claim to open your daily pack, GET /cards/collection to see your cards, WebSocket /overlay for live claim announcements"
}
