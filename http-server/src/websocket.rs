use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use cards::types::{CardInstance, UserAccount};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::AppState;

// Events pushed to stream overlays
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OverlayEvent {
    #[serde(rename = "card_claimed")]
    CardClaimed {
        display_name: String,
        card_name: String,
        rarity: String,
        image_url: String,
    },
    #[serde(rename = "connection_established")]
    ConnectionEstablished { message: String },
}

// Fan-out of claim announcements to every connected overlay
pub type OverlayFeed = broadcast::Sender<OverlayEvent>;

pub fn create_overlay_feed() -> OverlayFeed {
    broadcast::channel(100).0
}

// Announce a successful claim; a feed with no overlays attached is not an error
pub fn announce_claim(feed: &OverlayFeed, user: &UserAccount, card: &CardInstance) {
    let event = OverlayEvent::CardClaimed {
        display_name: user.display_name.clone(),
        card_name: card.name.clone(),
        rarity: card.rarity.clone(),
        image_url: card.image_url.clone(),
    };
    if feed.send(event).is_err() {
        tracing::debug!("No overlay connected for claim announcement");
    }
}

// WebSocket handler
pub async fn overlay_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_overlay_socket(socket, state))
}

async fn handle_overlay_socket(socket: WebSocket, state: AppState) {
    tracing::info!("Overlay connected");

    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.overlay.subscribe();

    let connection_msg = OverlayEvent::ConnectionEstablished {
        message: "Listening for card claims".to_string(),
    };
    if let Ok(msg_text) = serde_json::to_string(&connection_msg) {
        if sender.send(Message::Text(msg_text.into())).await.is_err() {
            tracing::warn!("Failed to send connection message to overlay");
            return;
        }
    }

    // Overlays only listen; drain the client side to notice closes
    let incoming_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Overlay closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::error!("Overlay WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    let outgoing_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Overlay lagged, skipped {} announcements", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match serde_json::to_string(&event) {
                Ok(msg_text) => {
                    if sender.send(Message::Text(msg_text.into())).await.is_err() {
                        tracing::warn!("Failed to send announcement to overlay");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize overlay event: {}", e);
                }
            }
        }
    });

    close_when_either_finishes(incoming_task, outgoing_task).await;

    tracing::info!("Overlay disconnected");
}

// Wait for either side to finish, then abort the other and wait for it to unwind
async fn close_when_either_finishes(
    mut incoming_task: JoinHandle<()>,
    mut outgoing_task: JoinHandle<()>,
) {
    tokio::select! {
        _ = &mut incoming_task => {
            tracing::debug!("Overlay incoming task completed");
            outgoing_task.abort();
            let _ = outgoing_task.await;
        }
        _ = &mut outgoing_task => {
            tracing::debug!("Overlay outgoing task completed");
            incoming_task.abort();
            let _ = incoming_task.await;
        }
    }
}
