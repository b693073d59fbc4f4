use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{AppState, middleware::ChatBridgeAuth};

// One chat message relayed by a chat connector
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub sender_id: String,
    pub display_name: String,
    pub text: String,
}

// Reply line to post back to chat, `null` when the message was not a command
#[derive(Serialize)]
pub struct ChatMessageResponse {
    pub reply: Option<String>,
}

pub async fn chat_message(
    State(state): State<AppState>,
    _bridge: ChatBridgeAuth,
    Json(payload): Json<ChatMessageRequest>,
) -> Json<ChatMessageResponse> {
    let mut replies: Vec<String> = Vec::new();

    let handled = state.chat.dispatch(
        &state,
        &payload.sender_id,
        &payload.display_name,
        &payload.text,
        &mut replies,
    );

    if !handled {
        return Json(ChatMessageResponse { reply: None });
    }
    Json(ChatMessageResponse {
        reply: replies.into_iter().next(),
    })
}
