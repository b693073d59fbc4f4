use cards::cooldown::CooldownStatus;
use cards::error::ClaimError;
use cards::types::UserProfile;
use chrono::Utc;
use std::collections::HashMap;

use crate::AppState;
use crate::websocket::announce_claim;

/// Normalized view of one chat command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    pub sender_id: String,
    pub display_name: String,
    pub args: Vec<String>,
}

/// Where command replies go: a chat connection, or a buffer for the webhook
pub trait ResponseSink {
    fn say(&mut self, line: String);
}

impl ResponseSink for Vec<String> {
    fn say(&mut self, line: String) {
        self.push(line);
    }
}

pub trait CommandHandler: Send + Sync {
    fn handle(&self, state: &AppState, ctx: &ChatContext, sink: &mut dyn ResponseSink);
}

/// Command token -> handler lookup table
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_commands() -> Self {
        let mut registry = Self::new();
        registry.register("!claim", ClaimCommand);
        registry.register("!cards", CardsCommand);
        registry.register("!balance", BalanceCommand);
        registry
    }

    pub fn register(&mut self, token: &str, handler: impl CommandHandler + 'static) {
        self.handlers
            .insert(token.to_lowercase(), Box::new(handler));
    }

    /// Split a message into a lowercased command token and its arguments
    pub fn parse(text: &str) -> Option<(String, Vec<String>)> {
        let mut words = text.split_whitespace();
        let token = words.next()?;
        if !token.starts_with('!') || token.len() < 2 {
            return None;
        }
        Some((
            token.to_lowercase(),
            words.map(str::to_string).collect(),
        ))
    }

    /// Run the command in `text`, if any. Returns `false` when nothing matched.
    pub fn dispatch(
        &self,
        state: &AppState,
        sender_id: &str,
        display_name: &str,
        text: &str,
        sink: &mut dyn ResponseSink,
    ) -> bool {
        let Some((token, args)) = Self::parse(text) else {
            return false;
        };
        let Some(handler) = self.handlers.get(&token) else {
            return false;
        };

        if state.config.chat_auto_register {
            let profile = UserProfile {
                twitch_id: sender_id.to_string(),
                display_name: display_name.to_string(),
                profile_image_url: None,
            };
            if let Err(e) = state.claims.register_user(profile, Utc::now()) {
                tracing::warn!(user_id = %sender_id, error = %e, "Failed to register chat sender");
            }
        }

        let ctx = ChatContext {
            sender_id: sender_id.to_string(),
            display_name: display_name.to_string(),
            args,
        };
        tracing::debug!(command = %token, user_id = %sender_id, args = ?ctx.args, "Dispatching chat command");
        handler.handle(state, &ctx, sink);
        true
    }
}

fn link_account_line(ctx: &ChatContext) -> String {
    format!(
        "@{} link your account by logging in on the website first, then try again.",
        ctx.display_name
    )
}

fn failure_line(ctx: &ChatContext, err: &ClaimError) -> String {
    match err {
        ClaimError::UnknownUser(_) => link_account_line(ctx),
        ClaimError::CooldownActive { remaining } => format!(
            "@{} you already opened today's pack. Next one in {} hours and {} minutes.",
            ctx.display_name,
            remaining.hours(),
            remaining.minutes()
        ),
        ClaimError::NoEligibleCards => format!(
            "Sorry @{}, there are no cards left to claim right now.",
            ctx.display_name
        ),
        ClaimError::SupplyExhausted(_) => format!(
            "Sorry @{}, that card just ran out. Try !claim again.",
            ctx.display_name
        ),
        ClaimError::Validation(_) | ClaimError::Storage(_) => {
            tracing::error!(user_id = %ctx.sender_id, error = %err, "Chat command failed");
            format!(
                "Sorry @{}, something went wrong. Please try again later.",
                ctx.display_name
            )
        }
    }
}

pub struct ClaimCommand;

impl CommandHandler for ClaimCommand {
    fn handle(&self, state: &AppState, ctx: &ChatContext, sink: &mut dyn ResponseSink) {
        match state.claims.claim_daily_pack(&ctx.sender_id, Utc::now()) {
            Ok(outcome) => {
                announce_claim(&state.overlay, &outcome.user, &outcome.card);
                let mut line = format!(
                    "Congratulations @{}! You got {} ({}).",
                    ctx.display_name, outcome.card.name, outcome.card.rarity
                );
                if state.claims.config().currency_bonus > 0 {
                    line.push_str(&format!(" Balance: {}.", outcome.new_currency()));
                }
                sink.say(line);
            }
            Err(err) => sink.say(failure_line(ctx, &err)),
        }
    }
}

pub struct CardsCommand;

impl CommandHandler for CardsCommand {
    fn handle(&self, state: &AppState, ctx: &ChatContext, sink: &mut dyn ResponseSink) {
        match state.claims.collection(&ctx.sender_id) {
            Ok(cards) => {
                let ready = matches!(
                    state.claims.claim_status(&ctx.sender_id, Utc::now()),
                    Ok(CooldownStatus::Ready)
                );
                let noun = if cards.len() == 1 { "card" } else { "cards" };
                let mut line = format!("@{} owns {} {noun}.", ctx.display_name, cards.len());
                if ready {
                    line.push_str(" A daily pack is waiting, type !claim.");
                }
                sink.say(line);
            }
            Err(err) => sink.say(failure_line(ctx, &err)),
        }
    }
}

pub struct BalanceCommand;

impl CommandHandler for BalanceCommand {
    fn handle(&self, state: &AppState, ctx: &ChatContext, sink: &mut dyn ResponseSink) {
        match state.claims.get_user(&ctx.sender_id) {
            Ok(user) => sink.say(format!(
                "@{} has {} coins.",
                ctx.display_name, user.currency
            )),
            Err(err) => sink.say(failure_line(ctx, &err)),
        }
    }
}
