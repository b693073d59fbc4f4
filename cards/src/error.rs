use crate::cooldown::RemainingTime;

/// Failures raised by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Every failure a claim, registration or admin call can surface to its caller
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("daily pack already claimed, next claim in {remaining}")]
    CooldownActive { remaining: RemainingTime },

    #[error("no eligible cards left to claim")]
    NoEligibleCards,

    #[error("supply exhausted for card '{0}'")]
    SupplyExhausted(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
