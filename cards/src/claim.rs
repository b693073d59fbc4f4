use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::allocation::{AllocationPolicy, UniformAllocation};
use crate::cooldown::{CooldownStatus, CooldownTracker, DEFAULT_COOLDOWN_HOURS};
use crate::error::{ClaimError, StoreError};
use crate::minting::mint;
use crate::store::Storage;
use crate::types::{CardDefinition, CardDefinitionRequest, CardInstance, UserAccount, UserProfile};

#[derive(Debug, Clone)]
pub struct ClaimConfig {
    /// Minimum time between two successful claims by one user
    pub cooldown_window: TimeDelta,
    /// Flat currency credited with every successful claim
    pub currency_bonus: i64,
    /// Balance of newly registered accounts
    pub starting_currency: i64,
    /// Serialize claims per user so two racing claims cannot both pass the cooldown check
    pub serialize_per_user: bool,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        ClaimConfig {
            cooldown_window: TimeDelta::hours(DEFAULT_COOLDOWN_HOURS),
            currency_bonus: 0,
            starting_currency: 0,
            serialize_per_user: true,
        }
    }
}

/// Result of a successful daily pack claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub card: CardInstance,
    pub user: UserAccount,
}

impl ClaimOutcome {
    pub fn new_currency(&self) -> i64 {
        self.user.currency
    }
}

/// Result of the admin add-card path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCardOutcome {
    pub definition: CardDefinition,
    /// `false` when an existing definition was restocked
    pub created: bool,
}

/// Entry point shared by the web API and the chat bot
pub struct ClaimOrchestrator<S> {
    store: S,
    policy: Box<dyn AllocationPolicy>,
    cooldown: CooldownTracker,
    config: ClaimConfig,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Storage> ClaimOrchestrator<S> {
    pub fn new(store: S, config: ClaimConfig) -> Self {
        Self::with_policy(store, config, Box::new(UniformAllocation::new()))
    }

    pub fn with_policy(store: S, config: ClaimConfig, policy: Box<dyn AllocationPolicy>) -> Self {
        ClaimOrchestrator {
            store,
            policy,
            cooldown: CooldownTracker::new(config.cooldown_window),
            config,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    /// Create the account on first sight, otherwise sync its profile fields
    pub fn register_user(
        &self,
        profile: UserProfile,
        now: DateTime<Utc>,
    ) -> Result<UserAccount, ClaimError> {
        if profile.twitch_id.trim().is_empty() {
            return Err(ClaimError::Validation("twitch id is required".to_string()));
        }
        let user = self
            .store
            .upsert_user(profile, self.config.starting_currency, now)?;
        tracing::debug!(user_id = %user.twitch_id, "User registered or synced");
        Ok(user)
    }

    pub fn get_user(&self, twitch_id: &str) -> Result<UserAccount, ClaimError> {
        self.store
            .get_user(twitch_id)?
            .ok_or_else(|| ClaimError::UnknownUser(twitch_id.to_string()))
    }

    pub fn collection(&self, twitch_id: &str) -> Result<Vec<CardInstance>, ClaimError> {
        let user = self.get_user(twitch_id)?;
        Ok(self.store.instances_for_owner(&user.twitch_id)?)
    }

    pub fn catalog(&self) -> Result<Vec<CardDefinition>, ClaimError> {
        Ok(self.store.list_definitions()?)
    }

    /// Cooldown state without reserving or mutating anything
    pub fn claim_status(
        &self,
        twitch_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CooldownStatus, ClaimError> {
        let user = self.get_user(twitch_id)?;
        Ok(self.cooldown.check_and_reserve(&user, now))
    }

    /// New definition, or a restock when (name, type, rarity) already exists
    pub fn add_card(&self, request: &CardDefinitionRequest) -> Result<AddCardOutcome, ClaimError> {
        let new = request.validate()?;

        match self
            .store
            .find_definition(&new.name, &new.card_type, &new.rarity)?
        {
            Some(existing) => {
                let definition = self.store.restock_definition(existing.id, new.max_supply)?;
                tracing::info!(
                    card = %definition.name,
                    max_supply = definition.max_supply,
                    "Card definition restocked"
                );
                Ok(AddCardOutcome {
                    definition,
                    created: false,
                })
            }
            None => {
                let definition = self.store.create_definition(new)?;
                tracing::info!(
                    card = %definition.name,
                    max_supply = definition.max_supply,
                    "Card definition created"
                );
                Ok(AddCardOutcome {
                    definition,
                    created: true,
                })
            }
        }
    }

    fn user_lock(&self, twitch_id: &str) -> Result<Arc<Mutex<()>>, ClaimError> {
        let mut locks = self
            .user_locks
            .lock()
            .map_err(|_| StoreError::Poisoned("user claim locks"))?;
        Ok(locks.entry(twitch_id.to_string()).or_default().clone())
    }

    // Drop the entry once only the map and this claim hold it
    fn release_user_lock(&self, twitch_id: &str, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.user_locks.lock() else {
            return;
        };
        if Arc::strong_count(&lock) == 2 {
            locks.remove(twitch_id);
        }
    }

    /// Redeem one daily pack for `twitch_id`.
    ///
    /// Writes happen in order: supply increment, instance mint, then currency
    /// credit and cooldown stamp. None of them is rolled back if a later one
    /// fails.
    pub fn claim_daily_pack(
        &self,
        twitch_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, ClaimError> {
        if !self.config.serialize_per_user {
            return self.claim_for(twitch_id, now);
        }

        // Unknown ids never get a lock entry
        self.get_user(twitch_id)?;

        let lock = self.user_lock(twitch_id)?;
        let result = {
            let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.claim_for(twitch_id, now)
        };
        self.release_user_lock(twitch_id, lock);
        result
    }

    fn claim_for(&self, twitch_id: &str, now: DateTime<Utc>) -> Result<ClaimOutcome, ClaimError> {
        let user = self.get_user(twitch_id)?;

        if let CooldownStatus::OnCooldown { remaining } = self.cooldown.check_and_reserve(&user, now)
        {
            tracing::debug!(user_id = %twitch_id, %remaining, "Claim rejected, cooldown active");
            return Err(ClaimError::CooldownActive { remaining });
        }

        let eligible = self.store.list_eligible_definitions()?;
        let chosen = self.policy.choose(&eligible)?;

        let definition = match self.store.increment_supply(chosen) {
            Ok(definition) => definition,
            Err(err) => {
                tracing::warn!(user_id = %twitch_id, card = %chosen.name, error = %err, "Supply increment failed");
                return Err(err);
            }
        };

        let card = mint(&self.store, &definition, &user.twitch_id, now)?;

        let user = self
            .store
            .record_claim(&user.twitch_id, now, self.config.currency_bonus)?;

        tracing::info!(
            user_id = %user.twitch_id,
            card = %card.name,
            rarity = %card.rarity,
            currency = user.currency,
            "Daily pack claimed"
        );

        Ok(ClaimOutcome { card, user })
    }
}
