use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ClaimError, StoreError};
use crate::types::{
    CardDefinition, CardInstance, NewCardDefinition, NewCardInstance, UNLIMITED_SUPPLY,
    UserAccount, UserProfile,
};

/// Catalog of card templates and their live supply counts
pub trait DefinitionStore: Send + Sync {
    /// Exact match on the (name, type, rarity) triple
    fn find_definition(
        &self,
        name: &str,
        card_type: &str,
        rarity: &str,
    ) -> Result<Option<CardDefinition>, StoreError>;

    fn list_definitions(&self) -> Result<Vec<CardDefinition>, StoreError>;

    /// Definitions that are unlimited or still below their cap
    fn list_eligible_definitions(&self) -> Result<Vec<CardDefinition>, StoreError>;

    /// Fails with `Validation` when the triple is already taken
    fn create_definition(&self, new: NewCardDefinition) -> Result<CardDefinition, ClaimError>;

    /// Admin top-up. `additional_supply == -1` lifts the cap entirely.
    fn restock_definition(
        &self,
        definition_id: u64,
        additional_supply: i64,
    ) -> Result<CardDefinition, ClaimError>;

    /// Increment `current_supply` if and only if the definition is below its cap
    /// at the moment of the write. Returns the updated definition.
    fn increment_supply(&self, definition: &CardDefinition) -> Result<CardDefinition, ClaimError>;
}

pub trait InstanceStore: Send + Sync {
    fn insert_instance(&self, instance: NewCardInstance) -> Result<CardInstance, StoreError>;

    /// Instances owned by the user, in mint order
    fn instances_for_owner(&self, owner_id: &str) -> Result<Vec<CardInstance>, StoreError>;
}

pub trait UserStore: Send + Sync {
    fn get_user(&self, twitch_id: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Get-or-create keyed by twitch id. Existing accounts get their profile
    /// fields synced; currency and cooldown stamp are left alone.
    fn upsert_user(
        &self,
        profile: UserProfile,
        starting_currency: i64,
        now: DateTime<Utc>,
    ) -> Result<UserAccount, StoreError>;

    /// Credit `currency_bonus` and stamp `last_pack_claimed` in one write
    fn record_claim(
        &self,
        twitch_id: &str,
        claimed_at: DateTime<Utc>,
        currency_bonus: i64,
    ) -> Result<UserAccount, ClaimError>;
}

/// Everything the claim orchestrator needs from persistence
pub trait Storage: DefinitionStore + InstanceStore + UserStore {}

impl<T: DefinitionStore + InstanceStore + UserStore> Storage for T {}

#[derive(Default)]
struct DefinitionTable {
    rows: Vec<CardDefinition>,
    id_counter: u64,
}

#[derive(Default)]
struct InstanceTable {
    rows: Vec<CardInstance>,
    id_counter: u64,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, table: &'static str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Poisoned(table))
}

/// Process-local storage. Each table sits behind its own mutex, which is the
/// serialization point for the conditional supply increment.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    definitions: Arc<Mutex<DefinitionTable>>,
    instances: Arc<Mutex<InstanceTable>>,
    users: Arc<Mutex<HashMap<String, UserAccount>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DefinitionStore for InMemoryStorage {
    fn find_definition(
        &self,
        name: &str,
        card_type: &str,
        rarity: &str,
    ) -> Result<Option<CardDefinition>, StoreError> {
        let definitions = lock(&self.definitions, "definitions")?;
        Ok(definitions
            .rows
            .iter()
            .find(|definition| definition.matches(name, card_type, rarity))
            .cloned())
    }

    fn list_definitions(&self) -> Result<Vec<CardDefinition>, StoreError> {
        let definitions = lock(&self.definitions, "definitions")?;
        Ok(definitions.rows.clone())
    }

    fn list_eligible_definitions(&self) -> Result<Vec<CardDefinition>, StoreError> {
        let definitions = lock(&self.definitions, "definitions")?;
        Ok(definitions
            .rows
            .iter()
            .filter(|definition| !definition.is_exhausted())
            .cloned()
            .collect())
    }

    fn create_definition(&self, new: NewCardDefinition) -> Result<CardDefinition, ClaimError> {
        if new.max_supply < UNLIMITED_SUPPLY {
            return Err(ClaimError::Validation(format!(
                "maxSupply must be -1 (unlimited) or non-negative, got {}",
                new.max_supply
            )));
        }

        let mut definitions = lock(&self.definitions, "definitions")?;
        if definitions
            .rows
            .iter()
            .any(|definition| definition.matches(&new.name, &new.card_type, &new.rarity))
        {
            return Err(ClaimError::Validation(format!(
                "card '{}' ({}, {}) already exists",
                new.name, new.card_type, new.rarity
            )));
        }

        definitions.id_counter += 1;
        let definition = CardDefinition {
            id: definitions.id_counter,
            name: new.name,
            card_type: new.card_type,
            rarity: new.rarity,
            attack: new.attack,
            defense: new.defense,
            image_url: new.image_url,
            max_supply: new.max_supply,
            current_supply: 0,
        };
        definitions.rows.push(definition.clone());
        Ok(definition)
    }

    fn restock_definition(
        &self,
        definition_id: u64,
        additional_supply: i64,
    ) -> Result<CardDefinition, ClaimError> {
        if additional_supply < UNLIMITED_SUPPLY {
            return Err(ClaimError::Validation(format!(
                "maxSupply must be -1 (unlimited) or non-negative, got {additional_supply}"
            )));
        }

        let mut definitions = lock(&self.definitions, "definitions")?;
        let definition = definitions
            .rows
            .iter_mut()
            .find(|definition| definition.id == definition_id)
            .ok_or_else(|| {
                ClaimError::Validation(format!("card definition {definition_id} not found"))
            })?;

        if additional_supply == UNLIMITED_SUPPLY || definition.is_unlimited() {
            definition.max_supply = UNLIMITED_SUPPLY;
        } else {
            definition.max_supply = definition.max_supply.saturating_add(additional_supply);
        }
        Ok(definition.clone())
    }

    fn increment_supply(&self, definition: &CardDefinition) -> Result<CardDefinition, ClaimError> {
        let mut definitions = lock(&self.definitions, "definitions")?;
        let stored = definitions
            .rows
            .iter_mut()
            .find(|stored| stored.id == definition.id)
            .ok_or_else(|| ClaimError::SupplyExhausted(definition.name.clone()))?;

        // Re-checked under the table lock, not trusted from the caller's snapshot
        if stored.is_exhausted() {
            return Err(ClaimError::SupplyExhausted(stored.name.clone()));
        }

        stored.current_supply += 1;
        Ok(stored.clone())
    }
}

impl InstanceStore for InMemoryStorage {
    fn insert_instance(&self, instance: NewCardInstance) -> Result<CardInstance, StoreError> {
        let mut instances = lock(&self.instances, "instances")?;
        instances.id_counter += 1;
        let instance = instance.with_id(instances.id_counter);
        instances.rows.push(instance.clone());
        Ok(instance)
    }

    fn instances_for_owner(&self, owner_id: &str) -> Result<Vec<CardInstance>, StoreError> {
        let instances = lock(&self.instances, "instances")?;
        Ok(instances
            .rows
            .iter()
            .filter(|instance| instance.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect())
    }
}

impl UserStore for InMemoryStorage {
    fn get_user(&self, twitch_id: &str) -> Result<Option<UserAccount>, StoreError> {
        let users = lock(&self.users, "users")?;
        Ok(users.get(twitch_id).cloned())
    }

    fn upsert_user(
        &self,
        profile: UserProfile,
        starting_currency: i64,
        now: DateTime<Utc>,
    ) -> Result<UserAccount, StoreError> {
        let mut users = lock(&self.users, "users")?;

        if let Some(user) = users.get_mut(&profile.twitch_id) {
            user.display_name = profile.display_name;
            if profile.profile_image_url.is_some() {
                user.profile_image_url = profile.profile_image_url;
            }
            return Ok(user.clone());
        }

        let user = UserAccount {
            twitch_id: profile.twitch_id.clone(),
            display_name: profile.display_name,
            profile_image_url: profile.profile_image_url,
            currency: starting_currency,
            last_pack_claimed: None,
            created_at: now,
        };
        users.insert(profile.twitch_id, user.clone());
        Ok(user)
    }

    fn record_claim(
        &self,
        twitch_id: &str,
        claimed_at: DateTime<Utc>,
        currency_bonus: i64,
    ) -> Result<UserAccount, ClaimError> {
        let mut users = lock(&self.users, "users")?;
        let user = users
            .get_mut(twitch_id)
            .ok_or_else(|| ClaimError::UnknownUser(twitch_id.to_string()))?;

        user.currency = user.currency.saturating_add(currency_bonus);
        user.last_pack_claimed = Some(claimed_at);
        Ok(user.clone())
    }
}
