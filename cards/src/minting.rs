use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::store::InstanceStore;
use crate::types::{CardDefinition, CardInstance, NewCardInstance};

/// Snapshot `definition` into a new instance owned by `owner_id` and persist it.
///
/// Supply is not touched here: the caller increments it first, so `definition`
/// should be the post-increment copy returned by the store.
pub fn mint<S: InstanceStore + ?Sized>(
    store: &S,
    definition: &CardDefinition,
    owner_id: &str,
    minted_at: DateTime<Utc>,
) -> Result<CardInstance, StoreError> {
    let instance = store.insert_instance(NewCardInstance {
        name: definition.name.clone(),
        card_type: definition.card_type.clone(),
        rarity: definition.rarity.clone(),
        attack: definition.attack,
        defense: definition.defense,
        image_url: definition.image_url.clone(),
        max_supply: definition.max_supply,
        current_supply: definition.current_supply,
        owner_id: Some(owner_id.to_string()),
        minted_at,
    })?;

    tracing::debug!(
        instance_id = instance.id,
        owner_id,
        card = %instance.name,
        "Minted card instance"
    );
    Ok(instance)
}
