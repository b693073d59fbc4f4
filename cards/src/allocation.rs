use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

use crate::error::ClaimError;
use crate::types::CardDefinition;

/// Picks the definition a claim will mint from
pub trait AllocationPolicy: Send + Sync {
    fn choose<'a>(&self, eligible: &'a [CardDefinition]) -> Result<&'a CardDefinition, ClaimError>;
}

/// Uniform draw over the eligible set. Rarity does not weight the draw.
pub struct UniformAllocation {
    rng: Mutex<StdRng>,
}

impl Default for UniformAllocation {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformAllocation {
    pub fn new() -> Self {
        UniformAllocation {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence of draws, for tests and benchmarks
    pub fn seeded(seed: u64) -> Self {
        UniformAllocation {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AllocationPolicy for UniformAllocation {
    fn choose<'a>(&self, eligible: &'a [CardDefinition]) -> Result<&'a CardDefinition, ClaimError> {
        if eligible.is_empty() {
            return Err(ClaimError::NoEligibleCards);
        }

        // The rng holds no invariant a panicking holder could break
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let index = rng.gen_range(0..eligible.len());
        Ok(&eligible[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNLIMITED_SUPPLY;

    fn definitions(rarities: &[&str]) -> Vec<CardDefinition> {
        rarities
            .iter()
            .enumerate()
            .map(|(i, rarity)| CardDefinition {
                id: i as u64 + 1,
                name: format!("card-{i}"),
                card_type: "Emote".to_string(),
                rarity: rarity.to_string(),
                attack: 0,
                defense: 0,
                image_url: String::new(),
                max_supply: UNLIMITED_SUPPLY,
                current_supply: 0,
            })
            .collect()
    }

    #[test]
    fn test_empty_set_fails() {
        let policy = UniformAllocation::seeded(7);
        assert!(matches!(
            policy.choose(&[]),
            Err(ClaimError::NoEligibleCards)
        ));
    }

    #[test]
    fn test_single_element_always_chosen() {
        let policy = UniformAllocation::seeded(7);
        let eligible = definitions(&["Legendary"]);
        for _ in 0..10 {
            assert_eq!(policy.choose(&eligible).unwrap().id, 1);
        }
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let eligible = definitions(&["Common", "Rare", "Epic", "Legendary"]);
        let first = UniformAllocation::seeded(99);
        let second = UniformAllocation::seeded(99);
        for _ in 0..50 {
            assert_eq!(
                first.choose(&eligible).unwrap().id,
                second.choose(&eligible).unwrap().id
            );
        }
    }

    #[test]
    fn test_draw_is_uniform_regardless_of_rarity() {
        let eligible = definitions(&["Common", "Common", "Common", "Legendary"]);
        let policy = UniformAllocation::seeded(2024);
        let draws = 40_000;
        let mut counts = [0usize; 4];
        for _ in 0..draws {
            let chosen = policy.choose(&eligible).unwrap();
            counts[(chosen.id - 1) as usize] += 1;
        }

        // Expected 10_000 each; a rarity-weighted draw would skew the last slot
        for count in counts {
            assert!((9_000..=11_000).contains(&count), "count {count} out of range");
        }
    }
}
