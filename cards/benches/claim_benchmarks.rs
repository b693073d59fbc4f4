use cards::allocation::{AllocationPolicy, UniformAllocation};
use cards::claim::{ClaimConfig, ClaimOrchestrator};
use cards::store::{DefinitionStore, InMemoryStorage};
use cards::types::{CardDefinition, NewCardDefinition, UNLIMITED_SUPPLY, UserProfile};
use chrono::{TimeDelta, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn new_definition(i: usize, max_supply: i64) -> NewCardDefinition {
    NewCardDefinition {
        name: format!("card-{i}"),
        card_type: "Emote".to_string(),
        rarity: "Common".to_string(),
        attack: 1,
        defense: 1,
        image_url: String::new(),
        max_supply,
    }
}

fn setup_orchestrator(definitions: usize) -> ClaimOrchestrator<InMemoryStorage> {
    let orchestrator = ClaimOrchestrator::with_policy(
        InMemoryStorage::new(),
        ClaimConfig {
            cooldown_window: TimeDelta::zero(),
            ..ClaimConfig::default()
        },
        Box::new(UniformAllocation::seeded(1)),
    );
    for i in 0..definitions {
        orchestrator
            .store()
            .create_definition(new_definition(i, UNLIMITED_SUPPLY))
            .unwrap();
    }
    orchestrator
        .register_user(
            UserProfile {
                twitch_id: "bench".to_string(),
                display_name: "bench".to_string(),
                profile_image_url: None,
            },
            Utc::now(),
        )
        .unwrap();
    orchestrator
}

// Uniform draw over a large eligible set
fn bench_choose(c: &mut Criterion) {
    let policy = UniformAllocation::seeded(1);
    let eligible: Vec<CardDefinition> = (0..1_000)
        .map(|i| CardDefinition {
            id: i as u64,
            name: format!("card-{i}"),
            card_type: "Emote".to_string(),
            rarity: "Common".to_string(),
            attack: 1,
            defense: 1,
            image_url: String::new(),
            max_supply: UNLIMITED_SUPPLY,
            current_supply: 0,
        })
        .collect();

    c.bench_function("choose_uniform_1000", |b| {
        b.iter(|| black_box(policy.choose(&eligible).unwrap().id))
    });
}

// Conditional increment on a single capped definition
fn bench_increment_supply(c: &mut Criterion) {
    c.bench_function("increment_supply", |b| {
        b.iter_with_setup(
            || {
                let storage = InMemoryStorage::new();
                let definition = storage.create_definition(new_definition(0, 1)).unwrap();
                (storage, definition)
            },
            |(storage, definition)| {
                black_box(storage.increment_supply(&definition).is_ok());
            },
        )
    });
}

// Full claim path with the cooldown disabled so every iteration mints
fn bench_claim_daily_pack(c: &mut Criterion) {
    let orchestrator = setup_orchestrator(100);
    c.bench_function("claim_daily_pack_100_definitions", |b| {
        b.iter(|| black_box(orchestrator.claim_daily_pack("bench", Utc::now()).is_ok()))
    });
}

criterion_group!(
    benches,
    bench_choose,
    bench_increment_supply,
    bench_claim_daily_pack
);
criterion_main!(benches);
