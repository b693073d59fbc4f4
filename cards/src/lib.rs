pub mod allocation;
pub mod claim;
pub mod cooldown;
pub mod error;
pub mod minting;
pub mod store;
pub mod types;
