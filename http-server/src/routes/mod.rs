pub mod cards;
pub mod chat;
pub mod claims;
pub mod users;
