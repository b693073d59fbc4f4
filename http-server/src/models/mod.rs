pub mod database;
pub mod user;

pub use database::SessionStorage;
pub use user::AuthenticatedUser;
