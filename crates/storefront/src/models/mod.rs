//! Session-scoped domain models.

pub mod user;

pub use user::{ProfileUpdate, User};
