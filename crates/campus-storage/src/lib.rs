//! Campus Storage Layer
//!
//! Durable key-value storage for the session record. Three entries
//! (`token`, `user`, `token_expires`) mirror the in-memory session and are
//! always written and cleared together.

mod database;
mod error;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use store::{
    MemoryStore, PersistedStore, UnavailableStore, SESSION_KEYS, TOKEN_EXPIRES_KEY, TOKEN_KEY,
    USER_KEY,
};

pub type Result<T> = std::result::Result<T, StorageError>;
