//! Campus Session Management
//!
//! - A session is the authenticated user plus a bearer token and its expiry
//! - The session is persisted as three store entries and restored on startup
//! - Expired sessions are refreshed; any refresh failure is a full logout
//! - A 401 from any request tears the session down and navigates to login

mod error;
mod manager;
mod navigator;
mod protocol;
mod role;
mod session;
mod state;

pub use error::SessionError;
pub use manager::SessionManager;
pub use navigator::{Navigator, LOGIN_PATH};
pub use role::Role;
pub use session::{parse_timestamp, Session, UserProfile};
pub use state::AuthState;

pub type Result<T> = std::result::Result<T, SessionError>;
