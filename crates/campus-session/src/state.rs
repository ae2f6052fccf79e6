//! Authentication State Machine
//!
//! ```text
//! Unauthenticated
//!   ↓ login
//! Authenticating ──(failure)──▶ Unauthenticated
//!   ↓ success
//! Authenticated ◀──(success)── Refreshing ◀── Unauthenticated (expired record)
//!   ↓ refresh                     ↓ failure
//! Refreshing                    Unauthenticated
//! ```
//!
//! Logout and a 401 from any request lead to Unauthenticated from every state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// No session
    Unauthenticated,
    /// Credential exchange in flight
    Authenticating,
    /// Session present and usable
    Authenticated,
    /// Token renewal in flight
    Refreshing,
}

impl AuthState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: AuthState) -> bool {
        match (self, target) {
            (AuthState::Unauthenticated, AuthState::Authenticating) => true,
            // Recovery check: live record or expired record
            (AuthState::Unauthenticated, AuthState::Authenticated) => true,
            (AuthState::Unauthenticated, AuthState::Refreshing) => true,
            (AuthState::Authenticating, AuthState::Authenticated) => true,
            (AuthState::Authenticated, AuthState::Refreshing) => true,
            // Profile reload keeps the session in place
            (AuthState::Authenticated, AuthState::Authenticated) => true,
            (AuthState::Refreshing, AuthState::Refreshing) => true,
            (AuthState::Refreshing, AuthState::Authenticated) => true,
            // Logout is valid from anywhere, including when already logged out
            (_, AuthState::Unauthenticated) => true,
            _ => false,
        }
    }

    /// Returns true if a session has been established and not yet torn down
    pub fn holds_session(&self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Refreshing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
            AuthState::Refreshing => "refreshing",
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuthState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unauthenticated" => Ok(AuthState::Unauthenticated),
            "authenticating" => Ok(AuthState::Authenticating),
            "authenticated" => Ok(AuthState::Authenticated),
            "refreshing" => Ok(AuthState::Refreshing),
            _ => Err(format!("Unknown auth state: {}", s)),
        }
    }
}
