//! Navigation side effect

/// Entry point users are sent to when their session ends involuntarily.
pub const LOGIN_PATH: &str = "/login";

/// Performs a full navigation, discarding in-memory UI state.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}
