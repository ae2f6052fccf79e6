//! Campus Core
//!
//! Coordination layer for the console: configuration, the [`Console`]
//! that owns the session and its API client, route guards and the typed
//! dashboard and school endpoints.

pub mod api;
mod config;
mod console;
mod error;
mod routes;

pub use api::{
    filter_schools, DashboardApi, DashboardData, DashboardSection, OverviewStats, School,
    SchoolDraft, SchoolsApi,
};
pub use config::Config;
pub use console::Console;
pub use error::CoreError;
pub use routes::{dashboard_path_for, Access, RouteGuard, DASHBOARD_PATH, UNAUTHORIZED_PATH};

// Re-export core components
pub use campus_http::{ApiClient, ApiConfig, ApiError};
pub use campus_session::{
    AuthState, Navigator, Role, Session, SessionError, SessionManager, UserProfile, LOGIN_PATH,
};
pub use campus_storage::{Database, MemoryStore, PersistedStore, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
