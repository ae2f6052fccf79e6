//! Main console state container
//!
//! Owns the one session, the API client it guards, and the endpoint
//! wrappers built on that client.

use std::sync::Arc;

use campus_http::{ApiClient, ApiConfig};
use campus_session::{AuthState, Navigator, Session, SessionManager, UserProfile};
use campus_storage::{Database, PersistedStore};

use crate::api::{DashboardApi, SchoolsApi};
use crate::config::Config;
use crate::routes::{Access, RouteGuard};
use crate::Result;

pub struct Console {
    /// Configuration
    config: Config,
    /// Session lifecycle and the global 401 handling
    session: SessionManager,
    /// Dashboard statistics
    dashboard: DashboardApi,
    /// School CRUD
    schools: SchoolsApi,
}

impl Console {
    /// Open the database at `config.database_path` and wire everything to it.
    pub fn new(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        tracing::debug!(path = %config.database_path.display(), "Opened session database");

        Self::with_store(config, Arc::new(db), navigator)
    }

    /// Wire the console to an existing store
    pub fn with_store(
        config: Config,
        store: Arc<dyn PersistedStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        config.validate()?;

        let api_config = ApiConfig::new(&config.api_url)?.with_timeout(config.timeout());
        let client = ApiClient::new(api_config, store)?;

        // Registers itself as the client's 401 handler
        let session = SessionManager::new(client.clone(), navigator);

        Ok(Self {
            config,
            session,
            dashboard: DashboardApi::new(client.clone()),
            schools: SchoolsApi::new(client),
        })
    }

    /// Recover the persisted session, refreshing it if it has expired
    pub async fn initialize(&self) -> Result<AuthState> {
        let state = self.session.restore().await?;
        tracing::info!(state = %state, "Console initialized");
        Ok(state)
    }

    // === Session operations ===

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        Ok(self.session.login(email, password).await?)
    }

    pub async fn logout(&self) {
        self.session.logout().await
    }

    pub async fn refresh(&self) -> Result<Session> {
        Ok(self.session.refresh().await?)
    }

    pub async fn reload_profile(&self) -> Result<UserProfile> {
        Ok(self.session.reload_profile().await?)
    }

    // === Routing ===

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::for_session(&self.session)
    }

    pub fn resolve(&self, path: &str) -> Access {
        self.route_guard().resolve(path)
    }

    /// Where a signed-in user lands, `/login` otherwise
    pub fn landing_path(&self) -> &'static str {
        crate::routes::dashboard_path_for(self.route_guard().role())
    }

    // === Endpoints ===

    pub fn dashboard(&self) -> &DashboardApi {
        &self.dashboard
    }

    pub fn schools(&self) -> &SchoolsApi {
        &self.schools
    }

    // === Config ===

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Clone for Console {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            session: self.session.clone(),
            dashboard: self.dashboard.clone(),
            schools: self.schools.clone(),
        }
    }
}
