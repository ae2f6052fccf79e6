//! Session Manager
//!
//! Single source of truth for who is signed in and whether their token is
//! still usable. Mutating operations run one at a time behind an async
//! mutex; queries read the last settled snapshot and never wait on them.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;

use campus_http::{ApiClient, ApiError, TokenSource, UnauthorizedHandler};
use campus_storage::{PersistedStore, SESSION_KEYS, TOKEN_EXPIRES_KEY, TOKEN_KEY, USER_KEY};

use crate::error::SessionError;
use crate::navigator::{Navigator, LOGIN_PATH};
use crate::protocol::{
    LoginRequest, LoginResponse, ProfileResponse, RefreshResponse, LOGIN_ENDPOINT,
    LOGOUT_ENDPOINT, PROFILE_ENDPOINT, REFRESH_ENDPOINT,
};
use crate::role::Role;
use crate::session::{parse_timestamp, Session, UserProfile};
use crate::state::AuthState;
use crate::Result;

/// Shown when the server gives no usable reason for a failed login
const LOGIN_FAILED: &str = "Login failed";

#[derive(Debug)]
struct Snapshot {
    state: AuthState,
    session: Option<Session>,
    last_error: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            session: None,
            last_error: None,
        }
    }
}

/// The persisted record as read back from the store
enum StoredRecord {
    Absent,
    Corrupt(String),
    Present {
        token: String,
        user: UserProfile,
        /// `None` when the stored timestamp does not parse
        expires_at: Option<DateTime<Utc>>,
    },
}

/// Settled state plus its durable mirror.
///
/// Also the client's 401 handler: it never touches the operation mutex, so
/// it can run while a login or refresh is awaiting the network.
struct SessionCore {
    snapshot: RwLock<Snapshot>,
    store: Arc<dyn PersistedStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionCore {
    fn state(&self) -> AuthState {
        self.snapshot.read().state
    }

    fn session(&self) -> Option<Session> {
        self.snapshot.read().session.clone()
    }

    fn begin(&self, target: AuthState) -> Result<()> {
        let mut snapshot = self.snapshot.write();
        if !snapshot.state.can_transition_to(target) {
            return Err(SessionError::InvalidTransition {
                from: snapshot.state,
                to: target,
            });
        }
        snapshot.state = target;
        Ok(())
    }

    /// Entry into `Refreshing` for callers that already hold a session.
    /// Recovery enters from `Unauthenticated` through [`Self::begin`].
    fn begin_refresh(&self) -> Result<()> {
        let mut snapshot = self.snapshot.write();
        if !snapshot.state.holds_session() {
            return Err(SessionError::InvalidTransition {
                from: snapshot.state,
                to: AuthState::Refreshing,
            });
        }
        snapshot.state = AuthState::Refreshing;
        Ok(())
    }

    /// Token of the live session, else the persisted one
    fn current_token(&self) -> Option<String> {
        self.live_token().or_else(|| self.read_entry(TOKEN_KEY))
    }

    fn live_token(&self) -> Option<String> {
        let snapshot = self.snapshot.read();
        if !snapshot.state.holds_session() {
            return None;
        }
        snapshot
            .session
            .as_ref()
            .map(|session| session.token.clone())
            .filter(|token| !token.is_empty())
    }

    fn settle(&self, session: Session) {
        let mut snapshot = self.snapshot.write();
        snapshot.state = AuthState::Authenticated;
        snapshot.session = Some(session);
        snapshot.last_error = None;
    }

    fn fail_login(&self, message: String) {
        let mut snapshot = self.snapshot.write();
        snapshot.state = AuthState::Unauthenticated;
        snapshot.session = None;
        snapshot.last_error = Some(message);
    }

    fn clear_error(&self) {
        self.snapshot.write().last_error = None;
    }

    /// Store read where an unavailable backend counts as "absent"
    fn read_entry(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Persisted store unavailable");
                None
            }
        }
    }

    fn load_record(&self) -> StoredRecord {
        let (Some(token), Some(user), Some(expires)) = (
            self.read_entry(TOKEN_KEY),
            self.read_entry(USER_KEY),
            self.read_entry(TOKEN_EXPIRES_KEY),
        ) else {
            return StoredRecord::Absent;
        };

        match serde_json::from_str::<UserProfile>(&user) {
            Ok(user) => StoredRecord::Present {
                token,
                user,
                expires_at: parse_timestamp(&expires),
            },
            Err(e) => StoredRecord::Corrupt(e.to_string()),
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.write_record(session) {
            tracing::warn!(error = %e, "Failed to persist session, it will not survive a restart");
            // Never leave part of the record behind
            self.clear_store();
        }
    }

    fn write_record(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user)?;
        let expires = session
            .expires_at
            .to_rfc3339_opts(SecondsFormat::AutoSi, true);

        self.store.set_many(&[
            (TOKEN_KEY, session.token.as_str()),
            (USER_KEY, user.as_str()),
            (TOKEN_EXPIRES_KEY, expires.as_str()),
        ])?;
        Ok(())
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.remove_many(&SESSION_KEYS) {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Drop the session in memory and in the store.
    ///
    /// With `navigate`, sends the user to the login page if there was a
    /// session to lose. A second teardown finds nothing and stays quiet.
    fn teardown(&self, navigate: bool) {
        let held_session = {
            let mut snapshot = self.snapshot.write();
            let held = snapshot.state.holds_session() || snapshot.session.is_some();
            snapshot.state = AuthState::Unauthenticated;
            snapshot.session = None;
            held
        };

        self.clear_store();

        if navigate && held_session {
            tracing::info!(path = LOGIN_PATH, "Session ended, redirecting to login");
            self.navigator.navigate(LOGIN_PATH);
        }
    }
}

impl UnauthorizedHandler for SessionCore {
    fn on_unauthorized(&self) {
        tracing::warn!(state = %self.state(), "Server rejected the session");
        self.teardown(true);
    }
}

impl TokenSource for SessionCore {
    fn token(&self) -> Option<String> {
        self.live_token()
    }
}

pub struct SessionManager {
    core: Arc<SessionCore>,
    /// Client used for the auth endpoints; reports 401s back to `core`
    client: ApiClient,
    /// Serializes login, refresh, logout, restore and profile reload
    operation: Arc<Mutex<()>>,
}

impl SessionManager {
    /// Create a manager over the client's store and register it as the
    /// client's 401 handler and token source.
    pub fn new(client: ApiClient, navigator: Arc<dyn Navigator>) -> Self {
        let core = Arc::new(SessionCore {
            snapshot: RwLock::new(Snapshot::default()),
            store: client.store(),
            navigator,
        });
        client.set_unauthorized_handler(core.clone());
        client.set_token_source(core.clone());

        Self {
            core,
            client,
            operation: Arc::new(Mutex::new(())),
        }
    }

    /// Recovery check, run once at startup.
    ///
    /// A live persisted record is adopted without any network call. An
    /// expired (or unreadable) expiry goes through refresh.
    pub async fn restore(&self) -> Result<AuthState> {
        let _operation = self.operation.lock().await;

        let state = self.core.state();
        if state != AuthState::Unauthenticated {
            tracing::debug!(state = %state, "Session already established, skipping recovery");
            return Ok(state);
        }

        match self.core.load_record() {
            StoredRecord::Absent => {
                tracing::debug!("No persisted session");
                Ok(AuthState::Unauthenticated)
            }
            StoredRecord::Corrupt(reason) => {
                tracing::warn!(error = %reason, "Discarding unreadable persisted session");
                self.core.teardown(false);
                Ok(AuthState::Unauthenticated)
            }
            StoredRecord::Present {
                token,
                user,
                expires_at,
            } => {
                let live = expires_at
                    .map(|expires_at| Session::new(user.clone(), token, expires_at))
                    .filter(|session| !session.is_expired());

                if let Some(session) = live {
                    tracing::info!(
                        user_id = session.user.id,
                        role = %session.user.role,
                        expires_at = %session.expires_at,
                        "Restored session"
                    );
                    self.core.settle(session);
                    return Ok(AuthState::Authenticated);
                }

                tracing::info!(user_id = user.id, "Persisted session expired, refreshing");
                self.core.begin(AuthState::Refreshing)?;
                match self.refresh_locked().await {
                    Ok(_) => Ok(AuthState::Authenticated),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not recover session");
                        Ok(self.core.state())
                    }
                }
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On failure nothing is persisted, the state returns to
    /// `Unauthenticated` and the message is kept for [`Self::last_error`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let _operation = self.operation.lock().await;

        self.core.begin(AuthState::Authenticating)?;
        self.core.clear_error();

        let request = LoginRequest { email, password };
        let outcome = match self
            .client
            .post::<_, LoginResponse>(LOGIN_ENDPOINT, &request)
            .await
        {
            Ok(body) => session_from_login(body).ok_or_else(|| LOGIN_FAILED.to_string()),
            Err(e) => Err(login_failure_message(&e)),
        };

        match outcome {
            Ok(session) => {
                self.core.persist(&session);
                self.core.settle(session.clone());
                tracing::info!(
                    user_id = session.user.id,
                    role = %session.user.role,
                    "Logged in"
                );
                Ok(session)
            }
            Err(message) => {
                tracing::warn!(error = %message, "Login failed");
                self.core.fail_login(message.clone());
                Err(SessionError::Login(message))
            }
        }
    }

    /// Renew the token of an established session. Any failure ends the
    /// session.
    pub async fn refresh(&self) -> Result<Session> {
        let _operation = self.operation.lock().await;

        self.core.begin_refresh()?;
        self.refresh_locked().await
    }

    /// Refresh only when the current token has expired.
    pub async fn refresh_if_expired(&self) -> Result<Session> {
        let _operation = self.operation.lock().await;

        match self.core.session() {
            Some(session)
                if self.core.state() == AuthState::Authenticated && !session.is_expired() =>
            {
                Ok(session)
            }
            _ => {
                self.core.begin_refresh()?;
                self.refresh_locked().await
            }
        }
    }

    /// End the session. Never fails; a server that cannot be told is only
    /// logged.
    pub async fn logout(&self) {
        let _operation = self.operation.lock().await;
        self.logout_locked(false).await;
    }

    /// Fetch `GET /user` and replace the identity fields, keeping the token.
    pub async fn reload_profile(&self) -> Result<UserProfile> {
        let _operation = self.operation.lock().await;

        let current = match self.core.session() {
            Some(session) if self.core.state() == AuthState::Authenticated => session,
            _ => return Err(SessionError::NotAuthenticated),
        };

        let profile = self
            .client
            .get::<ProfileResponse>(PROFILE_ENDPOINT)
            .await?
            .into_profile();

        // A 401 on the way already tore the session down
        if self.core.state() != AuthState::Authenticated {
            return Err(SessionError::NotAuthenticated);
        }

        let session = Session::new(profile.clone(), current.token, current.expires_at);
        self.core.persist(&session);
        self.core.settle(session);

        tracing::info!(user_id = profile.id, "Reloaded profile");

        Ok(profile)
    }

    // === Queries ===

    pub fn state(&self) -> AuthState {
        self.core.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.core.state() == AuthState::Authenticated
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.core.session().map(|session| session.user)
    }

    pub fn current_session(&self) -> Option<Session> {
        self.core.session()
    }

    pub fn has_role(&self, role: Role) -> bool {
        let snapshot = self.core.snapshot.read();
        snapshot.state == AuthState::Authenticated
            && snapshot
                .session
                .as_ref()
                .is_some_and(|session| session.has_role(role))
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.authenticated_role()
            .is_some_and(|role| roles.contains(&role))
    }

    /// Message of the last failed login, until cleared or the next attempt
    pub fn last_error(&self) -> Option<String> {
        self.core.snapshot.read().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.core.clear_error();
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn authenticated_role(&self) -> Option<Role> {
        let snapshot = self.core.snapshot.read();
        match (&snapshot.state, &snapshot.session) {
            (AuthState::Authenticated, Some(session)) => Some(session.user.role),
            _ => None,
        }
    }

    /// Runs in `Refreshing`; callers make that transition.
    async fn refresh_locked(&self) -> Result<Session> {
        if self.core.current_token().is_none() {
            tracing::info!("No token, nothing to refresh");
            self.core.teardown(false);
            return Err(SessionError::NotAuthenticated);
        }

        match self.exchange_refresh().await {
            Ok(session) => {
                if self.core.state() != AuthState::Refreshing {
                    tracing::warn!("Session ended while refreshing, discarding new token");
                    return Err(SessionError::NotAuthenticated);
                }

                self.core.persist(&session);
                self.core.settle(session.clone());
                tracing::info!(
                    user_id = session.user.id,
                    expires_at = %session.expires_at,
                    "Token refreshed"
                );
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, logging out");
                self.logout_locked(true).await;
                Err(SessionError::RefreshFailed(e.to_string()))
            }
        }
    }

    async fn exchange_refresh(&self) -> Result<Session> {
        let prior = self.prior_session()?;

        let body: RefreshResponse = self.client.post_empty(REFRESH_ENDPOINT).await?;
        if body.token.is_empty() {
            return Err(SessionError::RefreshFailed(
                "response carried an empty token".to_string(),
            ));
        }
        let expires_at = parse_timestamp(&body.expires_at)
            .ok_or_else(|| SessionError::InvalidTimestamp(body.expires_at.clone()))?;

        Ok(prior.with_credentials(body.token, expires_at))
    }

    /// Session a refresh renews: the live one, else the persisted record.
    /// An unreadable stored expiry counts as already expired.
    fn prior_session(&self) -> Result<Session> {
        if let Some(session) = self.core.session() {
            return Ok(session);
        }

        match self.core.load_record() {
            StoredRecord::Present {
                token,
                user,
                expires_at,
            } => Ok(Session::new(user, token, expires_at.unwrap_or_else(Utc::now))),
            StoredRecord::Absent | StoredRecord::Corrupt(_) => Err(SessionError::NotAuthenticated),
        }
    }

    async fn logout_locked(&self, navigate: bool) {
        if self.core.current_token().is_some() {
            if let Err(e) = self
                .client
                .post_empty::<serde_json::Value>(LOGOUT_ENDPOINT)
                .await
            {
                tracing::warn!(error = %e, status = ?e.status(), "Logout notification failed");
            }
        }

        self.core.clear_error();
        self.core.teardown(navigate);

        tracing::info!("Logged out");
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            client: self.client.clone(),
            operation: Arc::clone(&self.operation),
        }
    }
}

fn session_from_login(body: LoginResponse) -> Option<Session> {
    if body.token.is_empty() {
        return None;
    }
    let expires_at = parse_timestamp(&body.expires_at)?;
    Some(Session::new(body.user, body.token, expires_at))
}

/// Server message first, then the transport error, then the generic text.
fn login_failure_message(err: &ApiError) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }
    match err {
        ApiError::Decode(_) | ApiError::Unauthorized { .. } | ApiError::Status { .. } => {
            LOGIN_FAILED.to_string()
        }
        other => other.to_string(),
    }
}
