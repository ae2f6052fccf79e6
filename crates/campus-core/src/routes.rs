//! Route guards
//!
//! | Path             | Access                                   |
//! | /                | redirect to /dashboard                   |
//! | /login           | public                                   |
//! | /unauthorized    | public                                   |
//! | /dashboard       | signed in, redirect to the role's page   |
//! | /Super_Admin/*   | super_admin only                         |

use campus_session::{Role, SessionManager, LOGIN_PATH};

pub const DASHBOARD_PATH: &str = "/dashboard";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

const SUPER_ADMIN_PREFIX: &str = "/Super_Admin";

/// Outcome of checking a path against the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Not signed in. `from` is the page to return to after login.
    Login { from: String },
    /// Signed in with a role the page does not admit
    Unauthorized,
    Redirect(String),
    NotFound,
}

impl Access {
    /// Where the user ends up, if not on the requested page
    pub fn target(&self) -> Option<&str> {
        match self {
            Access::Granted | Access::NotFound => None,
            Access::Login { .. } => Some(LOGIN_PATH),
            Access::Unauthorized => Some(UNAUTHORIZED_PATH),
            Access::Redirect(path) => Some(path),
        }
    }
}

/// Landing page for the signed-in role, or the login page without one
pub fn dashboard_path_for(role: Option<Role>) -> &'static str {
    role.map(|r| r.dashboard_path()).unwrap_or(LOGIN_PATH)
}

/// Access decisions for one snapshot of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteGuard {
    role: Option<Role>,
}

impl RouteGuard {
    pub fn new(role: Option<Role>) -> Self {
        Self { role }
    }

    /// Snapshot the session. Anything short of `Authenticated` is anonymous.
    pub fn for_session(session: &SessionManager) -> Self {
        let role = session
            .is_authenticated()
            .then(|| session.current_user())
            .flatten()
            .map(|user| user.role);
        Self::new(role)
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Private-route check. An empty `roles` admits any signed-in user.
    pub fn check(&self, path: &str, roles: &[Role]) -> Access {
        match self.role {
            None => Access::Login {
                from: path.to_string(),
            },
            Some(role) if !roles.is_empty() && !roles.contains(&role) => Access::Unauthorized,
            Some(_) => Access::Granted,
        }
    }

    /// Apply the route table to `path`
    pub fn resolve(&self, path: &str) -> Access {
        match path {
            "/" => Access::Redirect(DASHBOARD_PATH.to_string()),
            LOGIN_PATH | UNAUTHORIZED_PATH => Access::Granted,
            DASHBOARD_PATH => match self.check(path, &[]) {
                Access::Granted => Access::Redirect(dashboard_path_for(self.role).to_string()),
                denied => denied,
            },
            _ if is_under(path, SUPER_ADMIN_PREFIX) => self.check(path, &[Role::SuperAdmin]),
            _ => Access::NotFound,
        }
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
