//! User roles
//!
//! | Role         | Dashboard       |
//! | super_admin  | /Super_Admin    |
//! | school_admin | /School_Admin   |
//! | teacher      | /teacher        |
//! | parent       | /parent         |

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    SchoolAdmin,
    Teacher,
    Parent,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::SchoolAdmin, Role::Teacher, Role::Parent];

    /// Landing page for users with this role
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "/Super_Admin",
            Role::SchoolAdmin => "/School_Admin",
            Role::Teacher => "/teacher",
            Role::Parent => "/parent",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::SchoolAdmin => "school_admin",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "super_admin" => Ok(Role::SuperAdmin),
            "school_admin" => Ok(Role::SchoolAdmin),
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}
