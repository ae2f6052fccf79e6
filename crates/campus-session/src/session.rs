//! Session data structure

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Identity fields of the signed-in user.
///
/// Stored as the `user` entry. `name` and `email` may be missing from older
/// records; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub school_id: Option<u64>,
    #[serde(default, rename = "schoolName", skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(default, rename = "schoolLogo", skip_serializing_if = "Option::is_none")]
    pub school_logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Who is signed in
    pub user: UserProfile,
    /// Opaque bearer credential
    pub token: String,
    /// Absolute instant after which the token is no longer accepted
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: UserProfile, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            user,
            token,
            expires_at,
        }
    }

    /// A token expiring exactly at `now` is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Same identity, new credential
    pub fn with_credentials(&self, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            user: self.user.clone(),
            token,
            expires_at,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.user.role == role
    }
}

/// Parse an absolute timestamp as the API and the store write them.
///
/// Accepts RFC 3339 (with or without fractional seconds) and
/// `YYYY-MM-DD HH:MM:SS`, the latter read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
