//! Authentication endpoint payloads

use serde::{Deserialize, Serialize};

use crate::session::UserProfile;

pub const LOGIN_ENDPOINT: &str = "/login";
pub const LOGOUT_ENDPOINT: &str = "/logout";
pub const REFRESH_ENDPOINT: &str = "/refresh-token";
pub const PROFILE_ENDPOINT: &str = "/user";

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
    pub expires_at: String,
}

/// `GET /user` answers with the bare profile or wraps it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProfileResponse {
    Wrapped { user: UserProfile },
    Data { data: UserProfile },
    Bare(UserProfile),
}

impl ProfileResponse {
    pub fn into_profile(self) -> UserProfile {
        match self {
            ProfileResponse::Wrapped { user } => user,
            ProfileResponse::Data { data } => data,
            ProfileResponse::Bare(user) => user,
        }
    }
}
