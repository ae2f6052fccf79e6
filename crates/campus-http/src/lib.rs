//! Campus HTTP Client
//!
//! JSON client for the platform API. Attaches the stored bearer token to
//! every request and runs the global 401 handling: clear the persisted
//! session, then notify the registered [`UnauthorizedHandler`].

mod client;
mod config;
mod error;

pub use client::{ApiClient, TokenSource, UnauthorizedHandler};
pub use config::{ApiConfig, DEFAULT_TIMEOUT};
pub use error::ApiError;

pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, ApiError>;
