//! Admin sessions: signed `x-admin-token` values and password checks.
//!
//! A token is `base64url(claims).hex(hmac_sha256(secret, base64url(claims)))`.
//! The claims carry their own expiry, and the session row they name must
//! still exist, so logout revokes a token before it expires.

pub mod password;
mod token;

pub use token::TokenSigner;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Header carrying the admin token on every authenticated request
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Claims of a verified admin token; handed to handlers that need the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub session_id: String,
    pub admin_id: String,
    pub username: String,
    /// Unix seconds
    pub issued_at: i64,
    /// Unix seconds
    pub expires_at: i64,
}

impl AdminSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }

    pub fn expires_at_rfc3339(&self) -> String {
        Utc.timestamp_opt(self.expires_at, 0)
            .single()
            .map(|t| t.to_rfc3339())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    Expired,
    Revoked,
    InvalidCredentials,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "No admin token provided",
            AuthError::InvalidToken => "Invalid admin token",
            AuthError::Expired => "Admin session expired",
            AuthError::Revoked => "Admin session is no longer valid",
            AuthError::InvalidCredentials => "Invalid username or password",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
