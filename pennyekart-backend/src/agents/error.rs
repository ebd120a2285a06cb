use std::fmt;

use actix_web::HttpResponse;

use crate::db::{is_foreign_key_violation, is_unique_violation};

pub const DUPLICATE_MOBILE_MESSAGE: &str = "Mobile number already exists";

/// Failure of an agent or panchayath mutation.
#[derive(Debug)]
pub enum MutationError {
    /// Rejected input; the message is shown to the admin as is
    Validation(String),
    DuplicateMobile,
    NotFound(String),
    Database(rusqlite::Error),
}

impl MutationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        MutationError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        MutationError::NotFound(msg.into())
    }

    /// `{error}` envelope with the matching status code.
    pub fn to_response(&self) -> HttpResponse {
        let body = serde_json::json!({ "error": self.to_string() });
        match self {
            MutationError::Validation(_) | MutationError::DuplicateMobile => {
                HttpResponse::BadRequest().json(body)
            }
            MutationError::NotFound(_) => HttpResponse::NotFound().json(body),
            MutationError::Database(e) => {
                log::error!("Database error during mutation: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::Validation(msg) | MutationError::NotFound(msg) => write!(f, "{}", msg),
            MutationError::DuplicateMobile => write!(f, "{}", DUPLICATE_MOBILE_MESSAGE),
            MutationError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for MutationError {}

impl From<rusqlite::Error> for MutationError {
    fn from(e: rusqlite::Error) -> Self {
        if is_unique_violation(&e, "pennyekart_agents.mobile") {
            MutationError::DuplicateMobile
        } else if is_unique_violation(&e, "pennyekart_agents.id") {
            MutationError::validation("Agent id already exists")
        } else if is_unique_violation(&e, "panchayaths.name") {
            MutationError::validation("Panchayath name already exists")
        } else if is_foreign_key_violation(&e) {
            MutationError::validation("Referenced panchayath or parent agent does not exist")
        } else {
            MutationError::Database(e)
        }
    }
}
