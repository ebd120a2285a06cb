use chrono::{DateTime, Utc};
use serde::Serialize;

/// Row from `admins`
#[derive(Debug, Clone, Serialize)]
pub struct AdminAccount {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: String,
}

/// Row from `admin_sessions`
#[derive(Debug, Clone, Serialize)]
pub struct AdminSessionRecord {
    pub id: String,
    pub admin_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
