use rand::RngCore;
use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DB_POOL_SIZE: &str = "DB_POOL_SIZE";
    pub const ADMIN_TOKEN_SECRET: &str = "ADMIN_TOKEN_SECRET";
    pub const ADMIN_SESSION_TTL_HOURS: &str = "ADMIN_SESSION_TTL_HOURS";
    // Bootstrap admin, upserted at startup when both are set
    pub const ADMIN_USERNAME: &str = "ADMIN_USERNAME";
    pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
    // Server-side enforcement of the role chain on every mutation
    pub const STRICT_HIERARCHY: &str = "STRICT_HIERARCHY";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/pennyekart.db";
    pub const DB_POOL_SIZE: u32 = 8;
    pub const ADMIN_SESSION_TTL_HOURS: i64 = 24;
    pub const STRICT_HIERARCHY: bool = true;
    /// How often expired admin sessions are purged
    pub const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub db_pool_size: u32,
    pub admin_token_secret: Vec<u8>,
    pub admin_session_ttl_hours: i64,
    pub bootstrap_admin: Option<(String, String)>,
    pub strict_hierarchy: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let port = match env::var(env_vars::PORT) {
            Ok(v) => v
                .parse()
                .map_err(|_| format!("{} must be a valid port number, got '{}'", env_vars::PORT, v))?,
            Err(_) => defaults::PORT,
        };

        let db_pool_size = env::var(env_vars::DB_POOL_SIZE)
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(defaults::DB_POOL_SIZE);

        let admin_token_secret = match env::var(env_vars::ADMIN_TOKEN_SECRET) {
            Ok(secret) if !secret.trim().is_empty() => secret.into_bytes(),
            _ => {
                log::warn!(
                    "{} not set - generating a random secret, admin tokens will not survive a restart",
                    env_vars::ADMIN_TOKEN_SECRET
                );
                let mut bytes = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }
        };

        let admin_session_ttl_hours = env::var(env_vars::ADMIN_SESSION_TTL_HOURS)
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h: &i64| *h > 0)
            .unwrap_or(defaults::ADMIN_SESSION_TTL_HOURS);

        let bootstrap_admin = match (
            env::var(env_vars::ADMIN_USERNAME).ok(),
            env::var(env_vars::ADMIN_PASSWORD).ok(),
        ) {
            (Some(user), Some(pass)) if !user.trim().is_empty() && !pass.is_empty() => {
                Some((user.trim().to_string(), pass))
            }
            _ => None,
        };

        Ok(Self {
            port,
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            db_pool_size,
            admin_token_secret,
            admin_session_ttl_hours,
            bootstrap_admin,
            strict_hierarchy: parse_flag(
                env::var(env_vars::STRICT_HIERARCHY).ok().as_deref(),
                defaults::STRICT_HIERARCHY,
            ),
        })
    }

    /// Configuration for tests: fixed secret, strict hierarchy, no bootstrap admin
    #[cfg(test)]
    pub fn for_tests(database_url: &str) -> Self {
        Self {
            port: defaults::PORT,
            database_url: database_url.to_string(),
            db_pool_size: 2,
            admin_token_secret: b"test-secret".to_vec(),
            admin_session_ttl_hours: defaults::ADMIN_SESSION_TTL_HOURS,
            bootstrap_admin: None,
            strict_hierarchy: true,
        }
    }
}

fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "1" || v == "true" || v == "yes" => true,
        Some(v) if v == "0" || v == "false" || v == "no" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true"), false));
        assert!(parse_flag(Some("1"), false));
        assert!(!parse_flag(Some("FALSE"), true));
        assert!(!parse_flag(Some("0"), true));
        assert!(parse_flag(Some("maybe"), true));
        assert!(!parse_flag(None, false));
    }
}
