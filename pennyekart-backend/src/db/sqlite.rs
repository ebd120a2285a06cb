use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result as SqliteResult;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn new(database_url: &str, pool_size: u32) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        });
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let db = Self { pool };
        db.init()?;
        Ok(db)
    }

    /// Check out a pooled connection.
    pub(crate) fn conn(&self) -> SqliteResult<DbConn> {
        self.pool.get().map_err(pool_error)
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;

        // Panchayaths (geographic units agents belong to)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS panchayaths (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                ward_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Field agents; parent pointer is a self reference
        conn.execute(
            "CREATE TABLE IF NOT EXISTS pennyekart_agents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                mobile TEXT UNIQUE NOT NULL,
                role TEXT NOT NULL
                    CHECK (role IN ('team_leader', 'coordinator', 'group_leader', 'pro')),
                panchayath_id TEXT NOT NULL REFERENCES panchayaths(id),
                ward TEXT NOT NULL,
                parent_agent_id TEXT REFERENCES pennyekart_agents(id) ON DELETE SET NULL,
                customer_count INTEGER NOT NULL DEFAULT 0,
                responsible_panchayath_ids TEXT NOT NULL DEFAULT '[]',
                responsible_wards TEXT NOT NULL DEFAULT '[]',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_agents_parent ON pennyekart_agents(parent_agent_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_agents_panchayath_role ON pennyekart_agents(panchayath_id, role)",
            [],
        )?;

        // Admin accounts
        conn.execute(
            "CREATE TABLE IF NOT EXISTS admins (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Issued admin sessions (a deleted row revokes its token)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS admin_sessions (
                id TEXT PRIMARY KEY,
                admin_id TEXT NOT NULL REFERENCES admins(id) ON DELETE CASCADE,
                username TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

fn pool_error(e: r2d2::Error) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
        Some(format!("Connection pool error: {}", e)),
    )
}

/// True when `err` is a UNIQUE constraint failure on `table.column`.
pub fn is_unique_violation(err: &rusqlite::Error, table_column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("UNIQUE constraint failed")
                && msg.contains(table_column)
        }
        _ => false,
    }
}

/// True when `err` is a FOREIGN KEY constraint failure.
pub fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("FOREIGN KEY constraint failed")
        }
        _ => false,
    }
}
