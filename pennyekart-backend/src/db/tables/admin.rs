//! Admin accounts and session database operations

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;
use uuid::Uuid;

use super::super::Database;
use crate::models::{AdminAccount, AdminSessionRecord};

impl Database {
    pub fn get_admin_by_username(&self, username: &str) -> SqliteResult<Option<AdminAccount>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT id, username, password_hash, is_active, created_at
             FROM admins WHERE username = ?1",
            [username],
            |row| {
                Ok(AdminAccount {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    is_active: row.get::<_, i32>(3)? != 0,
                    created_at: row.get(4)?,
                })
            },
        );
        match result {
            Ok(admin) => Ok(Some(admin)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert an admin or replace the password of an existing one.
    pub fn upsert_admin(&self, username: &str, password_hash: &str) -> SqliteResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO admins (id, username, password_hash, is_active, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(username) DO UPDATE SET
                password_hash = excluded.password_hash,
                is_active = 1",
            rusqlite::params![Uuid::new_v4().to_string(), username, password_hash, now],
        )?;
        Ok(())
    }

    pub fn create_admin_session(
        &self,
        admin_id: &str,
        username: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> SqliteResult<AdminSessionRecord> {
        let conn = self.conn()?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO admin_sessions (id, admin_id, username, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                id,
                admin_id,
                username,
                created_at.to_rfc3339(),
                expires_at.to_rfc3339()
            ],
        )?;
        Ok(AdminSessionRecord {
            id,
            admin_id: admin_id.to_string(),
            username: username.to_string(),
            created_at,
            expires_at,
        })
    }

    /// Whether a session row still exists (it is removed on logout and purge).
    pub fn admin_session_exists(&self, session_id: &str) -> SqliteResult<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM admin_sessions s
             JOIN admins a ON a.id = s.admin_id
             WHERE s.id = ?1 AND a.is_active = 1",
            [session_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn delete_admin_session(&self, session_id: &str) -> SqliteResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM admin_sessions WHERE id = ?1", [session_id])?;
        Ok(rows > 0)
    }

    /// Remove sessions whose expiry is in the past. Returns the number removed.
    pub fn purge_expired_admin_sessions(&self, now: DateTime<Utc>) -> SqliteResult<usize> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM admin_sessions WHERE expires_at <= ?1",
            [now.to_rfc3339()],
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::temp_db;
    use chrono::{Duration, Utc};

    #[test]
    fn test_session_lifecycle() {
        let (_dir, db) = temp_db();
        db.upsert_admin("root", "hash-1").unwrap();
        db.upsert_admin("root", "hash-2").unwrap();
        let admin = db.get_admin_by_username("root").unwrap().unwrap();
        assert_eq!(admin.password_hash, "hash-2");

        let now = Utc::now();
        let live = db
            .create_admin_session(&admin.id, "root", now, now + Duration::hours(1))
            .unwrap();
        let stale = db
            .create_admin_session(&admin.id, "root", now - Duration::hours(2), now - Duration::hours(1))
            .unwrap();

        assert!(db.admin_session_exists(&live.id).unwrap());
        assert_eq!(db.purge_expired_admin_sessions(now).unwrap(), 1);
        assert!(!db.admin_session_exists(&stale.id).unwrap());

        assert!(db.delete_admin_session(&live.id).unwrap());
        assert!(!db.admin_session_exists(&live.id).unwrap());
    }
}
