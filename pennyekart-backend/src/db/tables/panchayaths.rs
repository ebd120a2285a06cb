//! Panchayath database operations

use chrono::Utc;
use pennyekart_agent_types::Panchayath;
use rusqlite::{Result as SqliteResult, Row};
use uuid::Uuid;

use super::super::Database;

const PANCHAYATH_COLUMNS: &str = "id, name, ward_count, created_at, updated_at";

fn row_to_panchayath(row: &Row) -> SqliteResult<Panchayath> {
    Ok(Panchayath {
        id: row.get(0)?,
        name: row.get(1)?,
        ward_count: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl Database {
    /// List all panchayaths ordered by name.
    pub fn list_panchayaths(&self) -> SqliteResult<Vec<Panchayath>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM panchayaths ORDER BY name",
            PANCHAYATH_COLUMNS
        ))?;
        let panchayaths = stmt
            .query_map([], row_to_panchayath)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(panchayaths)
    }

    pub fn get_panchayath(&self, id: &str) -> SqliteResult<Option<Panchayath>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM panchayaths WHERE id = ?1", PANCHAYATH_COLUMNS),
            [id],
            row_to_panchayath,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn create_panchayath(&self, name: &str, ward_count: i64) -> SqliteResult<Panchayath> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO panchayaths (id, name, ward_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![id, name, ward_count, now],
        )?;
        Ok(Panchayath {
            id,
            name: name.to_string(),
            ward_count,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update name and/or ward count. Returns the refreshed row, None if missing.
    pub fn update_panchayath(
        &self,
        id: &str,
        name: Option<&str>,
        ward_count: Option<i64>,
    ) -> SqliteResult<Option<Panchayath>> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let rows = conn.execute(
            "UPDATE panchayaths SET
                name = COALESCE(?1, name),
                ward_count = COALESCE(?2, ward_count),
                updated_at = ?3
             WHERE id = ?4",
            rusqlite::params![name, ward_count, now, id],
        )?;
        drop(conn);
        if rows == 0 {
            return Ok(None);
        }
        self.get_panchayath(id)
    }

    /// Delete a panchayath. Fails with a foreign key error while agents reference it.
    pub fn delete_panchayath(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM panchayaths WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
