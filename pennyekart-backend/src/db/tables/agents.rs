//! Field agent database operations (`pennyekart_agents`)

use pennyekart_agent_types::{Agent, AgentRole};
use rusqlite::types::Type;
use rusqlite::{Connection, Result as SqliteResult, Row};

use super::super::Database;

const AGENT_COLUMNS: &str = "id, name, mobile, role, panchayath_id, ward, parent_agent_id,
    customer_count, responsible_panchayath_ids, responsible_wards, is_active,
    created_at, updated_at, created_by";

/// Orders rows top of the chain first, then by name.
const ROLE_RANK_ORDER: &str = "CASE role
    WHEN 'team_leader' THEN 0
    WHEN 'coordinator' THEN 1
    WHEN 'group_leader' THEN 2
    ELSE 3 END";

fn row_to_agent(row: &Row) -> SqliteResult<Agent> {
    let role_str: String = row.get(3)?;
    let role = role_str
        .parse::<AgentRole>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let panchayaths_str: String = row.get(8)?;
    let wards_str: String = row.get(9)?;
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        mobile: row.get(2)?,
        role,
        panchayath_id: row.get(4)?,
        ward: row.get(5)?,
        parent_agent_id: row.get(6)?,
        customer_count: row.get(7)?,
        responsible_panchayath_ids: serde_json::from_str(&panchayaths_str).unwrap_or_default(),
        responsible_wards: serde_json::from_str(&wards_str).unwrap_or_default(),
        is_active: row.get::<_, i32>(10)? != 0,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        created_by: row.get(13)?,
    })
}

fn to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn insert_with(conn: &Connection, agent: &Agent) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO pennyekart_agents (id, name, mobile, role, panchayath_id, ward, parent_agent_id,
            customer_count, responsible_panchayath_ids, responsible_wards, is_active,
            created_at, updated_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        rusqlite::params![
            agent.id,
            agent.name,
            agent.mobile,
            agent.role.as_ref(),
            agent.panchayath_id,
            agent.ward,
            agent.parent_agent_id,
            agent.customer_count,
            to_json(&agent.responsible_panchayath_ids),
            to_json(&agent.responsible_wards),
            agent.is_active as i32,
            agent.created_at,
            agent.updated_at,
            agent.created_by,
        ],
    )?;
    Ok(())
}

impl Database {
    /// List every agent, top of the chain first, then by name.
    pub fn list_agents(&self) -> SqliteResult<Vec<Agent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pennyekart_agents ORDER BY {}, name",
            AGENT_COLUMNS, ROLE_RANK_ORDER
        ))?;
        let agents = stmt
            .query_map([], row_to_agent)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(agents)
    }

    pub fn get_agent(&self, id: &str) -> SqliteResult<Option<Agent>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM pennyekart_agents WHERE id = ?1", AGENT_COLUMNS),
            [id],
            row_to_agent,
        );
        match result {
            Ok(agent) => Ok(Some(agent)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn get_agent_by_mobile(&self, mobile: &str) -> SqliteResult<Option<Agent>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM pennyekart_agents WHERE mobile = ?1", AGENT_COLUMNS),
            [mobile],
            row_to_agent,
        );
        match result {
            Ok(agent) => Ok(Some(agent)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Number of agents whose parent pointer references `id`.
    pub fn count_agent_children(&self, id: &str) -> SqliteResult<i64> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM pennyekart_agents WHERE parent_agent_id = ?1",
            [id],
            |row| row.get(0),
        )
    }

    /// Agents living in, or responsible for, the panchayath.
    pub fn count_agents_in_panchayath(&self, panchayath_id: &str) -> SqliteResult<i64> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM pennyekart_agents
             WHERE panchayath_id = ?1
                OR EXISTS (SELECT 1 FROM json_each(responsible_panchayath_ids) WHERE value = ?1)",
            [panchayath_id],
            |row| row.get(0),
        )
    }

    pub fn insert_agent(&self, agent: &Agent) -> SqliteResult<()> {
        let conn = self.conn()?;
        insert_with(&conn, agent)
    }

    /// Insert a batch in one transaction: all rows are written or none.
    pub fn insert_agents(&self, agents: &[Agent]) -> SqliteResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for agent in agents {
            insert_with(&tx, agent)?;
        }
        tx.commit()?;
        Ok(agents.len())
    }

    /// Overwrite every mutable column of an existing row. Returns false if missing.
    pub fn update_agent(&self, agent: &Agent) -> SqliteResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE pennyekart_agents SET
                name = ?1,
                mobile = ?2,
                role = ?3,
                panchayath_id = ?4,
                ward = ?5,
                parent_agent_id = ?6,
                customer_count = ?7,
                responsible_panchayath_ids = ?8,
                responsible_wards = ?9,
                is_active = ?10,
                updated_at = ?11
             WHERE id = ?12",
            rusqlite::params![
                agent.name,
                agent.mobile,
                agent.role.as_ref(),
                agent.panchayath_id,
                agent.ward,
                agent.parent_agent_id,
                agent.customer_count,
                to_json(&agent.responsible_panchayath_ids),
                to_json(&agent.responsible_wards),
                agent.is_active as i32,
                agent.updated_at,
                agent.id,
            ],
        )?;
        Ok(rows > 0)
    }

    /// Hard delete. Children keep their rows; their parent pointer is cleared.
    pub fn delete_agent(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM pennyekart_agents WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
