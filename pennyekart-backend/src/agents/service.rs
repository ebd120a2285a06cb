//! Agent mutations: default, validate, then write.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use super::defaults::{apply_role_defaults, draft_from_payload, merge_patch};
use super::validation::{validate_fields, validate_placement};
use super::MutationError;
use crate::db::Database;
use crate::models::{Agent, AgentPatch, AgentPayload, Panchayath};

fn load_panchayaths(db: &Database) -> Result<HashMap<String, Panchayath>, MutationError> {
    Ok(db
        .list_panchayaths()?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect())
}

/// Defaulted, field-validated row for a create payload.
fn prepare(payload: AgentPayload, now: &str, created_by: &str) -> Result<Agent, MutationError> {
    let id = payload
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut agent = draft_from_payload(payload, id, now, created_by);
    apply_role_defaults(&mut agent);
    validate_fields(&agent).map_err(MutationError::Validation)?;
    Ok(agent)
}

fn ensure_new(db: &Database, agent: &Agent) -> Result<(), MutationError> {
    if db.get_agent(&agent.id)?.is_some() {
        return Err(MutationError::validation("Agent id already exists"));
    }
    if db.get_agent_by_mobile(&agent.mobile)?.is_some() {
        return Err(MutationError::DuplicateMobile);
    }
    Ok(())
}

pub fn create_agent(
    db: &Database,
    payload: AgentPayload,
    created_by: &str,
    strict: bool,
) -> Result<Agent, MutationError> {
    let now = Utc::now().to_rfc3339();
    let agent = prepare(payload, &now, created_by)?;
    ensure_new(db, &agent)?;

    if strict {
        let panchayaths = load_panchayaths(db)?;
        let parent = match agent.parent_agent_id.as_deref() {
            Some(parent_id) => db.get_agent(parent_id)?,
            None => None,
        };
        validate_placement(&agent, &panchayaths, parent.as_ref(), None)
            .map_err(MutationError::Validation)?;
    }

    db.insert_agent(&agent)?;
    log::info!(
        "Created {} {} ({}) by {}",
        agent.role.label(),
        agent.name,
        agent.id,
        created_by
    );
    Ok(agent)
}

/// Create a batch atomically. Rows may name parents created earlier in the
/// same batch by client-supplied id. Returns the number of rows written.
pub fn bulk_create_agents(
    db: &Database,
    payloads: Vec<AgentPayload>,
    created_by: &str,
    strict: bool,
) -> Result<usize, MutationError> {
    if payloads.is_empty() {
        return Err(MutationError::validation("No agents to create"));
    }

    let now = Utc::now().to_rfc3339();
    let row_error = |row: usize, e: MutationError| -> MutationError {
        match e {
            MutationError::Validation(msg) => {
                MutationError::Validation(format!("Row {}: {}", row + 1, msg))
            }
            other => other,
        }
    };

    let mut agents = Vec::with_capacity(payloads.len());
    let mut ids = HashSet::new();
    let mut mobiles = HashSet::new();
    for (row, payload) in payloads.into_iter().enumerate() {
        let agent = prepare(payload, &now, created_by).map_err(|e| row_error(row, e))?;
        if !ids.insert(agent.id.clone()) {
            return Err(row_error(row, MutationError::validation("Duplicate agent id in batch")));
        }
        if !mobiles.insert(agent.mobile.clone()) {
            return Err(MutationError::DuplicateMobile);
        }
        ensure_new(db, &agent).map_err(|e| row_error(row, e))?;
        agents.push(agent);
    }

    if strict {
        let panchayaths = load_panchayaths(db)?;
        let in_batch: HashMap<&str, &Agent> = agents.iter().map(|a| (a.id.as_str(), a)).collect();
        for (row, agent) in agents.iter().enumerate() {
            let stored;
            let parent = match agent.parent_agent_id.as_deref() {
                Some(parent_id) => match in_batch.get(parent_id) {
                    Some(parent) => Some(*parent),
                    None => {
                        stored = db.get_agent(parent_id)?;
                        stored.as_ref()
                    }
                },
                None => None,
            };
            validate_placement(agent, &panchayaths, parent, None)
                .map_err(|msg| row_error(row, MutationError::Validation(msg)))?;
        }
    }

    let agents = parents_first(agents);
    let count = db.insert_agents(&agents)?;
    log::info!("Bulk created {} agents by {}", count, created_by);
    Ok(count)
}

/// Reorder a batch so each row follows its in-batch parent, which the
/// self-referencing foreign key needs. Rows in a parent cycle keep their
/// input order.
fn parents_first(agents: Vec<Agent>) -> Vec<Agent> {
    let index: HashMap<&str, usize> = agents
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id.as_str(), i))
        .collect();
    let mut placed = vec![false; agents.len()];
    let mut order = Vec::with_capacity(agents.len());

    for start in 0..agents.len() {
        // Walk up to the first ancestor that is placed or outside the batch.
        let mut chain = Vec::new();
        let mut cursor = Some(start);
        let mut cycle = false;
        while let Some(i) = cursor {
            if placed[i] {
                break;
            }
            if chain.contains(&i) {
                cycle = true;
                break;
            }
            chain.push(i);
            cursor = agents[i]
                .parent_agent_id
                .as_deref()
                .and_then(|p| index.get(p).copied());
        }
        if cycle {
            chain.sort_unstable();
        } else {
            chain.reverse();
        }
        for i in chain {
            placed[i] = true;
            order.push(i);
        }
    }

    let mut slots: Vec<Option<Agent>> = agents.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

pub fn update_agent(
    db: &Database,
    id: &str,
    patch: AgentPatch,
    strict: bool,
) -> Result<Agent, MutationError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(MutationError::validation("Agent id is required"));
    }
    let existing = db
        .get_agent(id)?
        .ok_or_else(|| MutationError::not_found("Agent not found"))?;

    let now = Utc::now().to_rfc3339();
    let mut agent = merge_patch(&existing, patch, &now);
    apply_role_defaults(&mut agent);
    validate_fields(&agent).map_err(MutationError::Validation)?;

    if agent.mobile != existing.mobile {
        if let Some(other) = db.get_agent_by_mobile(&agent.mobile)? {
            if other.id != agent.id {
                return Err(MutationError::DuplicateMobile);
            }
        }
    }

    if strict {
        if agent.role != existing.role && db.count_agent_children(&agent.id)? > 0 {
            return Err(MutationError::validation(
                "Cannot change the role of an agent that still has subordinates",
            ));
        }
        let panchayaths = load_panchayaths(db)?;
        let parent = match agent.parent_agent_id.as_deref() {
            Some(parent_id) => db.get_agent(parent_id)?,
            None => None,
        };
        validate_placement(&agent, &panchayaths, parent.as_ref(), Some(&existing))
            .map_err(MutationError::Validation)?;
    }

    if !db.update_agent(&agent)? {
        return Err(MutationError::not_found("Agent not found"));
    }
    log::info!("Updated agent {} ({})", agent.name, agent.id);
    Ok(agent)
}

/// Hard delete; subordinates stay and lose their parent pointer.
pub fn delete_agent(db: &Database, id: &str) -> Result<(), MutationError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(MutationError::validation("Agent id is required"));
    }
    if !db.delete_agent(id)? {
        return Err(MutationError::not_found("Agent not found"));
    }
    log::info!("Deleted agent {}", id);
    Ok(())
}
