//! Role-dependent field defaulting applied before every write.
//!
//! | role            | parent | ward         | panchayath scope | ward scope | customers |
//! |-----------------|--------|--------------|------------------|------------|-----------|
//! | team_leader     | null   | "N/A" if blank | kept           | []         | 0         |
//! | coordinator     | kept   | kept         | []               | kept       | 0         |
//! | group_leader    | kept   | kept         | []               | []         | 0         |
//! | pro             | kept   | kept         | []               | []         | kept      |

use pennyekart_agent_types::TEAM_LEADER_WARD;

use crate::models::{Agent, AgentPatch, AgentPayload, AgentRole};

/// Clear or fill the fields the agent's role does not own. Idempotent.
pub fn apply_role_defaults(agent: &mut Agent) {
    agent.name = agent.name.trim().to_string();
    agent.mobile = agent.mobile.trim().to_string();
    agent.panchayath_id = agent.panchayath_id.trim().to_string();
    agent.ward = agent.ward.trim().to_string();
    agent.parent_agent_id = agent
        .parent_agent_id
        .take()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    if agent.role == AgentRole::TeamLeader {
        agent.parent_agent_id = None;
        if agent.ward.is_empty() {
            agent.ward = TEAM_LEADER_WARD.to_string();
        }
        agent.responsible_panchayath_ids = normalize_set(&agent.responsible_panchayath_ids);
    } else {
        agent.responsible_panchayath_ids.clear();
    }

    if agent.role == AgentRole::Coordinator {
        agent.responsible_wards = normalize_set(&agent.responsible_wards);
    } else {
        agent.responsible_wards.clear();
    }

    if agent.role != AgentRole::Pro {
        agent.customer_count = 0;
    }
}

/// Trim, drop blanks and duplicates, keep first-seen order.
fn normalize_set(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

/// Raw agent row for a create payload, before defaulting and validation.
pub fn draft_from_payload(payload: AgentPayload, id: String, now: &str, created_by: &str) -> Agent {
    Agent {
        id,
        name: payload.name,
        mobile: payload.mobile,
        role: payload.role,
        panchayath_id: payload.panchayath_id,
        ward: payload.ward.unwrap_or_default(),
        parent_agent_id: payload.parent_agent_id,
        customer_count: payload.customer_count.unwrap_or(0),
        responsible_panchayath_ids: payload.responsible_panchayath_ids,
        responsible_wards: payload.responsible_wards,
        is_active: payload.is_active.unwrap_or(true),
        created_at: now.to_string(),
        updated_at: now.to_string(),
        created_by: Some(created_by.to_string()),
    }
}

/// Stored row with a partial update laid over it, before defaulting.
pub fn merge_patch(existing: &Agent, patch: AgentPatch, now: &str) -> Agent {
    let mut merged = existing.clone();
    if let Some(name) = patch.name {
        merged.name = name;
    }
    if let Some(mobile) = patch.mobile {
        merged.mobile = mobile;
    }
    if let Some(role) = patch.role {
        merged.role = role;
    }
    if let Some(panchayath_id) = patch.panchayath_id {
        merged.panchayath_id = panchayath_id;
    }
    if let Some(ward) = patch.ward {
        merged.ward = ward;
    }
    if let Some(parent) = patch.parent_agent_id {
        merged.parent_agent_id = parent;
    }
    if let Some(count) = patch.customer_count {
        merged.customer_count = count;
    }
    if let Some(ids) = patch.responsible_panchayath_ids {
        merged.responsible_panchayath_ids = ids;
    }
    if let Some(wards) = patch.responsible_wards {
        merged.responsible_wards = wards;
    }
    if let Some(active) = patch.is_active {
        merged.is_active = active;
    }
    // A team leader promoted out of the top role has no ward of its own yet.
    if merged.role != AgentRole::TeamLeader && merged.ward == TEAM_LEADER_WARD {
        merged.ward.clear();
    }
    merged.updated_at = now.to_string();
    merged
}
