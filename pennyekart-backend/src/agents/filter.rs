//! Predicates that narrow the agent set before the tree or table is built.

use serde::Deserialize;

use crate::models::{Agent, AgentRole};

/// Query-string filter for agent listings. Every set field must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentFilter {
    /// Home panchayath, or one the agent is responsible for
    #[serde(default)]
    pub panchayath_id: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub role: Option<AgentRole>,
    /// Case-insensitive substring of name or mobile
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub active_only: Option<bool>,
}

impl AgentFilter {
    pub fn matches(&self, agent: &Agent) -> bool {
        if let Some(panchayath_id) = non_blank(&self.panchayath_id) {
            let in_scope = agent.panchayath_id == panchayath_id
                || agent
                    .responsible_panchayath_ids
                    .iter()
                    .any(|p| p == panchayath_id);
            if !in_scope {
                return false;
            }
        }

        if let Some(ward) = non_blank(&self.ward) {
            if agent.ward != ward {
                return false;
            }
        }

        if let Some(role) = self.role {
            if agent.role != role {
                return false;
            }
        }

        if let Some(search) = non_blank(&self.search) {
            let needle = search.to_lowercase();
            if !agent.name.to_lowercase().contains(&needle)
                && !agent.mobile.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if self.active_only.unwrap_or(false) && !agent.is_active {
            return false;
        }

        true
    }

    /// Keep the matching agents, preserving order.
    pub fn apply(&self, agents: Vec<Agent>) -> Vec<Agent> {
        agents.into_iter().filter(|a| self.matches(a)).collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Agents that may be picked as parent for a new `target_role` agent in
/// `panchayath_id`: exactly one role up, same home panchayath, active.
/// Responsibility scope does not widen this list. Sorted by name.
pub fn parent_candidates(
    agents: &[Agent],
    target_role: AgentRole,
    panchayath_id: &str,
) -> Vec<Agent> {
    let Some(parent_role) = target_role.parent_role() else {
        return Vec::new();
    };
    let mut candidates: Vec<Agent> = agents
        .iter()
        .filter(|a| a.role == parent_role && a.panchayath_id == panchayath_id && a.is_active)
        .cloned()
        .collect();
    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    candidates
}
