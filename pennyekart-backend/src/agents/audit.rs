//! Reports rows that break the role-chain invariants, e.g. ones written
//! while strict enforcement was off or left behind by a deleted parent.

use std::collections::HashMap;

use crate::models::{Agent, AgentRole, HierarchyViolation, ViolationKind};

pub fn audit(agents: &[Agent]) -> Vec<HierarchyViolation> {
    let by_id: HashMap<&str, &Agent> = agents.iter().map(|a| (a.id.as_str(), a)).collect();
    let mut violations = Vec::new();

    for agent in agents {
        let mut report = |kind: ViolationKind, detail: String| {
            violations.push(HierarchyViolation {
                agent_id: agent.id.clone(),
                kind,
                detail,
            });
        };

        match (agent.role.parent_role(), agent.parent_agent_id.as_deref()) {
            (None, Some(parent_id)) => report(
                ViolationKind::ParentOnTeamLeader,
                format!("Team leader {} has parent {}", agent.name, parent_id),
            ),
            (None, None) => {}
            (Some(_), None) => report(
                ViolationKind::MissingParent,
                format!("{} {} has no parent", agent.role.label(), agent.name),
            ),
            (Some(_), Some(parent_id)) if parent_id == agent.id => report(
                ViolationKind::SelfParent,
                format!("{} is its own parent", agent.name),
            ),
            (Some(expected), Some(parent_id)) => match by_id.get(parent_id) {
                None => report(
                    ViolationKind::DanglingParent,
                    format!("{} points at missing parent {}", agent.name, parent_id),
                ),
                Some(parent) if parent.role != expected => report(
                    ViolationKind::WrongParentRole,
                    format!(
                        "{} {} reports to {} {}",
                        agent.role.label(),
                        agent.name,
                        parent.role.label(),
                        parent.name
                    ),
                ),
                Some(_) => {}
            },
        }

        if agent.role != AgentRole::TeamLeader && !agent.responsible_panchayath_ids.is_empty() {
            report(
                ViolationKind::PanchayathScopeOnWrongRole,
                format!("{} {} has responsible panchayaths", agent.role.label(), agent.name),
            );
        }
        if agent.role != AgentRole::Coordinator && !agent.responsible_wards.is_empty() {
            report(
                ViolationKind::WardScopeOnWrongRole,
                format!("{} {} has responsible wards", agent.role.label(), agent.name),
            );
        }
        if agent.customer_count < 0 {
            report(
                ViolationKind::NegativeCustomerCount,
                format!("{} has {} customers", agent.name, agent.customer_count),
            );
        } else if agent.role != AgentRole::Pro && agent.customer_count > 0 {
            report(
                ViolationKind::CustomersOnNonPro,
                format!(
                    "{} {} has {} customers",
                    agent.role.label(),
                    agent.name,
                    agent.customer_count
                ),
            );
        }
    }

    violations
}
