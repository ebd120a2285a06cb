//! Checks run on a defaulted agent before it is written.
//!
//! `validate_fields` is pure data validation and always runs.
//! `validate_placement` enforces where the agent may sit in the chain and
//! only runs when strict hierarchy enforcement is on.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Agent, AgentRole, Panchayath};

static MOBILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_RE.is_match(mobile)
}

pub fn validate_fields(agent: &Agent) -> Result<(), String> {
    if agent.name.is_empty() {
        return Err("Name is required".to_string());
    }
    if !is_valid_mobile(&agent.mobile) {
        return Err("Mobile number must be exactly 10 digits".to_string());
    }
    if agent.panchayath_id.is_empty() {
        return Err("Panchayath is required".to_string());
    }
    if agent.role != AgentRole::TeamLeader && agent.ward.is_empty() {
        return Err("Ward is required".to_string());
    }
    if agent.customer_count < 0 {
        return Err("Customer count cannot be negative".to_string());
    }
    check_self_parent(agent)
}

pub fn check_self_parent(agent: &Agent) -> Result<(), String> {
    if agent.parent_agent_id.as_deref() == Some(agent.id.as_str()) {
        return Err("An agent cannot be its own parent".to_string());
    }
    Ok(())
}

/// Strict placement checks. `parent` is the agent `parent_agent_id` resolved
/// to, or `None` when the pointer is empty or names no known agent.
///
/// `stored` is the row as it was before an update, `None` on create. A parent
/// link the row already held is not re-checked for activity, and its scope is
/// only re-checked when the agent moves panchayath.
pub fn validate_placement(
    agent: &Agent,
    panchayaths: &HashMap<String, Panchayath>,
    parent: Option<&Agent>,
    stored: Option<&Agent>,
) -> Result<(), String> {
    let home = panchayaths
        .get(&agent.panchayath_id)
        .ok_or_else(|| format!("Panchayath {} does not exist", agent.panchayath_id))?;

    for id in &agent.responsible_panchayath_ids {
        if !panchayaths.contains_key(id) {
            return Err(format!("Responsible panchayath {} does not exist", id));
        }
    }

    if agent.role != AgentRole::TeamLeader {
        check_ward(home, &agent.ward)?;
    }
    for ward in &agent.responsible_wards {
        check_ward(home, ward)?;
    }

    let Some(expected_role) = agent.role.parent_role() else {
        return Ok(());
    };

    let parent_id = agent.parent_agent_id.as_deref().ok_or_else(|| {
        format!(
            "A {} must have a {} as parent",
            agent.role.label(),
            expected_role.label()
        )
    })?;
    let parent = parent.ok_or_else(|| format!("Parent agent {} does not exist", parent_id))?;

    if parent.role != expected_role {
        return Err(format!(
            "Parent of a {} must be a {}, not a {}",
            agent.role.label(),
            expected_role.label(),
            parent.role.label()
        ));
    }

    let relinked = stored.is_none_or(|s| s.parent_agent_id != agent.parent_agent_id);
    let moved = stored.is_some_and(|s| s.panchayath_id != agent.panchayath_id);
    if relinked && !parent.is_active {
        return Err(format!("Parent agent {} is inactive", parent.name));
    }
    let in_scope = parent.panchayath_id == agent.panchayath_id
        || parent
            .responsible_panchayath_ids
            .iter()
            .any(|p| p == &agent.panchayath_id);
    if (relinked || moved) && !in_scope {
        return Err(format!(
            "Parent agent {} does not cover panchayath {}",
            parent.name, home.name
        ));
    }
    Ok(())
}

/// Numeric ward within `1..=ward_count`; anything goes when no count is set.
fn check_ward(panchayath: &Panchayath, ward: &str) -> Result<(), String> {
    if panchayath.ward_count <= 0 {
        return Ok(());
    }
    match ward.parse::<i64>() {
        Ok(n) if (1..=panchayath.ward_count).contains(&n) => Ok(()),
        _ => Err(format!(
            "Ward {} is not between 1 and {} in {}",
            ward, panchayath.ward_count, panchayath.name
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::agent;

    fn panchayaths(ward_count: i64) -> HashMap<String, Panchayath> {
        ["p1", "p2"]
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    Panchayath {
                        id: id.to_string(),
                        name: format!("Panchayath {}", id),
                        ward_count,
                        created_at: String::new(),
                        updated_at: String::new(),
                    },
                )
            })
            .collect()
    }

    fn valid(id: &str, role: AgentRole, parent: Option<&str>) -> Agent {
        let mut a = agent(id, role, parent);
        a.mobile = "9876543210".into();
        a
    }

    #[test]
    fn test_mobile_format() {
        assert!(is_valid_mobile("9876543210"));
        assert!(!is_valid_mobile("987654321"));
        assert!(!is_valid_mobile("98765432100"));
        assert!(!is_valid_mobile("98765abcde"));
        assert!(!is_valid_mobile(""));
    }

    #[test]
    fn test_field_validation() {
        assert!(validate_fields(&valid("a", AgentRole::Pro, Some("g"))).is_ok());

        let mut a = valid("a", AgentRole::Pro, Some("g"));
        a.name.clear();
        assert_eq!(validate_fields(&a).unwrap_err(), "Name is required");

        let mut a = valid("a", AgentRole::Pro, Some("g"));
        a.ward.clear();
        assert_eq!(validate_fields(&a).unwrap_err(), "Ward is required");

        let mut tl = valid("t", AgentRole::TeamLeader, None);
        tl.ward.clear();
        assert!(validate_fields(&tl).is_ok());

        let mut a = valid("a", AgentRole::Pro, Some("g"));
        a.customer_count = -1;
        assert!(validate_fields(&a).is_err());

        let a = valid("a", AgentRole::Pro, Some("a"));
        assert_eq!(validate_fields(&a).unwrap_err(), "An agent cannot be its own parent");
    }

    #[test]
    fn test_parent_must_be_one_level_up() {
        let ps = panchayaths(0);
        let tl = valid("tl", AgentRole::TeamLeader, None);
        let co = valid("co", AgentRole::Coordinator, Some("tl"));

        let gl = valid("gl", AgentRole::GroupLeader, Some("tl"));
        assert!(validate_placement(&gl, &ps, Some(&tl), None).is_err());
        let gl = valid("gl", AgentRole::GroupLeader, Some("co"));
        assert!(validate_placement(&gl, &ps, Some(&co), None).is_ok());

        let pro = valid("pro", AgentRole::Pro, None);
        assert!(validate_placement(&pro, &ps, None, None).is_err());
        let pro = valid("pro", AgentRole::Pro, Some("missing"));
        assert_eq!(
            validate_placement(&pro, &ps, None, None).unwrap_err(),
            "Parent agent missing does not exist"
        );

        assert!(validate_placement(&tl, &ps, None, None).is_ok());
    }

    #[test]
    fn test_parent_scope_and_activity() {
        let ps = panchayaths(0);
        let mut tl = valid("tl", AgentRole::TeamLeader, None);
        tl.panchayath_id = "p2".into();

        let co = valid("co", AgentRole::Coordinator, Some("tl"));
        assert!(validate_placement(&co, &ps, Some(&tl), None).is_err());

        tl.responsible_panchayath_ids = vec!["p1".into()];
        assert!(validate_placement(&co, &ps, Some(&tl), None).is_ok());

        tl.is_active = false;
        assert!(validate_placement(&co, &ps, Some(&tl), None).is_err());
    }

    #[test]
    fn test_kept_parent_link_skips_activity_and_scope() {
        let ps = panchayaths(0);
        let mut tl = valid("tl", AgentRole::TeamLeader, None);
        tl.is_active = false;
        let stored = valid("co", AgentRole::Coordinator, Some("tl"));
        let mut co = stored.clone();
        co.name = "Renamed".into();
        assert!(validate_placement(&co, &ps, Some(&tl), Some(&stored)).is_ok());

        // Moving out of the parent's reach is still a new placement.
        co.panchayath_id = "p2".into();
        assert_eq!(
            validate_placement(&co, &ps, Some(&tl), Some(&stored)).unwrap_err(),
            "Parent agent Agent tl does not cover panchayath Panchayath p2"
        );

        let mut relinked = stored.clone();
        relinked.parent_agent_id = Some("tl2".into());
        let mut tl2 = tl.clone();
        tl2.id = "tl2".into();
        tl2.name = "Agent tl2".into();
        assert_eq!(
            validate_placement(&relinked, &ps, Some(&tl2), Some(&stored)).unwrap_err(),
            "Parent agent Agent tl2 is inactive"
        );
    }

    #[test]
    fn test_panchayath_and_ward_bounds() {
        let ps = panchayaths(10);
        let tl = valid("tl", AgentRole::TeamLeader, None);
        let mut co = valid("co", AgentRole::Coordinator, Some("tl"));
        co.ward = "10".into();
        co.responsible_wards = vec!["3".into(), "9".into()];
        assert!(validate_placement(&co, &ps, Some(&tl), None).is_ok());

        co.ward = "11".into();
        assert!(validate_placement(&co, &ps, Some(&tl), None).is_err());
        co.ward = "abc".into();
        assert!(validate_placement(&co, &ps, Some(&tl), None).is_err());
        co.ward = "2".into();
        co.responsible_wards = vec!["0".into()];
        assert!(validate_placement(&co, &ps, Some(&tl), None).is_err());

        let mut stray = valid("x", AgentRole::TeamLeader, None);
        stray.panchayath_id = "p9".into();
        assert_eq!(
            validate_placement(&stray, &ps, None, None).unwrap_err(),
            "Panchayath p9 does not exist"
        );

        let mut tl = valid("tl", AgentRole::TeamLeader, None);
        tl.ward = "N/A".into();
        tl.responsible_panchayath_ids = vec!["p2".into(), "p7".into()];
        assert!(validate_placement(&tl, &ps, None, None).is_err());
    }
}
