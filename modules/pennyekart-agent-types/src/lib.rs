//! Shared types for the Pennyekart agent hierarchy service and its clients.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

/// Ward value stored for team leaders, who operate above ward granularity.
pub const TEAM_LEADER_WARD: &str = "N/A";

// =====================================================
// Role Chain
// =====================================================

/// Field-agent role. Variants are declared top-down, so declaration order is
/// the supervision chain: each role supervises the one after it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentRole {
    TeamLeader,
    Coordinator,
    GroupLeader,
    Pro,
}

impl AgentRole {
    /// Human-readable label for dashboards and messages
    pub fn label(&self) -> &'static str {
        match self {
            AgentRole::TeamLeader => "Team Leader",
            AgentRole::Coordinator => "Coordinator",
            AgentRole::GroupLeader => "Group Leader",
            AgentRole::Pro => "PRO",
        }
    }

    /// Position in the chain, 0 for the topmost role.
    pub fn rank(&self) -> usize {
        match self {
            AgentRole::TeamLeader => 0,
            AgentRole::Coordinator => 1,
            AgentRole::GroupLeader => 2,
            AgentRole::Pro => 3,
        }
    }

    /// The role one level above, or `None` for team leaders.
    pub fn parent_role(&self) -> Option<AgentRole> {
        match self {
            AgentRole::TeamLeader => None,
            AgentRole::Coordinator => Some(AgentRole::TeamLeader),
            AgentRole::GroupLeader => Some(AgentRole::Coordinator),
            AgentRole::Pro => Some(AgentRole::GroupLeader),
        }
    }

    /// The role one level below, or `None` for PROs.
    pub fn child_role(&self) -> Option<AgentRole> {
        match self {
            AgentRole::TeamLeader => Some(AgentRole::Coordinator),
            AgentRole::Coordinator => Some(AgentRole::GroupLeader),
            AgentRole::GroupLeader => Some(AgentRole::Pro),
            AgentRole::Pro => None,
        }
    }

    /// All roles, top of the chain first.
    pub fn chain() -> Vec<AgentRole> {
        AgentRole::iter().collect()
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

// =====================================================
// Domain Types
// =====================================================

/// A field agent row from `pennyekart_agents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub role: AgentRole,
    pub panchayath_id: String,
    pub ward: String,
    pub parent_agent_id: Option<String>,
    pub customer_count: i64,
    /// Panchayaths overseen by a team leader
    pub responsible_panchayath_ids: Vec<String>,
    /// Wards overseen by a coordinator (may include wards beyond their own)
    pub responsible_wards: Vec<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
}

/// An agent with its subordinates attached, as rendered in the tree view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentNode {
    #[serde(flatten)]
    pub agent: Agent,
    pub children: Vec<AgentNode>,
}

impl AgentNode {
    pub fn leaf(agent: Agent) -> Self {
        Self {
            agent,
            children: Vec::new(),
        }
    }
}

/// Forest for the tree view plus the same rows for tabular views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyView {
    pub roots: Vec<AgentNode>,
    pub agents: Vec<Agent>,
}

/// A local administrative unit agents are attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panchayath {
    pub id: String,
    pub name: String,
    /// Number of wards; 0 when not configured
    pub ward_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

// =====================================================
// Hierarchy Audit
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViolationKind {
    ParentOnTeamLeader,
    MissingParent,
    DanglingParent,
    SelfParent,
    WrongParentRole,
    PanchayathScopeOnWrongRole,
    WardScopeOnWrongRole,
    CustomersOnNonPro,
    NegativeCustomerCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyViolation {
    pub agent_id: String,
    pub kind: ViolationKind,
    pub detail: String,
}

// =====================================================
// Mutation Request Types
// =====================================================

/// Fields submitted when creating an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPayload {
    /// Client-chosen id; lets a bulk import reference parents from the same batch
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub mobile: String,
    pub role: AgentRole,
    pub panchayath_id: String,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub parent_agent_id: Option<String>,
    #[serde(default)]
    pub customer_count: Option<i64>,
    #[serde(default)]
    pub responsible_panchayath_ids: Vec<String>,
    #[serde(default)]
    pub responsible_wards: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub role: Option<AgentRole>,
    #[serde(default)]
    pub panchayath_id: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    /// `null` clears the parent, absence keeps it
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent_agent_id: Option<Option<String>>,
    #[serde(default)]
    pub customer_count: Option<i64>,
    #[serde(default)]
    pub responsible_panchayath_ids: Option<Vec<String>>,
    #[serde(default)]
    pub responsible_wards: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Body of `POST /api/pennyekart-agents`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AgentPostRequest {
    Create { agent: AgentPayload },
    BulkCreate { agents: Vec<AgentPayload> },
}

/// Body of `PUT /api/pennyekart-agents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    pub id: String,
    pub agent: AgentPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateResult {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePanchayathRequest {
    pub name: String,
    #[serde(default)]
    pub ward_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePanchayathRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ward_count: Option<i64>,
}

// =====================================================
// Admin Session Types
// =====================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub expires_at: String,
}

// =====================================================
// Response Envelope
// =====================================================

/// `{data}` on success, `{error}` on failure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
