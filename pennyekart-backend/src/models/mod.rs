pub mod admin;

pub use admin::{AdminAccount, AdminSessionRecord};
pub use pennyekart_agent_types::{
    Agent, AgentNode, AgentPatch, AgentPayload, AgentRole, HierarchyView, HierarchyViolation,
    Panchayath, ViolationKind,
};
