//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

pub mod admin;       // admins, admin_sessions
pub mod agents;      // pennyekart_agents
pub mod panchayaths; // panchayaths
