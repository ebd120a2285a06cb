//! Field-agent hierarchy: tree building, filtering, defaulting, validation
//! and the mutation service behind `/api/pennyekart-agents`.

pub mod audit;
pub mod defaults;
mod error;
pub mod filter;
pub mod hierarchy;
pub mod service;
pub mod validation;

pub use error::MutationError;
