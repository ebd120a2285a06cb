mod sqlite;
pub mod tables;

pub use sqlite::{is_foreign_key_violation, is_unique_violation, Database, DbConn};

#[cfg(test)]
pub(crate) use sqlite::test_support;
