//! Persistence layer.
//!
//! The business services talk to the [`Gateway`] trait only; the SQLite
//! [`Database`] is the production implementation.

mod gateway;
pub mod migrations;
pub mod sqlite;

pub use gateway::Gateway;
pub use sqlite::Database;
