//! syncwatch Database Layer
//!
//! SQLite storage for the audit log and for client cursors, built on sqlx.
//! Log queries are compiled from the structured predicate tree with every
//! value bound as a parameter.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod sql;
pub mod store;

pub use connection::{connect, connect_in_memory, DbPool, SqliteSettings};
pub use migrations::{current_version, run_migrations};
pub use store::{SqliteLogStore, SqliteWatermarkStore};
