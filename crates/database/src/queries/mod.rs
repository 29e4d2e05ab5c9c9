//! Database query operations organized by table

pub mod cursors;
pub mod log_entries;

// Re-export commonly used query functions
pub use cursors::{load_cursor, save_cursor};
pub use log_entries::{append_entry, has_entries, insert_entry, query_entries};
