//! FormScan Store — SQLite persistence for parsed assessment forms.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::FormStore;
pub use types::*;
