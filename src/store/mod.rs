//! Persistence layer: local flags and onboarding preferences.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{FlagStore, PreferenceStore, flag_keys};
