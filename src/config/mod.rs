//! Patch-file configuration: TOML schema, validation, and loading.

mod loader;
mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{Metadata, PatchConfig, PatchEntry, ValidationError, ValidationIssue};
