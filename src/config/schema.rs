use crate::batch::{PatchBatch, PatchRequest};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A patch file: metadata plus an ordered list of function replacements.
///
/// Entry order is preserved into the [`PatchBatch`], so it defines both the
/// file processing order and the within-file application order.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// When true, entry file paths are resolved against the workspace root
    #[serde(default)]
    pub workspace_relative: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchEntry {
    pub id: String,
    /// Target file path, workspace-relative when the meta flag is set
    pub file: String,
    /// Name of the function definition to replace
    pub function: String,
    /// Full replacement text, declaration line included
    pub replacement: String,
}

impl PatchConfig {
    /// Validate the config, collecting every issue instead of stopping at
    /// the first. A config that fails here is rejected before any target
    /// file is touched.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        for entry in &self.patches {
            if entry.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
            }
            if entry.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(entry.id.clone()),
                    field: "file",
                });
            }
            if entry.function.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(entry.id.clone()),
                    field: "function",
                });
            } else if !is_identifier(&entry.function) {
                issues.push(ValidationIssue::InvalidFunctionName {
                    patch_id: Some(entry.id.clone()),
                    name: entry.function.clone(),
                });
            }
            if entry.replacement.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(entry.id.clone()),
                    field: "replacement",
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Resolve entries into a [`PatchBatch`], joining workspace-relative
    /// paths against `workspace_root`.
    pub fn into_batch(self, workspace_root: &Path) -> PatchBatch {
        let workspace_relative = self.meta.workspace_relative;
        let mut batch = PatchBatch::new();
        for entry in self.patches {
            let file = if workspace_relative {
                workspace_root.join(&entry.file)
            } else {
                PathBuf::from(&entry.file)
            };
            batch.push(PatchRequest::new(file, entry.function, entry.replacement));
        }
        batch
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    InvalidFunctionName {
        patch_id: Option<String>,
        name: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch config contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::InvalidFunctionName { patch_id, name } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid function name '{name}'"),
                None => write!(f, "invalid function name '{name}'"),
            },
        }
    }
}
