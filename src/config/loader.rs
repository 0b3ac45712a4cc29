use crate::config::schema::{PatchConfig, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read patch config from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse patch config TOML{}: {source}", display_path(.path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("invalid patch config{}: {source}", display_path(.path))]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

/// Parse and validate a patch config from TOML text.
pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

/// Read, parse and validate a patch config file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
[meta]
name = "runtime-adaptations"
workspace_relative = true

[[patches]]
id = "patch-device-name"
file = "pkg/devices.py"
function = "device_name"
replacement = '''
def device_name(device):
    return "generic"
'''
"#;

    #[test]
    fn loads_valid_config() {
        let config = load_from_str(VALID).unwrap();
        assert_eq!(config.meta.name, "runtime-adaptations");
        assert!(config.meta.workspace_relative);
        assert_eq!(config.patches.len(), 1);
        assert_eq!(config.patches[0].function, "device_name");
        assert!(config.patches[0].replacement.contains("def device_name("));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = load_from_str("[[patches]\nid = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn rejects_empty_config() {
        let err = load_from_str("[meta]\nname = \"empty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn load_from_path_attaches_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[meta]\nname = \"empty\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        match err {
            ConfigError::Validation { path: Some(p), .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
