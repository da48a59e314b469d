//! Settings parsing and validation.
//!
//! Parses stackrun.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - Project and stack names must be present and well-formed
//! - Config keys carry at most one namespace separator
//! - `program`, when set, names a known fixture

use super::types::*;
use crate::error::{Result, StackError};
use crate::fixtures;
use indexmap::IndexMap;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a stackrun.yaml file from disk.
pub fn parse_settings_file(path: &Path) -> Result<StackSettings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| StackError::io(format!("failed to read {}", path.display()), e))?;
    parse_settings(&content)
}

/// Parse stackrun.yaml from a string.
pub fn parse_settings(yaml: &str) -> Result<StackSettings> {
    serde_yaml_ng::from_str(yaml).map_err(|e| StackError::Parse(format!("YAML: {}", e)))
}

/// Parse a config map document: a YAML mapping of keys to values, the same
/// shape as the settings `config` block. Blank input yields an empty map.
pub fn parse_config_map(yaml: &str) -> Result<IndexMap<String, ConfigValue>> {
    if yaml.trim().is_empty() {
        return Ok(IndexMap::new());
    }
    let map = serde_yaml_ng::from_str(yaml)
        .map_err(|e| StackError::Parse(format!("config map: {}", e)))?;
    check_config_map(&map, "config map")?;
    Ok(map)
}

/// True for names made only of ASCII alphanumerics, `-`, `_`, and `.`,
/// not starting with `.` (names become directories under the state dir).
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Validate parsed settings. Returns a list of errors (empty = valid).
pub fn validate_settings(settings: &StackSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if settings.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", settings.version),
        });
    }

    if settings.project.is_empty() {
        errors.push(ValidationError {
            message: "project must not be empty".to_string(),
        });
    } else if !is_valid_name(&settings.project) {
        errors.push(ValidationError {
            message: format!("project name '{}' contains invalid characters", settings.project),
        });
    }

    if !is_valid_name(&settings.stack) {
        errors.push(ValidationError {
            message: format!(
                "stack name '{}' must use only [A-Za-z0-9_.-] and not start with '.'",
                settings.stack
            ),
        });
    }

    for key in settings.config.keys() {
        if let Some(message) = check_config_key(key) {
            errors.push(ValidationError { message });
        }
    }

    if let Some(ref program) = settings.program {
        if fixtures::find(program).is_none() {
            errors.push(ValidationError {
                message: format!(
                    "program '{}' is not a known fixture (known: {})",
                    program,
                    fixtures::names().join(", ")
                ),
            });
        }
    }

    errors
}

/// Check one config key; returns a message when it is malformed.
pub fn check_config_key(key: &str) -> Option<String> {
    let parts: Vec<&str> = key.split(':').collect();
    match parts.as_slice() {
        [bare] if !bare.is_empty() => None,
        [ns, name] if !ns.is_empty() && !name.is_empty() => None,
        _ => Some(format!(
            "config key '{}' must be 'key' or 'namespace:key'",
            key
        )),
    }
}

/// Reject the first malformed key of a config layer read from `source`.
pub fn check_config_map(map: &IndexMap<String, ConfigValue>, source: &str) -> Result<()> {
    match map.keys().find(|key| check_config_key(key).is_some()) {
        Some(key) => Err(StackError::InvalidConfig {
            key: key.clone(),
            reason: format!("{} keys must be 'key' or 'namespace:key'", source),
        }),
        None => Ok(()),
    }
}
