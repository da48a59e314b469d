//! Stack state management: load, save (atomic), path derivation, checksums.

use super::types::StackState;
use crate::error::{Result, StackError};
use crate::provenance::{eventlog, hasher};
use std::path::{Component, Path, PathBuf};

/// Derive the state file path for a stack within the state directory.
pub fn state_file_path(state_dir: &Path, stack: &str) -> PathBuf {
    state_dir.join(stack).join("state.yaml")
}

/// Load a stack's state. Returns None if the file doesn't exist.
pub fn load_state(state_dir: &Path, stack: &str) -> Result<Option<StackState>> {
    let path = state_file_path(state_dir, stack);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| StackError::io(format!("cannot read {}", path.display()), e))?;
    let state: StackState = serde_yaml_ng::from_str(&content)
        .map_err(|e| StackError::Parse(format!("invalid state file {}: {}", path.display(), e)))?;
    Ok(Some(state))
}

/// Load a stack's state, failing when there is none.
pub fn require_state(state_dir: &Path, stack: &str) -> Result<StackState> {
    load_state(state_dir, stack)?.ok_or_else(|| StackError::NoState(stack.to_string()))
}

/// Save state atomically (write to temp, then rename). Refreshes the
/// checksum before writing.
pub fn save_state(state_dir: &Path, state: &mut StackState) -> Result<()> {
    let path = state_file_path(state_dir, &state.stack);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StackError::io(format!("cannot create dir {}", parent.display()), e))?;
    }

    state.checksum = compute_checksum(state);
    let yaml = serde_yaml_ng::to_string(state)
        .map_err(|e| StackError::Parse(format!("serialize error: {}", e)))?;

    let tmp_path = path.with_extension("yaml.tmp");
    std::fs::write(&tmp_path, &yaml)
        .map_err(|e| StackError::io(format!("cannot write {}", tmp_path.display()), e))?;
    std::fs::rename(&tmp_path, &path).map_err(|e| {
        StackError::io(
            format!("cannot rename {} → {}", tmp_path.display(), path.display()),
            e,
        )
    })?;

    Ok(())
}

/// A stack's directory under `state_dir`. The name must be a single plain
/// path segment not starting with `.`, so the result is always a direct
/// child of `state_dir`.
pub fn stack_dir(state_dir: &Path, stack: &str) -> Result<PathBuf> {
    let mut components = Path::new(stack).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if !stack.starts_with('.') && name.to_str() == Some(stack) => {
            Ok(state_dir.join(stack))
        }
        _ => Err(StackError::Validation(format!(
            "stack name '{}' does not name a directory inside {}",
            stack,
            state_dir.display()
        ))),
    }
}

/// True when the stack has been created (its directory exists).
pub fn stack_exists(state_dir: &Path, stack: &str) -> Result<bool> {
    Ok(stack_dir(state_dir, stack)?.is_dir())
}

/// Create the stack's directory; a no-op when it already exists.
pub fn create_stack(state_dir: &Path, stack: &str) -> Result<PathBuf> {
    let dir = stack_dir(state_dir, stack)?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| StackError::io(format!("cannot create dir {}", dir.display()), e))?;
    Ok(dir)
}

/// Remove a stack's state directory (state file and event log).
pub fn remove_stack(state_dir: &Path, stack: &str) -> Result<bool> {
    let dir = stack_dir(state_dir, stack)?;
    if !dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(&dir)
        .map_err(|e| StackError::io(format!("cannot remove {}", dir.display()), e))?;
    Ok(true)
}

/// Create a new empty state for a stack.
pub fn new_state(project: &str, stack: &str) -> StackState {
    StackState {
        schema: "1.0".to_string(),
        project: project.to_string(),
        stack: stack.to_string(),
        updated_at: eventlog::now_iso8601(),
        generator: format!("stackrun {}", env!("CARGO_PKG_VERSION")),
        last_run: None,
        resources: indexmap::IndexMap::new(),
        outputs: indexmap::IndexMap::new(),
        checksum: String::new(),
    }
}

/// BLAKE3 over the serialized resources and outputs.
pub fn compute_checksum(state: &StackState) -> String {
    let resources = serde_json::to_string(&state.resources).unwrap_or_default();
    let outputs = serde_json::to_string(&state.outputs).unwrap_or_default();
    hasher::composite_hash(&[&state.project, &state.stack, &resources, &outputs])
}

/// When the recorded checksum disagrees with the content, returns the
/// recomputed one. States written without a checksum are not flagged.
pub fn verify_checksum(state: &StackState) -> Option<String> {
    if state.checksum.is_empty() {
        return None;
    }
    let actual = compute_checksum(state);
    (actual != state.checksum).then_some(actual)
}

/// Names of stacks with a state file under `state_dir`, sorted.
pub fn list_stacks(state_dir: &Path) -> Result<Vec<String>> {
    if !state_dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(state_dir)
        .map_err(|e| StackError::io(format!("cannot read state dir {}", state_dir.display()), e))?;
    let mut stacks: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| state_file_path(state_dir, name).exists())
        .collect();
    stacks.sort();
    Ok(stacks)
}
