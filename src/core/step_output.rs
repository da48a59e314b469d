//! Step outputs: publishes a run's results to a CI step output file
//! (`$GITHUB_OUTPUT`).
//!
//! Every run publishes `output` (the report text) and one entry per known
//! stack output. Secret outputs are announced with an `::add-mask::` workflow
//! command on stdout before their value is written.

use super::types::{OutputValue, RunResult};
use crate::error::{Result, StackError};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable naming the step output file.
pub const OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Key carrying the run report.
pub const REPORT_KEY: &str = "output";

/// One value to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub key: String,
    pub value: String,
    pub secret: bool,
}

/// Output file to write: the explicit path, else `$GITHUB_OUTPUT`.
pub fn output_target(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(OUTPUT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Strings publish bare, other JSON values as JSON text.
fn publish_value(value: &OutputValue) -> String {
    match &value.value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The values a run publishes, report first. Outputs still unknown (preview)
/// are left out.
pub fn step_outputs(result: &RunResult) -> Vec<StepOutput> {
    let mut outputs = vec![StepOutput {
        key: REPORT_KEY.to_string(),
        value: result.report.join("\n"),
        secret: false,
    }];
    outputs.extend(
        result
            .outputs
            .iter()
            .filter(|(_, v)| v.known)
            .map(|(k, v)| StepOutput {
                key: k.clone(),
                value: publish_value(v),
                secret: v.secret,
            }),
    );
    outputs
}

/// Workflow command that masks `value` in the CI log.
pub fn mask_command(value: &str) -> String {
    format!("::add-mask::{}", value)
}

/// One `key<<DELIMITER` entry. The delimiter is random; a key or value that
/// contains it is rejected.
pub fn format_entry(key: &str, value: &str) -> Result<String> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    if key.contains(&delimiter) || value.contains(&delimiter) {
        return Err(StackError::Validation(format!(
            "step output '{}' contains the delimiter {}",
            key, delimiter
        )));
    }
    Ok(format!("{key}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// Append every entry to `path`, creating the file if needed.
pub fn append_outputs(path: &Path, outputs: &[StepOutput]) -> Result<()> {
    let mut text = String::new();
    for output in outputs {
        text.push_str(&format_entry(&output.key, &output.value)?);
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StackError::io(format!("cannot open step output file {}", path.display()), e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| StackError::io(format!("cannot write step output file {}", path.display()), e))?;
    tracing::debug!(path = %path.display(), count = outputs.len(), "step outputs written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Command;
    use indexmap::IndexMap;
    use std::time::Duration;

    fn result() -> RunResult {
        let secret = OutputValue {
            secret: true,
            ..OutputValue::new(serde_json::json!("hunter2"))
        };
        RunResult {
            project: "fixtures".to_string(),
            stack: "dev".to_string(),
            command: Command::Up,
            run_id: "r-1".to_string(),
            resources: Vec::new(),
            outputs: IndexMap::from([
                ("pet-name".to_string(), OutputValue::new(serde_json::json!("keen-otter"))),
                ("count".to_string(), OutputValue::new(serde_json::json!(3))),
                ("token".to_string(), secret),
                ("later".to_string(), OutputValue::unknown()),
            ]),
            report: vec!["+ pet created".to_string(), "done".to_string()],
            total_duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_step_outputs() {
        let outputs = step_outputs(&result());
        let keys: Vec<&str> = outputs.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["output", "pet-name", "count", "token"]);
        assert_eq!(outputs[0].value, "+ pet created\ndone");
        assert_eq!(outputs[1].value, "keen-otter");
        assert_eq!(outputs[2].value, "3");
        assert!(outputs[3].secret);
        assert_eq!(outputs[3].value, "hunter2");
        assert!(!outputs[1].secret);
    }

    #[test]
    fn test_format_entry() {
        let entry = format_entry("name", "line one\nline two").unwrap();
        let lines: Vec<&str> = entry.lines().collect();
        assert_eq!(lines.len(), 4);
        let delimiter = lines[0].strip_prefix("name<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(&lines[1..], &["line one", "line two", delimiter]);
        assert!(entry.ends_with('\n'));
    }

    #[test]
    fn test_mask_command() {
        assert_eq!(mask_command("hunter2"), "::add-mask::hunter2");
    }

    #[test]
    fn test_append_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        append_outputs(&path, &step_outputs(&result())).unwrap();
        append_outputs(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("output<<ghadelimiter_"));
        assert!(text.contains("\nkeen-otter\n"));
        assert!(text.contains("token<<ghadelimiter_"));
        assert!(!text.contains("later<<"));
        assert!(append_outputs(&dir.path().join("no/such/dir.txt"), &[]).is_err());
    }

    #[test]
    fn test_explicit_target_wins() {
        let p = Path::new("/tmp/outputs.txt");
        assert_eq!(output_target(Some(p)), Some(p.to_path_buf()));
    }
}
