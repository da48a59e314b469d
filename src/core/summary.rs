//! Run summary: renders a run report as a Markdown/HTML block for a CI
//! step summary file (`$GITHUB_STEP_SUMMARY`).

use crate::error::{Result, StackError};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Step summaries are capped at 1 MiB; stay below it to leave room for the
/// heading and markup.
pub const MAX_SUMMARY_SIZE_BYTES: usize = 1_000_000;

/// Environment variable naming the step summary file.
pub const SUMMARY_ENV: &str = "GITHUB_STEP_SUMMARY";

fn ansi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\x1B(?:[@-Z\\\-_]|\[[0-?]*[ -/]*[@-~])").expect("valid ANSI regex")
    })
}

/// Remove ANSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Replace a single leading space on each line with `&nbsp;` so indentation
/// survives HTML rendering.
pub fn protect_indentation(text: &str) -> String {
    text.split('\n')
        .map(|line| match line.strip_prefix(' ') {
            Some(rest) => format!("&nbsp;{}", rest),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim `text` to at most `max` bytes, cutting on a char boundary. With
/// `from_front`, the start is dropped and the tail kept. Returns the text
/// and whether anything was cut.
pub fn trim_to_size(text: &str, max: usize, from_front: bool) -> (String, bool) {
    if text.len() <= max {
        return (text.to_string(), false);
    }
    let excess = text.len() - max;
    let trimmed = if from_front {
        let mut start = excess;
        while !text.is_char_boundary(start) {
            start += 1;
        }
        &text[start..]
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    };
    (trimmed.to_string(), true)
}

/// Render the summary block for one run.
pub fn render_summary(project: &str, stack: &str, output: &str, always_include_summary: bool) -> String {
    let cleaned = protect_indentation(&strip_ansi(output));
    let (message, trimmed) = trim_to_size(&cleaned, MAX_SUMMARY_SIZE_BYTES, always_include_summary);

    let mut heading = format!("Stackrun {}/{} results", project, stack);
    if trimmed {
        if always_include_summary {
            heading.push_str(" :warning: **Warn**: The output was too long and trimmed from the front.");
        } else {
            heading.push_str(" :warning: **Warn**: The output was too long and trimmed.");
        }
    }

    format!(
        "<h1>{}</h1>\n<pre lang=\"diff\"><code>{}</code></pre>\n",
        heading, message
    )
}

/// Summary file to write: the explicit path, else `$GITHUB_STEP_SUMMARY`
/// when `comment_on_summary` is set. Without either, nothing is written.
pub fn summary_target(explicit: Option<&Path>, comment_on_summary: bool) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        if !comment_on_summary {
            return None;
        }
        std::env::var_os(SUMMARY_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Append a rendered summary to `path`, creating the file if needed.
pub fn append_summary(path: &Path, rendered: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StackError::io(format!("cannot open summary file {}", path.display()), e))?;
    file.write_all(rendered.as_bytes())
        .map_err(|e| StackError::io(format!("cannot write summary file {}", path.display()), e))?;
    tracing::debug!(path = %path.display(), bytes = rendered.len(), "summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_output() {
        assert_eq!(
            render_summary("myFirstProject", "staging", "", false),
            "<h1>Stackrun myFirstProject/staging results</h1>\n<pre lang=\"diff\"><code></code></pre>\n"
        );
    }

    #[test]
    fn test_ansi_stripped() {
        assert_eq!(strip_ansi("\x1b[30mblack\x1b[37mwhite"), "blackwhite");
        assert_eq!(strip_ansi("\x1b[1;32m+\x1b[0m pet"), "+ pet");
        let rendered = render_summary("p", "s", "\x1b[30mblack\x1b[37mwhite", false);
        assert!(rendered.contains("<code>blackwhite</code>"));
    }

    #[test]
    fn test_leading_space_protected() {
        assert_eq!(
            protect_indentation(" a\n  b\nc\n"),
            "&nbsp;a\n&nbsp; b\nc\n"
        );
    }

    #[test]
    fn test_trim_from_end() {
        let message = "a".repeat(MAX_SUMMARY_SIZE_BYTES + 1);
        let rendered = render_summary("p", "s", &message, false);
        assert!(rendered.len() < 1_048_576);
        assert!(rendered.contains("The output was too long and trimmed."));
        assert!(!rendered.contains("trimmed from the front"));
    }

    #[test]
    fn test_trim_from_front_keeps_tail() {
        let tail = "this is at the end and should be in the output";
        let message = format!("😄begin{}{}", "a".repeat(MAX_SUMMARY_SIZE_BYTES), tail);
        let rendered = render_summary("p", "s", &message, true);
        assert!(rendered.contains(tail));
        assert!(!rendered.contains("begin"));
        assert!(rendered.contains("trimmed from the front."));
    }

    #[test]
    fn test_trim_respects_char_boundaries() {
        let (s, cut) = trim_to_size("ééé", 3, false);
        assert!(cut);
        assert_eq!(s, "é");
        let (s, cut) = trim_to_size("ééé", 3, true);
        assert!(cut);
        assert_eq!(s, "é");
        let (s, cut) = trim_to_size("abc", 3, true);
        assert!(!cut);
        assert_eq!(s, "abc");
    }

    #[test]
    fn test_append_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        std::fs::write(&path, "").unwrap();
        append_summary(&path, "one\n").unwrap();
        append_summary(&path, "two\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_append_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.md");
        append_summary(&path, "x").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
        assert!(append_summary(&dir.path().join("no/such/dir.md"), "x").is_err());
    }

    #[test]
    fn test_explicit_target_wins() {
        let p = Path::new("/tmp/explicit.md");
        assert_eq!(summary_target(Some(p), false), Some(p.to_path_buf()));
        assert_eq!(summary_target(Some(p), true), Some(p.to_path_buf()));
    }

    #[test]
    fn test_environment_summary_needs_comment_flag() {
        assert_eq!(summary_target(None, false), None);
    }
}
