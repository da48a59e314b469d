//! Executor: runs stack operations.
//!
//! up / preview: [refresh] → stack select → config layers → context → fixture → state → events
//! refresh:      state → checksum verify → provider read → state
//! destroy:      state → provider delete (reverse order) → empty state
//! output:       state → outputs

use super::config::ConfigStore;
use super::context::{Context, RunRecord};
use super::state;
use super::types::*;
use crate::error::{Result, StackError};
use crate::fixtures::{self, Fixture};
use crate::provenance::eventlog;
use crate::resources::Provider;
use indexmap::IndexMap;
use std::path::Path;
use std::time::Instant;

/// Inputs shared by every stack operation.
pub struct RunOptions<'a> {
    pub settings: &'a StackSettings,
    pub state_dir: &'a Path,
    pub provider: &'a dyn Provider,
    /// Fixture overriding `settings.program`
    pub fixture: Option<&'a str>,
    /// Highest-precedence config layer
    pub config_map: Option<&'a IndexMap<String, ConfigValue>>,
    /// Overlay `STACKRUN_CONFIG` from the environment
    pub use_env_config: bool,
    /// Refresh recorded state before `up` / `preview`
    pub refresh: bool,
    /// Create the stack when it does not exist yet
    pub upsert: bool,
    /// Let refresh re-save a state whose checksum does not match
    pub force: bool,
}

/// Writes provenance events when the policy asks for them. Log failures are
/// reported but never fail the run.
struct EventSink<'a> {
    state_dir: &'a Path,
    stack: &'a str,
    enabled: bool,
}

impl<'a> EventSink<'a> {
    fn new(opts: &'a RunOptions<'a>) -> Self {
        Self {
            state_dir: opts.state_dir,
            stack: &opts.settings.stack,
            enabled: opts.settings.policy.event_log,
        }
    }

    fn emit(&self, event: ProvenanceEvent) {
        if !self.enabled {
            return;
        }
        if let Err(e) = eventlog::append_event(self.state_dir, self.stack, event) {
            tracing::warn!(stack = self.stack, error = %e, "cannot append provenance event");
        }
    }

    fn emit_all(&self, events: Vec<ProvenanceEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Dispatch one command. With `opts.refresh`, `up` and `preview` first
/// refresh any recorded state and their report starts with its lines.
pub fn execute(command: Command, opts: &RunOptions, remove: bool) -> Result<RunResult> {
    let refreshed = match command {
        Command::Up | Command::Preview if opts.refresh => refresh_before(opts)?,
        _ => Vec::new(),
    };
    let mut result = match command {
        Command::Up => up(opts),
        Command::Preview => preview(opts),
        Command::Refresh => refresh(opts),
        Command::Destroy => destroy(opts, remove),
        Command::Output => output(opts),
    }?;
    if !refreshed.is_empty() {
        let mut report = refreshed;
        report.append(&mut result.report);
        result.report = report;
    }
    Ok(result)
}

/// Refresh ahead of another command. A stack without state has nothing to
/// refresh. Only the per-resource lines are kept.
fn refresh_before(opts: &RunOptions) -> Result<Vec<String>> {
    if state::load_state(opts.state_dir, &opts.settings.stack)?.is_none() {
        tracing::debug!(stack = %opts.settings.stack, "no state to refresh");
        return Ok(Vec::new());
    }
    let result = refresh(opts)?;
    Ok(result
        .report
        .into_iter()
        .take_while(|line| !line.is_empty())
        .collect())
}

/// Select the stack, creating it only when `upsert` is set.
pub fn select_stack(opts: &RunOptions) -> Result<()> {
    let stack = &opts.settings.stack;
    if state::stack_exists(opts.state_dir, stack)? {
        return Ok(());
    }
    if !opts.upsert {
        return Err(StackError::StackNotFound(stack.clone()));
    }
    let dir = state::create_stack(opts.state_dir, stack)?;
    tracing::info!(%stack, dir = %dir.display(), "stack created");
    Ok(())
}

/// Pick the fixture: explicit override first, then the settings `program`.
pub fn resolve_fixture(settings: &StackSettings, name: Option<&str>) -> Result<&'static Fixture> {
    let name = name.or(settings.program.as_deref()).ok_or_else(|| {
        StackError::Validation(
            "no program to run: pass --fixture or set `program` in the settings file".to_string(),
        )
    })?;
    fixtures::find(name).ok_or_else(|| StackError::UnknownFixture(name.to_string()))
}

/// Layer configuration: settings, then environment, then the config map.
pub fn build_config(opts: &RunOptions) -> Result<ConfigStore> {
    let mut store = ConfigStore::from_settings(opts.settings);
    if opts.use_env_config {
        store.overlay_env()?;
    }
    if let Some(map) = opts.config_map {
        store.set_all(map);
    }
    Ok(store)
}

/// Run the fixture and persist what it created.
pub fn up(opts: &RunOptions) -> Result<RunResult> {
    run_program(opts, Command::Up)
}

/// Run the fixture against a dry-run context; nothing is created or saved.
pub fn preview(opts: &RunOptions) -> Result<RunResult> {
    run_program(opts, Command::Preview)
}

fn run_program(opts: &RunOptions, command: Command) -> Result<RunResult> {
    let start = Instant::now();
    let settings = opts.settings;
    let dry_run = command == Command::Preview;
    let fixture = resolve_fixture(settings, opts.fixture)?;
    select_stack(opts)?;
    let config = build_config(opts)?;
    let secrets: Vec<String> = config.secret_values().into_iter().map(String::from).collect();

    let run_id = eventlog::generate_run_id();
    let sink = EventSink::new(opts);
    sink.emit(ProvenanceEvent::RunStarted {
        stack: settings.stack.clone(),
        run_id: run_id.clone(),
        command,
        stackrun_version: env!("CARGO_PKG_VERSION").to_string(),
    });
    tracing::info!(
        project = %settings.project,
        stack = %settings.stack,
        fixture = fixture.name,
        provider = opts.provider.name(),
        %command,
        "running fixture"
    );

    let mut ctx = Context::new(
        &settings.project,
        &settings.stack,
        config,
        opts.provider,
        dry_run,
    );
    let outcome = (fixture.program)(&mut ctx);
    let record = ctx.finish();
    sink.emit_all(record.events.clone());

    if let Err(e) = outcome {
        sink.emit(ProvenanceEvent::RunFailed {
            stack: settings.stack.clone(),
            run_id,
            error: e.to_string(),
        });
        return Err(e);
    }

    if !dry_run && settings.policy.state_file {
        let mut st = state::new_state(&settings.project, &settings.stack);
        st.last_run = Some(run_id.clone());
        st.resources = record.resources.clone();
        st.outputs = record.outputs.clone();
        state::save_state(opts.state_dir, &mut st)?;
    }

    let mut report = record.report.clone();
    report.extend(outputs_report(&record.outputs));
    let report = mask_secrets(report, &secrets);

    finish(opts, &sink, command, run_id, &record, report, start)
}

/// Re-read every recorded resource through the provider and re-save. A
/// state whose checksum does not match its content is only re-saved with
/// `opts.force`; otherwise the refresh fails before reading anything.
pub fn refresh(opts: &RunOptions) -> Result<RunResult> {
    let start = Instant::now();
    let settings = opts.settings;
    let mut st = state::require_state(opts.state_dir, &settings.stack)?;
    let run_id = eventlog::generate_run_id();
    let sink = EventSink::new(opts);
    sink.emit(ProvenanceEvent::RunStarted {
        stack: settings.stack.clone(),
        run_id: run_id.clone(),
        command: Command::Refresh,
        stackrun_version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let mut report = Vec::new();
    if let Some(actual) = state::verify_checksum(&st) {
        tracing::warn!(stack = %settings.stack, "state checksum mismatch");
        report.push(format!(
            "! state checksum mismatch: recorded {}, actual {}",
            st.checksum, actual
        ));
        sink.emit(ProvenanceEvent::StateTampered {
            stack: settings.stack.clone(),
            expected_checksum: st.checksum.clone(),
            actual_checksum: actual.clone(),
        });
        if !opts.force {
            let err = StackError::StateTampered {
                stack: settings.stack.clone(),
                recorded: st.checksum.clone(),
                actual,
            };
            sink.emit(ProvenanceEvent::RunFailed {
                stack: settings.stack.clone(),
                run_id,
                error: err.to_string(),
            });
            return Err(err);
        }
        report.push("! tampered state accepted (--force)".to_string());
    }

    for resource in st.resources.values_mut() {
        match opts.provider.read(resource) {
            Ok(read) => {
                resource.id = read.id;
                resource.outputs = read.outputs;
                sink.emit(ProvenanceEvent::ResourceRefreshed {
                    stack: settings.stack.clone(),
                    urn: resource.urn.clone(),
                });
                report.push(format!(
                    "~ {} {} refreshed",
                    resource.resource_type, resource.name
                ));
            }
            Err(message) => {
                return Err(fail_resource(&sink, &settings.stack, &run_id, &resource.urn, message));
            }
        }
    }

    st.last_run = Some(run_id.clone());
    st.updated_at = eventlog::now_iso8601();
    if settings.policy.state_file {
        state::save_state(opts.state_dir, &mut st)?;
    }

    report.extend(outputs_report(&st.outputs));
    let record = RunRecord {
        resources: st.resources,
        outputs: st.outputs,
        ..RunRecord::default()
    };
    finish(opts, &sink, Command::Refresh, run_id, &record, report, start)
}

/// Delete recorded resources in reverse registration order and clear the
/// stack. With `remove`, the stack's state directory goes too.
pub fn destroy(opts: &RunOptions, remove: bool) -> Result<RunResult> {
    let start = Instant::now();
    let settings = opts.settings;
    let run_id = eventlog::generate_run_id();
    let sink = EventSink::new(opts);
    sink.emit(ProvenanceEvent::RunStarted {
        stack: settings.stack.clone(),
        run_id: run_id.clone(),
        command: Command::Destroy,
        stackrun_version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let mut report = Vec::new();
    let mut deleted = IndexMap::new();
    if let Some(mut st) = state::load_state(opts.state_dir, &settings.stack)? {
        for (urn, resource) in st.resources.iter().rev() {
            if let Err(message) = opts.provider.delete(resource) {
                return Err(fail_resource(&sink, &settings.stack, &run_id, urn, message));
            }
            sink.emit(ProvenanceEvent::ResourceDeleted {
                stack: settings.stack.clone(),
                urn: urn.clone(),
            });
            report.push(format!(
                "- {} {} deleted",
                resource.resource_type, resource.name
            ));
            deleted.insert(urn.clone(), resource.clone());
        }
        st.resources.clear();
        st.outputs.clear();
        st.last_run = Some(run_id.clone());
        st.updated_at = eventlog::now_iso8601();
        if settings.policy.state_file && !remove {
            state::save_state(opts.state_dir, &mut st)?;
        }
    } else {
        report.push("no resources to destroy".to_string());
    }

    let record = RunRecord {
        resources: deleted,
        ..RunRecord::default()
    };
    let result = finish(opts, &sink, Command::Destroy, run_id, &record, report, start)?;

    if remove && state::remove_stack(opts.state_dir, &settings.stack)? {
        tracing::info!(stack = %settings.stack, "stack removed");
    }
    Ok(result)
}

/// Read the stack's exported outputs.
pub fn output(opts: &RunOptions) -> Result<RunResult> {
    let start = Instant::now();
    let settings = opts.settings;
    let st = state::require_state(opts.state_dir, &settings.stack)?;
    Ok(RunResult {
        project: st.project,
        stack: st.stack,
        command: Command::Output,
        run_id: st.last_run.unwrap_or_default(),
        resources: st.resources.into_values().collect(),
        report: outputs_report(&st.outputs),
        outputs: st.outputs,
        total_duration: start.elapsed(),
    })
}

fn fail_resource(
    sink: &EventSink,
    stack: &str,
    run_id: &str,
    urn: &str,
    message: String,
) -> StackError {
    sink.emit(ProvenanceEvent::ResourceFailed {
        stack: stack.to_string(),
        urn: urn.to_string(),
        error: message.clone(),
    });
    let err = StackError::Provisioning {
        urn: urn.to_string(),
        message,
    };
    sink.emit(ProvenanceEvent::RunFailed {
        stack: stack.to_string(),
        run_id: run_id.to_string(),
        error: err.to_string(),
    });
    err
}

fn finish(
    opts: &RunOptions,
    sink: &EventSink,
    command: Command,
    run_id: String,
    record: &RunRecord,
    report: Vec<String>,
    start: Instant,
) -> Result<RunResult> {
    let total = start.elapsed();
    sink.emit(ProvenanceEvent::RunCompleted {
        stack: opts.settings.stack.clone(),
        run_id: run_id.clone(),
        command,
        resources: record.resources.len() as u32,
        outputs: record.outputs.len() as u32,
        total_seconds: total.as_secs_f64(),
    });
    Ok(RunResult {
        project: opts.settings.project.clone(),
        stack: opts.settings.stack.clone(),
        command,
        run_id,
        resources: record.resources.values().cloned().collect(),
        outputs: record.outputs.clone(),
        report,
        total_duration: total,
    })
}

/// `Outputs:` block for the run report; secrets masked.
pub fn outputs_report(outputs: &IndexMap<String, OutputValue>) -> Vec<String> {
    if outputs.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Outputs:".to_string()];
    for (key, value) in outputs {
        lines.push(format!("    {}: {}", key, value.render(false)));
    }
    lines
}

/// Replace secret config values with `[secret]`. Only whole values are
/// masked: an occurrence touching an alphanumeric character on either side
/// is part of a longer word and stays as is.
pub fn mask_secrets(lines: Vec<String>, secrets: &[String]) -> Vec<String> {
    if secrets.is_empty() {
        return lines;
    }
    lines
        .into_iter()
        .map(|line| {
            secrets
                .iter()
                .filter(|s| !s.is_empty())
                .fold(line, |acc, s| mask_value(&acc, s))
        })
        .collect()
}

fn mask_value(line: &str, secret: &str) -> String {
    let mut masked = String::with_capacity(line.len());
    let mut last = 0;
    for (start, _) in line.match_indices(secret) {
        let end = start + secret.len();
        let before = line[..start].chars().next_back();
        let after = line[end..].chars().next();
        if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric) {
            continue;
        }
        masked.push_str(&line[last..start]);
        masked.push_str("[secret]");
        last = end;
    }
    masked.push_str(&line[last..]);
    masked
}
