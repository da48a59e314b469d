//! CLI subcommands: up, preview, refresh, destroy, output, stacks, init,
//! validate, fixtures, config, schema, completions.

use crate::core::config::{self, ConfigStore};
use crate::core::executor::{self, RunOptions};
use crate::core::types::{Command, ConfigValue, OutputValue, RunResult, StackSettings};
use crate::core::{parser, state, step_output, summary};
use crate::error::{Result, StackError};
use crate::fixtures;
use crate::resources::RandomProvider;
use clap::{Args, CommandFactory, Parser, Subcommand};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "stackrun",
    version,
    about = "Run infrastructure fixture stacks: random provider, BLAKE3 state, provenance log"
)]
pub struct Cli {
    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which stack to operate on.
#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// Path to stackrun.yaml
    #[arg(short, long, default_value = "stackrun.yaml")]
    pub file: PathBuf,

    /// Override the stack named in the settings file
    #[arg(short, long)]
    pub stack: Option<String>,

    /// State directory
    #[arg(long, default_value = "state")]
    pub state_dir: PathBuf,
}

/// Where to publish a run's results for CI.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Append a run summary here
    #[arg(long)]
    pub summary_file: Option<PathBuf>,

    /// Append a run summary to $GITHUB_STEP_SUMMARY
    #[arg(long)]
    pub comment_on_summary: bool,

    /// When the summary is too long, trim from the front so the end survives
    #[arg(long)]
    pub always_include_summary: bool,

    /// Write step outputs here (default: $GITHUB_OUTPUT when set)
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}

/// Arguments for commands that run a fixture program.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: StackArgs,

    /// Fixture to run instead of the settings `program`
    #[arg(long)]
    pub fixture: Option<String>,

    /// YAML mapping of extra config values (highest precedence)
    #[arg(long)]
    pub config_map: Option<String>,

    /// Seed the random provider for reproducible values
    #[arg(long)]
    pub seed: Option<u64>,

    /// Refresh recorded state before running
    #[arg(long)]
    pub refresh: bool,

    /// Create the stack if it does not exist
    #[arg(long)]
    pub upsert: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new stackrun project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Project name
        #[arg(long, default_value = "my-stack")]
        project: String,

        /// Fixture program to run
        #[arg(long, default_value = "pet-name")]
        program: String,
    },

    /// Validate stackrun.yaml without running anything
    Validate {
        /// Path to stackrun.yaml
        #[arg(short, long, default_value = "stackrun.yaml")]
        file: PathBuf,
    },

    /// List the available fixture programs
    Fixtures,

    /// Run the fixture and record the stack's resources and outputs
    #[command(alias = "update")]
    Up(RunArgs),

    /// Show what the fixture would create, without creating anything
    Preview(RunArgs),

    /// Re-read recorded resources and verify the state checksum
    Refresh {
        #[command(flatten)]
        target: StackArgs,

        /// Re-save a state whose checksum does not match its content
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Delete the stack's resources
    Destroy {
        #[command(flatten)]
        target: StackArgs,

        /// Also remove the stack's state directory
        #[arg(long)]
        remove: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Show stack outputs
    Output {
        #[command(flatten)]
        target: StackArgs,

        /// Single output to show
        key: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,

        /// Show secret values in plaintext
        #[arg(long)]
        show_secrets: bool,
    },

    /// List stacks with recorded state
    Stacks {
        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,
    },

    /// Read or write configuration in stackrun.yaml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the JSON schema of stackrun.yaml
    Schema,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Key, `name` or `namespace:name`
        key: String,
        value: String,

        /// Mark the value secret
        #[arg(long)]
        secret: bool,

        /// Path to stackrun.yaml
        #[arg(short, long, default_value = "stackrun.yaml")]
        file: PathBuf,
    },

    /// Print a configuration value (settings file, then STACKRUN_CONFIG)
    Get {
        key: String,

        /// Show a secret value in plaintext
        #[arg(long)]
        show_secrets: bool,

        /// Path to stackrun.yaml
        #[arg(short, long, default_value = "stackrun.yaml")]
        file: PathBuf,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init {
            path,
            project,
            program,
        } => cmd_init(&path, &project, &program),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Fixtures => cmd_fixtures(),
        Commands::Up(args) => cmd_run(Command::Up, &args),
        Commands::Preview(args) => cmd_run(Command::Preview, &args),
        Commands::Refresh {
            target,
            force,
            report,
        } => cmd_refresh(&target, force, &report),
        Commands::Destroy {
            target,
            remove,
            report,
        } => cmd_destroy(&target, remove, &report),
        Commands::Output {
            target,
            key,
            json,
            show_secrets,
        } => cmd_output(&target, key.as_deref(), json, show_secrets),
        Commands::Stacks { state_dir } => cmd_stacks(&state_dir),
        Commands::Config { action } => match action {
            ConfigAction::Set {
                key,
                value,
                secret,
                file,
            } => cmd_config_set(&file, &key, &value, secret),
            ConfigAction::Get {
                key,
                show_secrets,
                file,
            } => cmd_config_get(&file, &key, show_secrets),
        },
        Commands::Schema => cmd_schema(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "stackrun", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_init(path: &Path, project: &str, program: &str) -> Result<()> {
    let settings_path = path.join("stackrun.yaml");
    if settings_path.exists() {
        return Err(StackError::Validation(format!(
            "{} already exists",
            settings_path.display()
        )));
    }
    if !parser::is_valid_name(project) {
        return Err(StackError::Validation(format!(
            "project name '{}' contains invalid characters",
            project
        )));
    }
    if fixtures::find(program).is_none() {
        return Err(StackError::UnknownFixture(program.to_string()));
    }

    let state_dir = path.join("state");
    let stack_dir = state::create_stack(&state_dir, "dev")?;

    let template = format!(
        r#"version: "1.0"
project: {project}
stack: dev
description: "Managed by stackrun"
program: {program}

config: {{}}

policy:
  event_log: true
  state_file: true
"#
    );
    std::fs::write(&settings_path, template)
        .map_err(|e| StackError::io(format!("cannot write {}", settings_path.display()), e))?;

    println!("Initialized stackrun project at {}", path.display());
    println!("  Created: {}", settings_path.display());
    println!("  Created: {}/", stack_dir.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let settings = parse_and_validate(file, None)?;
    println!(
        "OK: {}/{} (program {}, {} config values)",
        settings.project,
        settings.stack,
        settings.program.as_deref().unwrap_or("<none>"),
        settings.config.len()
    );
    Ok(())
}

/// Parse a settings file, apply the stack override, and validate.
fn parse_and_validate(file: &Path, stack: Option<&str>) -> Result<StackSettings> {
    let mut settings = parser::parse_settings_file(file)?;
    if let Some(stack) = stack {
        settings.stack = stack.to_string();
    }
    let errors = parser::validate_settings(&settings);
    if errors.is_empty() {
        return Ok(settings);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(StackError::Validation(format!(
        "{} validation error(s)",
        errors.len()
    )))
}

fn load_target(target: &StackArgs) -> Result<StackSettings> {
    parse_and_validate(&target.file, target.stack.as_deref())
}

fn cmd_fixtures() -> Result<()> {
    for f in fixtures::all() {
        println!("{:<14} {}", f.name, f.description);
        if let Some(key) = f.requires {
            println!("{:<14}   requires config: {}", "", key);
        }
        if let Some(key) = f.exports {
            println!("{:<14}   exports: {}", "", key);
        }
    }
    Ok(())
}

fn cmd_run(command: Command, args: &RunArgs) -> Result<()> {
    let settings = load_target(&args.target)?;
    let config_map = args
        .config_map
        .as_deref()
        .map(parser::parse_config_map)
        .transpose()?;
    let provider = match args.seed {
        Some(seed) => RandomProvider::seeded(seed),
        None => RandomProvider::new(),
    };

    let opts = RunOptions {
        settings: &settings,
        state_dir: &args.target.state_dir,
        provider: &provider,
        fixture: args.fixture.as_deref(),
        config_map: config_map.as_ref(),
        use_env_config: true,
        refresh: args.refresh,
        upsert: args.upsert,
        force: false,
    };
    let result = executor::execute(command, &opts, false)?;
    print_result(&result);
    publish(&result, &args.report)
}

fn cmd_refresh(target: &StackArgs, force: bool, report: &ReportArgs) -> Result<()> {
    let settings = load_target(target)?;
    let provider = RandomProvider::new();
    let opts = RunOptions {
        force,
        ..stored_options(&settings, target, &provider)
    };
    let result = executor::refresh(&opts)?;
    print_result(&result);
    publish(&result, report)
}

fn cmd_destroy(target: &StackArgs, remove: bool, report: &ReportArgs) -> Result<()> {
    let settings = load_target(target)?;
    let provider = RandomProvider::new();
    let opts = stored_options(&settings, target, &provider);
    let result = executor::destroy(&opts, remove)?;
    print_result(&result);
    if remove {
        println!("Removed stack {}.", result.stack);
    }
    publish(&result, report)
}

/// Options for commands that only touch recorded state.
fn stored_options<'a>(
    settings: &'a StackSettings,
    target: &'a StackArgs,
    provider: &'a RandomProvider,
) -> RunOptions<'a> {
    RunOptions {
        settings,
        state_dir: &target.state_dir,
        provider,
        fixture: None,
        config_map: None,
        use_env_config: false,
        refresh: false,
        upsert: false,
        force: false,
    }
}

fn print_result(result: &RunResult) {
    println!(
        "{} {}/{} (run {})",
        result.command, result.project, result.stack, result.run_id
    );
    println!();
    for line in &result.report {
        println!("  {}", line);
    }
    println!();

    let n = result.resources.len();
    let secs = result.total_duration.as_secs_f64();
    match result.command {
        Command::Up => println!(
            "Up complete: {} created, {} outputs ({:.1}s).",
            n,
            result.outputs.len(),
            secs
        ),
        Command::Preview => println!("Preview: {} to create. No changes applied.", n),
        Command::Refresh => println!("Refresh complete: {} refreshed ({:.1}s).", n, secs),
        Command::Destroy => println!("Destroy complete: {} deleted ({:.1}s).", n, secs),
        Command::Output => {}
    }
}

/// Publish a finished run: step summary, then step outputs.
fn publish(result: &RunResult, args: &ReportArgs) -> Result<()> {
    write_summary(result, args)?;
    write_step_outputs(result, args)
}

fn write_summary(result: &RunResult, args: &ReportArgs) -> Result<()> {
    let Some(path) = summary::summary_target(args.summary_file.as_deref(), args.comment_on_summary)
    else {
        return Ok(());
    };
    let rendered = summary::render_summary(
        &result.project,
        &result.stack,
        &result.report.join("\n"),
        args.always_include_summary,
    );
    summary::append_summary(&path, &rendered)
}

fn write_step_outputs(result: &RunResult, args: &ReportArgs) -> Result<()> {
    let Some(path) = step_output::output_target(args.output_file.as_deref()) else {
        return Ok(());
    };
    let outputs = step_output::step_outputs(result);
    for output in outputs.iter().filter(|o| o.secret) {
        println!("{}", step_output::mask_command(&output.value));
    }
    step_output::append_outputs(&path, &outputs)
}

fn cmd_output(target: &StackArgs, key: Option<&str>, json: bool, show_secrets: bool) -> Result<()> {
    let settings = load_target(target)?;
    let provider = RandomProvider::new();
    let opts = stored_options(&settings, target, &provider);
    let result = executor::output(&opts)?;

    if let Some(key) = key {
        let value = result.outputs.get(key).ok_or_else(|| {
            StackError::Validation(format!(
                "current stack '{}' does not have output '{}'",
                result.stack, key
            ))
        })?;
        if json {
            println!("{}", to_json(&json_value(value, show_secrets))?);
        } else {
            println!("{}", plain_value(value, show_secrets));
        }
        return Ok(());
    }

    if json {
        let map: IndexMap<&str, serde_json::Value> = result
            .outputs
            .iter()
            .map(|(k, v)| (k.as_str(), json_value(v, show_secrets)))
            .collect();
        println!("{}", to_json(&map)?);
    } else if result.outputs.is_empty() {
        println!("No output values currently in stack {}.", result.stack);
    } else {
        println!("Current stack outputs ({}):", result.outputs.len());
        for (k, v) in &result.outputs {
            println!("    {}: {}", k, plain_value(v, show_secrets));
        }
    }
    Ok(())
}

fn cmd_stacks(state_dir: &Path) -> Result<()> {
    let stacks = state::list_stacks(state_dir)?;
    if stacks.is_empty() {
        println!("No state found. Run `stackrun up` first.");
        return Ok(());
    }
    for name in &stacks {
        let st = state::require_state(state_dir, name)?;
        let tampered = if state::verify_checksum(&st).is_some() {
            " [checksum mismatch]"
        } else {
            ""
        };
        println!(
            "{}: {}/{}, {} resources, {} outputs, updated {}{}",
            name,
            st.project,
            st.stack,
            st.resources.len(),
            st.outputs.len(),
            st.updated_at,
            tampered
        );
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| StackError::Parse(format!("JSON: {}", e)))
}

/// Output value for JSON: masked secrets become `"[secret]"`, unknowns `null`.
fn json_value(value: &OutputValue, show_secrets: bool) -> serde_json::Value {
    if !value.known {
        serde_json::Value::Null
    } else if value.secret && !show_secrets {
        serde_json::Value::String("[secret]".to_string())
    } else {
        value.value.clone()
    }
}

/// Output value for text: strings print bare.
fn plain_value(value: &OutputValue, show_secrets: bool) -> String {
    match &value.value {
        serde_json::Value::String(s) if value.known && (show_secrets || !value.secret) => s.clone(),
        _ => value.render(show_secrets),
    }
}

fn cmd_config_set(file: &Path, key: &str, value: &str, secret: bool) -> Result<()> {
    if let Some(message) = parser::check_config_key(key) {
        return Err(StackError::Validation(message));
    }
    let mut settings = parser::parse_settings_file(file)?;
    let entry = if secret {
        ConfigValue::secret(value)
    } else {
        ConfigValue::plain(value)
    };
    settings.config.insert(key.to_string(), entry);
    write_settings(file, &settings)?;
    println!(
        "Set {}{}",
        config::full_key(&settings.project, key),
        if secret { " (secret)" } else { "" }
    );
    Ok(())
}

fn cmd_config_get(file: &Path, key: &str, show_secrets: bool) -> Result<()> {
    let settings = parser::parse_settings_file(file)?;
    let mut store = ConfigStore::from_settings(&settings);
    store.overlay_env()?;
    let value = store.get(key).ok_or_else(|| StackError::MissingConfig {
        key: config::full_key(&settings.project, key),
    })?;
    if value.secret && !show_secrets {
        println!("[secret]");
    } else {
        println!("{}", value.value);
    }
    Ok(())
}

/// Rewrite the settings file atomically.
fn write_settings(file: &Path, settings: &StackSettings) -> Result<()> {
    let yaml = serde_yaml_ng::to_string(settings)
        .map_err(|e| StackError::Parse(format!("serialize error: {}", e)))?;
    let tmp = file.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml)
        .map_err(|e| StackError::io(format!("cannot write {}", tmp.display()), e))?;
    std::fs::rename(&tmp, file)
        .map_err(|e| StackError::io(format!("cannot rename {}", tmp.display()), e))
}

fn cmd_schema() -> Result<()> {
    let schema = schemars::schema_for!(StackSettings);
    println!("{}", to_json(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_settings_file(dir: &Path, program: &str) -> PathBuf {
        let file = dir.join("stackrun.yaml");
        std::fs::write(
            &file,
            format!(
                "version: \"1.0\"\nproject: fixtures\nstack: dev\nprogram: {}\n",
                program
            ),
        )
        .unwrap();
        file
    }

    fn run_args(dir: &Path, file: PathBuf) -> RunArgs {
        RunArgs {
            target: StackArgs {
                file,
                stack: None,
                state_dir: dir.join("state"),
            },
            fixture: None,
            config_map: None,
            seed: Some(7),
            refresh: false,
            upsert: true,
            report: ReportArgs {
                summary_file: Some(dir.join("summary.md")),
                output_file: Some(dir.join("output.txt")),
                ..ReportArgs::default()
            },
        }
    }

    #[test]
    fn test_init() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("proj");
        std::fs::create_dir_all(&sub).unwrap();
        cmd_init(&sub, "my-stack", "pet-name").unwrap();
        assert!(sub.join("state").join("dev").is_dir());
        let settings = parse_and_validate(&sub.join("stackrun.yaml"), None).unwrap();
        assert_eq!(settings.project, "my-stack");
        assert_eq!(settings.program.as_deref(), Some("pet-name"));
    }

    #[test]
    fn test_init_rejects_existing_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            cmd_init(dir.path(), "p", "ghost"),
            Err(StackError::UnknownFixture(_))
        ));
        assert!(cmd_init(dir.path(), "bad name", "pet-name").is_err());
        std::fs::write(dir.path().join("stackrun.yaml"), "exists").unwrap();
        assert!(cmd_init(dir.path(), "p", "pet-name").is_err());
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "pet-name");
        cmd_validate(&file).unwrap();

        std::fs::write(&file, "version: \"2.0\"\nproject: \"\"\n").unwrap();
        let err = cmd_validate(&file).unwrap_err();
        assert_eq!(err, StackError::Validation("2 validation error(s)".to_string()));
    }

    #[test]
    fn test_stack_override_validated() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "pet-name");
        let s = parse_and_validate(&file, Some("prod")).unwrap();
        assert_eq!(s.stack, "prod");
        assert!(parse_and_validate(&file, Some("no/slash")).is_err());
    }

    #[test]
    fn test_up_output_destroy() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "pet-name");
        let args = run_args(dir.path(), file);
        cmd_run(Command::Up, &args).unwrap();

        let st = state::load_state(&args.target.state_dir, "dev").unwrap().unwrap();
        assert!(st.outputs.contains_key("pet-name"));
        cmd_output(&args.target, Some("pet-name"), false, false).unwrap();
        cmd_output(&args.target, None, true, false).unwrap();
        assert!(cmd_output(&args.target, Some("ghost"), false, false).is_err());

        let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(summary.starts_with("<h1>Stackrun fixtures/dev results</h1>"));

        cmd_stacks(&args.target.state_dir).unwrap();
        cmd_refresh(&args.target, false, &args.report).unwrap();
        cmd_destroy(&args.target, true, &args.report).unwrap();
        assert!(state::load_state(&args.target.state_dir, "dev").unwrap().is_none());
    }

    #[test]
    fn test_dot_stack_cannot_escape_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let proj = dir.path().join("proj");
        std::fs::create_dir_all(&proj).unwrap();
        let file = write_settings_file(&proj, "pet-name");
        std::fs::write(proj.join("precious.txt"), "keep").unwrap();

        for stack in ["..", "."] {
            let target = StackArgs {
                file: file.clone(),
                stack: Some(stack.to_string()),
                state_dir: proj.join("state"),
            };
            assert!(cmd_destroy(&target, true, &ReportArgs::default()).is_err());
        }
        assert!(proj.join("precious.txt").exists());
        assert!(file.exists());
    }

    #[test]
    fn test_missing_stack_needs_upsert_or_init() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "pet-name");
        let mut args = run_args(dir.path(), file);
        args.upsert = false;
        assert_eq!(
            cmd_run(Command::Up, &args).unwrap_err(),
            StackError::StackNotFound("dev".to_string())
        );

        state::create_stack(&args.target.state_dir, "dev").unwrap();
        cmd_run(Command::Up, &args).unwrap();
        assert!(state::load_state(&args.target.state_dir, "dev").unwrap().is_some());
    }

    #[test]
    fn test_refresh_flag_and_force() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "pet-name");
        let mut args = run_args(dir.path(), file);
        cmd_run(Command::Up, &args).unwrap();

        let path = state::state_file_path(&args.target.state_dir, "dev");
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replace("fixtures", "forged")).unwrap();

        args.refresh = true;
        assert!(matches!(
            cmd_run(Command::Up, &args),
            Err(StackError::StateTampered { .. })
        ));
        assert!(matches!(
            cmd_refresh(&args.target, false, &args.report),
            Err(StackError::StateTampered { .. })
        ));
        cmd_refresh(&args.target, true, &args.report).unwrap();
        cmd_run(Command::Up, &args).unwrap();
    }

    #[test]
    fn test_step_outputs_written() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "named-string");
        let mut args = run_args(dir.path(), file);
        args.config_map = Some("name:\n  value: classified\n  secret: true\n".to_string());
        cmd_run(Command::Up, &args).unwrap();

        let st = state::load_state(&args.target.state_dir, "dev").unwrap().unwrap();
        let value = st.outputs["name"].value.as_str().unwrap().to_string();
        assert!(st.outputs["name"].secret);

        let text = std::fs::read_to_string(dir.path().join("output.txt")).unwrap();
        assert!(text.starts_with("output<<ghadelimiter_"));
        assert!(text.contains("name<<ghadelimiter_"));
        assert!(text.contains(&format!("\n{}\n", value)));
        assert!(!text.contains("classified"));
    }

    #[test]
    fn test_summary_needs_file_or_comment_flag() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "pet-name");
        let mut args = run_args(dir.path(), file);
        args.report.summary_file = None;
        cmd_run(Command::Up, &args).unwrap();
        assert!(!dir.path().join("summary.md").exists());
    }

    #[test]
    fn test_preview_writes_no_state() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "long-pet");
        let args = run_args(dir.path(), file);
        cmd_run(Command::Preview, &args).unwrap();
        assert!(state::load_state(&args.target.state_dir, "dev").unwrap().is_none());
    }

    #[test]
    fn test_config_map_and_fixture_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "pet-name");
        let mut args = run_args(dir.path(), file);
        args.fixture = Some("named-string".to_string());
        assert!(matches!(
            cmd_run(Command::Up, &args),
            Err(StackError::MissingConfig { .. })
        ));

        args.config_map = Some("name: x".to_string());
        cmd_run(Command::Up, &args).unwrap();
        let st = state::load_state(&args.target.state_dir, "dev").unwrap().unwrap();
        assert_eq!(st.outputs["name"].value.as_str().unwrap().len(), 60);
    }

    #[test]
    fn test_config_set_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_settings_file(dir.path(), "named-string");
        cmd_config_set(&file, "name", "x", false).unwrap();
        cmd_config_set(&file, "token", "hunter2", true).unwrap();
        assert!(cmd_config_set(&file, "a:b:c", "v", false).is_err());

        let settings = parser::parse_settings_file(&file).unwrap();
        assert_eq!(settings.config["name"], ConfigValue::plain("x"));
        assert!(settings.config["token"].secret);
        assert_eq!(settings.program.as_deref(), Some("named-string"));

        cmd_config_get(&file, "name", false).unwrap();
        assert!(matches!(
            cmd_config_get(&file, "ghost", false),
            Err(StackError::MissingConfig { .. })
        ));
    }

    #[test]
    fn test_output_rendering() {
        let secret = OutputValue {
            secret: true,
            ..OutputValue::new(serde_json::json!("hunter2"))
        };
        assert_eq!(plain_value(&secret, false), "[secret]");
        assert_eq!(plain_value(&secret, true), "hunter2");
        assert_eq!(json_value(&secret, false), serde_json::json!("[secret]"));
        assert_eq!(json_value(&OutputValue::unknown(), true), serde_json::Value::Null);
        assert_eq!(plain_value(&OutputValue::new(serde_json::json!(3)), false), "3");
    }

    #[test]
    fn test_stacks_empty() {
        let dir = tempfile::tempdir().unwrap();
        cmd_stacks(&dir.path().join("state")).unwrap();
    }

    #[test]
    fn test_fixtures_and_schema() {
        cmd_fixtures().unwrap();
        cmd_schema().unwrap();
        Cli::command().debug_assert();
    }
}
