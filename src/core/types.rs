//! Stack settings, configuration values, resource arguments, persisted state,
//! and provenance events.
//!
//! Everything that crosses a file boundary derives Serialize/Deserialize so the
//! settings file, the state file, and the event log roundtrip cleanly.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ============================================================================
// Top-level stackrun.yaml
// ============================================================================

/// Stack settings: which project/stack to run, with what configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StackSettings {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Project name; also the default configuration namespace
    pub project: String,

    /// Stack name (state is kept per stack)
    #[serde(default = "default_stack")]
    pub stack: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Fixture program to run when none is given on the command line
    #[serde(default)]
    pub program: Option<String>,

    /// Configuration values, keyed `namespace:key` or bare `key`
    #[serde(default)]
    pub config: IndexMap<String, ConfigValue>,

    /// Run policy
    #[serde(default)]
    pub policy: Policy,
}

fn default_stack() -> String {
    "dev".to_string()
}

/// Run policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Policy {
    /// Append provenance events to `<state>/<stack>/events.jsonl`
    #[serde(default = "default_true")]
    pub event_log: bool,

    /// Persist stack state after `up`, `refresh`, and `destroy`
    #[serde(default = "default_true")]
    pub state_file: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            event_log: true,
            state_file: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Configuration values
// ============================================================================

/// A single configuration value. Scalars in YAML/JSON are accepted and kept
/// as their string rendering; `{ value, secret }` marks a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawConfigValue", into = "RawConfigValue")]
pub struct ConfigValue {
    pub value: String,
    pub secret: bool,
}

impl ConfigValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: false,
        }
    }

    pub fn secret(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
enum RawConfigValue {
    Scalar(Scalar),
    Detailed {
        value: Scalar,
        #[serde(default)]
        secret: bool,
    },
}

#[derive(Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<RawConfigValue> for ConfigValue {
    fn from(raw: RawConfigValue) -> Self {
        match raw {
            RawConfigValue::Scalar(s) => Self::plain(s.to_string()),
            RawConfigValue::Detailed { value, secret } => Self {
                value: value.to_string(),
                secret,
            },
        }
    }
}

impl From<ConfigValue> for RawConfigValue {
    fn from(cv: ConfigValue) -> Self {
        if cv.secret {
            Self::Detailed {
                value: Scalar::Text(cv.value),
                secret: true,
            }
        } else {
            Self::Scalar(Scalar::Text(cv.value))
        }
    }
}

impl JsonSchema for ConfigValue {
    fn schema_name() -> String {
        "ConfigValue".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        RawConfigValue::json_schema(gen)
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Resource types offered by the built-in `random` provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "random:index/randomPet:RandomPet")]
    RandomPet,
    #[serde(rename = "random:index/randomString:RandomString")]
    RandomString,
}

impl ResourceType {
    /// Fully qualified type token, as it appears in URNs.
    pub fn token(&self) -> &'static str {
        match self {
            Self::RandomPet => "random:index/randomPet:RandomPet",
            Self::RandomString => "random:index/randomString:RandomString",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Build the URN identifying a resource within a stack.
pub fn resource_urn(stack: &str, project: &str, resource_type: ResourceType, name: &str) -> String {
    format!(
        "urn:stackrun:{}::{}::{}::{}",
        stack,
        project,
        resource_type.token(),
        name
    )
}

/// Arguments for a random pet name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomPetArgs {
    /// Number of words (default 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    /// Word separator (default "-")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    /// Literal prefix prepended before the generated words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl RandomPetArgs {
    pub fn effective_length(&self) -> u32 {
        self.length.unwrap_or(2)
    }

    pub fn effective_separator(&self) -> &str {
        self.separator.as_deref().unwrap_or("-")
    }
}

/// Arguments for a random string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomStringArgs {
    /// Total length in characters
    pub length: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_lower: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_upper: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_numeric: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_special: Option<u32>,

    /// Replaces the default special character set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_special: Option<String>,
}

impl RandomStringArgs {
    /// All character classes enabled, no minimums.
    pub fn with_length(length: u32) -> Self {
        Self {
            length,
            lower: None,
            upper: None,
            numeric: None,
            special: None,
            min_lower: None,
            min_upper: None,
            min_numeric: None,
            min_special: None,
            override_special: None,
        }
    }
}

/// Typed arguments for one resource-creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceArgs {
    RandomPet(RandomPetArgs),
    RandomString(RandomStringArgs),
}

impl ResourceArgs {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::RandomPet(_) => ResourceType::RandomPet,
            Self::RandomString(_) => ResourceType::RandomString,
        }
    }

    /// Flatten the arguments into the `inputs` map recorded in state.
    pub fn to_inputs(&self) -> IndexMap<String, serde_json::Value> {
        let value = match self {
            Self::RandomPet(a) => serde_json::to_value(a),
            Self::RandomString(a) => serde_json::to_value(a),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => IndexMap::new(),
        }
    }
}

impl From<RandomPetArgs> for ResourceArgs {
    fn from(args: RandomPetArgs) -> Self {
        Self::RandomPet(args)
    }
}

impl From<RandomStringArgs> for ResourceArgs {
    fn from(args: RandomStringArgs) -> Self {
        Self::RandomString(args)
    }
}

/// A created (or, in preview, planned) resource: the handle returned to the
/// fixture program and the record kept in stack state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub urn: String,

    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Logical name given by the program
    pub name: String,

    /// Provider-assigned identifier (empty in preview)
    pub id: String,

    #[serde(default)]
    pub inputs: IndexMap<String, serde_json::Value>,

    #[serde(default)]
    pub outputs: IndexMap<String, serde_json::Value>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl ResourceState {
    /// Provider output by name, as a string when it is one.
    pub fn output_str(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).and_then(|v| v.as_str())
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// A value exported by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    pub value: serde_json::Value,

    #[serde(default)]
    pub secret: bool,

    /// False when the value is not computed yet (preview)
    #[serde(default = "default_true")]
    pub known: bool,
}

impl OutputValue {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            secret: false,
            known: true,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: serde_json::Value::Null,
            secret: false,
            known: false,
        }
    }

    /// Render for display; secrets are masked unless `show_secrets`.
    pub fn render(&self, show_secrets: bool) -> String {
        if !self.known {
            return "[unknown]".to_string();
        }
        if self.secret && !show_secrets {
            return "[secret]".to_string();
        }
        match &self.value {
            serde_json::Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// State file
// ============================================================================

/// Persisted state of one stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackState {
    /// Schema version
    pub schema: String,

    pub project: String,

    pub stack: String,

    /// When the state was last written
    pub updated_at: String,

    /// Generator version
    pub generator: String,

    /// Run that produced this state
    #[serde(default)]
    pub last_run: Option<String>,

    /// Resources keyed by URN, in registration order
    #[serde(default)]
    pub resources: IndexMap<String, ResourceState>,

    /// Exported outputs, in export order
    #[serde(default)]
    pub outputs: IndexMap<String, OutputValue>,

    /// BLAKE3 over resources and outputs
    #[serde(default)]
    pub checksum: String,
}

// ============================================================================
// Commands and results
// ============================================================================

/// Stack operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Up,
    Preview,
    Refresh,
    Destroy,
    Output,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Preview => write!(f, "preview"),
            Self::Refresh => write!(f, "refresh"),
            Self::Destroy => write!(f, "destroy"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Result of one stack operation.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub project: String,
    pub stack: String,
    pub command: Command,
    pub run_id: String,
    pub resources: Vec<ResourceState>,
    pub outputs: IndexMap<String, OutputValue>,
    /// Human-readable run report, one line per entry
    pub report: Vec<String>,
    pub total_duration: Duration,
}

// ============================================================================
// Provenance events
// ============================================================================

/// Provenance event for the JSONL event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProvenanceEvent {
    RunStarted {
        stack: String,
        run_id: String,
        command: Command,
        stackrun_version: String,
    },
    ResourceCreated {
        stack: String,
        urn: String,
        id: String,
        duration_seconds: f64,
    },
    ResourceChecked {
        stack: String,
        urn: String,
    },
    ResourceFailed {
        stack: String,
        urn: String,
        error: String,
    },
    ResourceRefreshed {
        stack: String,
        urn: String,
    },
    ResourceDeleted {
        stack: String,
        urn: String,
    },
    OutputExported {
        stack: String,
        key: String,
        secret: bool,
    },
    StateTampered {
        stack: String,
        expected_checksum: String,
        actual_checksum: String,
    },
    RunCompleted {
        stack: String,
        run_id: String,
        command: Command,
        resources: u32,
        outputs: u32,
        total_seconds: f64,
    },
    RunFailed {
        stack: String,
        run_id: String,
        error: String,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: ProvenanceEvent,
}
