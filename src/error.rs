//! Unified error model for stack runs.

use thiserror::Error;

/// Every way a stack run can fail.
///
/// Fixture programs return these unchanged; the process boundary prints the
/// message and exits non-zero.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error(
        "missing required configuration variable '{key}'\n\tplease set a value using the command `stackrun config set {key} <value>`"
    )]
    MissingConfig { key: String },

    #[error("configuration variable '{key}' is invalid: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("provisioning {urn} failed: {message}")]
    Provisioning { urn: String, message: String },

    #[error("duplicate resource URN {0}")]
    DuplicateResource(String),

    #[error("output '{0}' exported more than once")]
    DuplicateOutput(String),

    #[error("unknown fixture '{0}'")]
    UnknownFixture(String),

    #[error("no state for stack '{0}'. Run `stackrun up` first")]
    NoState(String),

    #[error("stack '{0}' not found; pass --upsert to create it")]
    StackNotFound(String),

    #[error(
        "state checksum mismatch for stack '{stack}': recorded {recorded}, actual {actual}\n\trun `stackrun refresh --force` to accept the current state"
    )]
    StateTampered {
        stack: String,
        recorded: String,
        actual: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Io(String),
}

impl StackError {
    /// Wrap an I/O failure with the path or operation it concerns.
    pub fn io(what: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io(format!("{}: {}", what, err))
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
