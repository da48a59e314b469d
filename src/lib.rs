//! Stackrun: runs small infrastructure-as-code fixture programs against a
//! resource provider and records the resulting stack state.
//!
//! Each fixture registers a random pet or random string, optionally reading
//! configuration and exporting outputs. State is kept per stack with a BLAKE3
//! checksum, and every run appends to a JSONL provenance log.

pub mod cli;
pub mod core;
pub mod error;
pub mod fixtures;
pub mod provenance;
pub mod resources;
