//! Provenance: append-only event log and BLAKE3 state checksums.

pub mod eventlog;
pub mod hasher;
