//! Core stack logic: settings, configuration, runtime context, execution,
//! state, run summaries, and step outputs.

pub mod config;
pub mod context;
pub mod executor;
pub mod parser;
pub mod state;
pub mod step_output;
pub mod summary;
pub mod types;
