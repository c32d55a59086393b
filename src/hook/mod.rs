// src/hook/mod.rs

//! The command builder / process runner for the dbt CLI.
//!
//! - [`command`] turns a config bundle plus a subcommand into an argument
//!   vector.
//! - [`log_line`] parses and classifies dbt's JSON log output.
//! - [`runner`] owns the subprocess: spawn, pump, wait, cancel.

pub mod command;
pub mod log_line;
pub mod runner;

pub use command::build_command_line;
pub use log_line::{Classified, LogLine, RelayLevel, classify, strip_ansi_escape_codes};
pub use runner::{CancelHandle, DbtHook};
