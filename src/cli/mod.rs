//! CLI module for aerochat
//!
//! Provides command-line interface for:
//! - serve: start the chat server

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, LogFormatArg};
pub use commands::{resolve_config, run, run_command, serve, ServeOverrides};
pub use errors::{CliError, CliErrorCode, CliResult};
