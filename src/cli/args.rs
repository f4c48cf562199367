//! CLI argument definitions using clap
//!
//! Commands:
//! - aerochat serve [--config <path>] [--host <host>] [--port <port>]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::observability::LogFormat;

/// aerochat - real-time channel chat with Lamport-ordered delivery
#[derive(Parser, Debug)]
#[command(name = "aerochat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the chat server
    Serve {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Log output format (overrides config)
        #[arg(long, value_enum)]
        log_format: Option<LogFormatArg>,
    },
}

/// `--log-format` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
