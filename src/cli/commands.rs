//! CLI command implementations

use std::path::Path;

use tracing::info;

use crate::config::ServerConfig;
use crate::http_server::HttpServer;
use crate::observability::{init_logging, log_event, Event, LogFormat};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_format: Option<LogFormat>,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            host,
            port,
            log_format,
        } => serve(
            config.as_deref(),
            ServeOverrides {
                host,
                port,
                log_format: log_format.map(LogFormat::from),
            },
        ),
    }
}

/// Load the config file (if any) and apply command-line overrides
pub fn resolve_config(config_path: Option<&Path>, overrides: ServeOverrides) -> CliResult<ServerConfig> {
    let mut config = match config_path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = overrides.host {
        config.host = host;
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(format) = overrides.log_format {
        config.log_format = format;
    }

    config.validate()?;
    Ok(config)
}

/// Start the chat server
///
/// 1. Resolve configuration
/// 2. Install the log subscriber
/// 3. Run the Axum server on a multi-threaded runtime until ctrl-c
pub fn serve(config_path: Option<&Path>, overrides: ServeOverrides) -> CliResult<()> {
    let config = resolve_config(config_path, overrides)?;

    init_logging(config.log_format, &config.log_level)?;
    log_event(Event::ServerStart);
    info!(
        event = %Event::ConfigLoaded,
        addr = %config.socket_addr(),
        log_format = %config.log_format,
        "configuration loaded"
    );

    let server = HttpServer::new(config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async move {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}
