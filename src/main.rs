//! guidant-mcp: MCP server for desktop screenshot and click automation
//!
//! This tool lets AI assistants capture the screen and click on it through
//! an external automation executable.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use guidant_mcp::automation::{Automation, ProcessBackend};
use guidant_mcp::config;
use guidant_mcp::mcp::{McpServer, Router};

/// MCP server for desktop screenshot and click automation.
///
/// Speaks newline-delimited JSON-RPC on stdin/stdout by default, or plain
/// HTTP with `--http`.
#[derive(Parser, Debug)]
#[command(name = "guidant-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,

    /// Serve the HTTP transport instead of stdio
    #[arg(long)]
    http: bool,

    /// Address for the HTTP transport (overrides http.bind)
    #[arg(long, value_name = "ADDR", requires = "http")]
    bind: Option<SocketAddr>,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries protocol messages only.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the guidant-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "guidant-mcp {}  Copyright (C) 2026  The Embedded Society",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting guidant-mcp server"
    );

    let base_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!(error = %e, "Cannot determine working directory");
            return ExitCode::FAILURE;
        }
    };

    let backend = ProcessBackend::from_config(&cfg.automation);
    let automation = Automation::from_config(Arc::new(backend), &cfg.screenshot, &base_dir);

    info!(
        program = %cfg.automation.program,
        args = ?cfg.automation.args,
        timeout_secs = ?cfg.automation.timeout_secs,
        screenshot = %automation.screenshot_path().display(),
        "Automation configured"
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = if args.http {
        // http.bind is checked when the config is loaded
        let addr = args
            .bind
            .or_else(|| cfg.http.bind.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5001)));
        runtime.block_on(guidant_mcp::http::serve(addr, automation))
    } else {
        let mut server = McpServer::new(Router::new(automation));
        info!("MCP server ready, waiting for client connection...");
        runtime.block_on(server.run())
    };

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
