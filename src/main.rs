//! # Legal Retrieval Core — Main Driver
//!
//! ## Purpose
//! Entry point for the retrieval core binary. Owns no business logic beyond
//! configuration loading, logging initialization, and line-delimited JSON
//! transport framing over standard streams (spec §6 "Transport").
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration.
//! 2. Initialize logging and tracing.
//! 3. Open the Store and build the Registry/Shell.
//! 4. Run the requested subcommand (`serve-stdio`, or a one-shot tool call).

use clap::{Arg, Command};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use german_law_retrieval_core::{
    build_shell,
    config::Config,
    errors::{CoreError, Result},
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("legal-retrieval-core")
        .version("0.1.0")
        .author("Legal Search Team")
        .about("Retrieval core for a German federal law research server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("db-path")
                .long("db-path")
                .value_name("PATH")
                .help("Override the indexed corpus database path"),
        )
        .subcommand(
            Command::new("serve-stdio")
                .about("Run the line-delimited JSON tool-call loop over stdio"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = Config::load(config_path.as_deref())?;

    if let Some(db_path) = matches.get_one::<String>("db-path") {
        config.store.db_path = db_path.clone();
    }

    init_logging(&config)?;

    info!("Starting legal retrieval core");

    let shell = Arc::new(build_shell(&config).await?);

    match matches.subcommand() {
        Some(("serve-stdio", _)) | None => serve_stdio(shell).await,
        Some((other, _)) => {
            error!("unknown subcommand: {}", other);
            Ok(())
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let log_level = config.logging.level.parse().map_err(|_| CoreError::Config {
        message: format!("invalid log level: {}", config.logging.level),
    })?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    let subscriber = tracing_subscriber::registry().with(
        fmt_layer.with_filter(tracing_subscriber::filter::LevelFilter::from_level(log_level)),
    );

    subscriber.init();

    info!("logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Reads one JSON object per line from stdin, dispatches it through the
/// Shell, and writes one JSON envelope per line to stdout.
async fn serve_stdio(shell: Arc<german_law_retrieval_core::shell::Shell>) -> Result<()> {
    info!("serving tool calls over stdio");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(request) => {
                let name = request
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("")
                    .to_string();
                let arguments = request
                    .get("arguments")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                let result = shell.handle_tool_call(&name, arguments).await;
                serde_json::to_string(&result)
                    .unwrap_or_else(|_| r#"{"ok":false,"error":{"code":"internal_error"}}"#.to_string())
            }
            Err(e) => {
                serde_json::json!({
                    "tool": null,
                    "ok": false,
                    "error": { "code": "invalid_json", "message": e.to_string() }
                })
                .to_string()
            }
        };

        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
