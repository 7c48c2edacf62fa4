use super::commands::Cli;
use anonsignals_client::config::LoggingConfig;
use anonsignals_client::{CancellationToken, MemberEntry};
use anonsignals_types::{AnonError, AnonResult, FieldElement};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init_logging(cli: &Cli, logging: &LoggingConfig) -> AnonResult<()> {
    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => logging.level.to_string(),
            1 => "info,anonsignals_client=debug,anonsignals_crypto=debug".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(log_file) = cli.log_file.as_ref().or(logging.file.as_ref()) {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| AnonError::Config(format!("Failed to open log file {:?}: {}", log_file, e)))?;
        let writer = std::sync::Mutex::new(file);
        if logging.json {
            subscriber.with(fmt::layer().json().with_writer(writer)).init();
        } else {
            subscriber.with(fmt::layer().with_writer(writer).with_ansi(false)).init();
        }
    } else if logging.json {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(cli.verbose >= 2);
        subscriber.with(stderr_layer).init();
    }

    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> AnonResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AnonError::Serialization(format!("Failed to render output: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

pub fn parse_field(s: &str) -> AnonResult<FieldElement> {
    s.trim().parse()
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AnonResult<T> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AnonError::Config(format!("Failed to read {:?}: {}", path, e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| AnonError::Serialization(format!("Failed to parse {:?}: {}", path, e)))
}

pub fn load_members(path: &Path) -> AnonResult<Vec<MemberEntry>> {
    read_json(path)
}

/// Token cancelled by the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let (handle, token) = CancellationToken::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            handle.cancel();
        }
    });
    token
}
