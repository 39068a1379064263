use crate::config::AppConfig;
use crate::error::ChatError;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Where log records are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Console and log file (server mode)
    ConsoleAndFile,
    /// Log file only (interactive terminal chat, keeps the prompt clean)
    FileOnly,
}

/// Initialize logging from application configuration
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn setup_logging(config: &AppConfig, output: LogOutput) -> Result<(), ChatError> {
    let log_file = open_log_file(&config.log_dir)?;

    let level = parse_log_level(&config.log_level).to_string();
    let env_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter());

    let console_layer = match output {
        LogOutput::ConsoleAndFile => Some(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter()),
        ),
        LogOutput::FileOnly => None,
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ChatError::config(format!("Failed to initialize logging: {}", e)))?;

    tracing::info!(
        "Logging initialized: level={}, output={:?}, dir={}",
        config.log_level,
        output,
        config.log_dir.display()
    );

    Ok(())
}

fn open_log_file(log_dir: &Path) -> Result<File, ChatError> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).map_err(|e| {
            ChatError::config(format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            ))
        })?;
    }

    let log_file_path = log_dir.join("studychat.log");
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| {
            ChatError::config(format!(
                "Failed to open log file {}: {}",
                log_file_path.display(),
                e
            ))
        })
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Level::DEBUG);
        assert_eq!(parse_log_level("WARNING"), Level::WARN);
        assert_eq!(parse_log_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let dir = std::env::temp_dir().join(format!("studychat-log-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        assert!(open_log_file(&dir).is_ok());
        assert!(dir.join("studychat.log").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
