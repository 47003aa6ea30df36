//! Logging configuration and initialization for Folio.

use std::fs::{self, File};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::{FolioError, Result};

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Check that a level string is one we accept from the `logs` action.
pub fn is_valid_level(level: &str) -> bool {
    matches!(
        level.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "warning" | "error"
    )
}

struct LogState {
    enabled: bool,
    level: String,
}

/// Runtime control over the log filter.
///
/// The `logs` action reads and mutates this; changes go through a
/// tracing-subscriber reload handle so they take effect without restarting.
#[derive(Clone)]
pub struct LogControl {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
    state: Arc<Mutex<LogState>>,
}

impl LogControl {
    fn new(handle: Option<reload::Handle<EnvFilter, Registry>>, config: &LoggingConfig) -> Self {
        Self {
            handle,
            state: Arc::new(Mutex::new(LogState {
                enabled: config.enabled,
                level: parse_level(&config.level).to_string().to_lowercase(),
            })),
        }
    }

    /// Create a control that tracks state without a live subscriber.
    ///
    /// Used by tests, which cannot install a global subscriber repeatedly.
    pub fn disconnected(config: &LoggingConfig) -> Self {
        Self::new(None, config)
    }

    /// Whether log output is currently enabled.
    pub fn enabled(&self) -> bool {
        self.state.lock().unwrap().enabled
    }

    /// The current log level string.
    pub fn level(&self) -> String {
        self.state.lock().unwrap().level.clone()
    }

    /// Enable or disable log output.
    pub fn set_enabled(&self, on: bool) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.enabled = on;
        }
        self.apply()
    }

    /// Change the log level.
    pub fn set_level(&self, level: &str) -> Result<()> {
        if !is_valid_level(level) {
            return Err(FolioError::InvalidRequest(format!(
                "unknown log level: {level}"
            )));
        }
        {
            let mut state = self.state.lock().unwrap();
            state.level = parse_level(level).to_string().to_lowercase();
        }
        self.apply()
    }

    fn apply(&self) -> Result<()> {
        let directive = {
            let state = self.state.lock().unwrap();
            if state.enabled {
                state.level.clone()
            } else {
                "off".to_string()
            }
        };
        if let Some(handle) = &self.handle {
            handle
                .reload(EnvFilter::new(directive))
                .map_err(|e| FolioError::Config(format!("failed to reload log filter: {e}")))?;
        }
        Ok(())
    }
}

/// Initialize the logging system with the given configuration.
///
/// Sets up console output and optional file logging, and returns a
/// [`LogControl`] for runtime level changes.
pub fn init(config: &LoggingConfig) -> Result<LogControl> {
    let directive = if config.enabled {
        parse_level(&config.level).to_string().to_lowercase()
    } else {
        "off".to_string()
    };
    let filter = EnvFilter::new(directive);
    let (filter_layer, handle) = reload::Layer::new(filter);

    if config.file.is_empty() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_ansi(true)
                    .with_target(true),
            )
            .init();
    } else {
        // Ensure log directory exists
        if let Some(parent) = Path::new(&config.file).parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let log_file = File::create(&config.file)?;
        let log_file = Arc::new(log_file);
        let writer = std::io::stdout.and(log_file);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .init();
    }

    Ok(LogControl::new(Some(handle), config))
}
