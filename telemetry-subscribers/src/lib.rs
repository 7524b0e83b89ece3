// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `tracing` subscriber setup shared by the binaries of this workspace.
//!
//! ```no_run
//! let (_guards, _filter_handle) = telemetry_subscribers::TelemetryConfig::new()
//!     .with_env()
//!     .init();
//! tracing::info!("logging is up");
//! ```
//!
//! Logs always go to stderr unless a log file is configured, so stdout stays
//! free for program output.

use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub log_level: Option<String>,
    /// Emit one JSON object per event instead of human readable lines.
    pub json_log_output: bool,
    /// Write logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

/// Keeps the background log writer alive. Dropping it flushes pending lines.
#[must_use]
#[derive(Debug)]
pub struct TelemetryGuards {
    _worker_guard: Option<WorkerGuard>,
}

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

/// Changes the active log filter at runtime.
#[derive(Clone, Debug)]
pub struct FilterHandle(reload::Handle<EnvFilter, Registry>);

impl FilterHandle {
    pub fn update<S: AsRef<str>>(&self, directives: S) -> Result<(), String> {
        let filter = EnvFilter::try_new(directives.as_ref()).map_err(|e| e.to_string())?;
        self.0.reload(filter).map_err(|e| e.to_string())
    }

    pub fn get(&self) -> Result<String, String> {
        self.0
            .with_current(|filter| filter.to_string())
            .map_err(|e| e.to_string())
    }
}

impl TelemetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_level(mut self, log_level: &str) -> Self {
        self.log_level = Some(log_level.to_owned());
        self
    }

    pub fn with_json(mut self) -> Self {
        self.json_log_output = true;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    // Reads RUST_LOG_JSON and RUST_LOG_FILE. RUST_LOG itself is consulted at
    // init time and takes precedence over `log_level`.
    pub fn with_env(mut self) -> Self {
        if std::env::var("RUST_LOG_JSON").is_ok() {
            self.json_log_output = true;
        }
        if let Ok(path) = std::env::var("RUST_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let default = self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }

    pub fn try_init(self) -> Result<(TelemetryGuards, FilterHandle), TryInitError> {
        let (filter_layer, filter_handle) = reload::Layer::new(self.env_filter());

        let (writer, worker_guard, ansi) = match &self.log_file {
            Some(path) => {
                let directory = path
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                let file_name = path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("telemetry.log"));
                let appender = tracing_appender::rolling::never(directory, file_name);
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                (BoxMakeWriter::new(non_blocking), Some(guard), false)
            }
            None => (
                BoxMakeWriter::new(std::io::stderr),
                None,
                std::io::stderr().is_terminal(),
            ),
        };

        let fmt_layer: Box<dyn Layer<FilteredRegistry> + Send + Sync> = if self.json_log_output {
            fmt::layer().json().with_writer(writer).boxed()
        } else {
            fmt::layer().with_ansi(ansi).with_writer(writer).boxed()
        };

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init()?;

        Ok((
            TelemetryGuards {
                _worker_guard: worker_guard,
            },
            FilterHandle(filter_handle),
        ))
    }

    /// Install the subscriber globally. Panics if one is already installed.
    pub fn init(self) -> (TelemetryGuards, FilterHandle) {
        self.try_init()
            .expect("a global tracing subscriber is already installed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = TelemetryConfig::new()
            .with_log_level("debug")
            .with_json()
            .with_log_file("/tmp/cbdc.log");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.json_log_output);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/cbdc.log")));
    }

    #[test]
    fn test_init_to_file_and_reload_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let (guards, handle) = TelemetryConfig::new()
            .with_log_level("info")
            .with_log_file(&path)
            .try_init()
            .unwrap();
        // RUST_LOG may be set in the environment running the tests.
        handle.update("info").unwrap();

        tracing::info!("first line");
        handle.update("warn").unwrap();
        assert_eq!(handle.get().unwrap(), "warn");
        tracing::info!("filtered out");
        drop(guards);

        let logs = std::fs::read_to_string(&path).unwrap();
        assert!(logs.contains("first line"));
        assert!(!logs.contains("filtered out"));

        assert!(TelemetryConfig::new().try_init().is_err());
    }
}
