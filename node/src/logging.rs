//! Structured Logging Module
//!
//! Console or file output through `tracing-subscriber`, in pretty, compact or
//! JSON form, configured from the environment:
//! - `RUST_LOG`: filter directives (e.g. `info,o2ul_economics=debug`)
//! - `LOG_FORMAT`: `pretty`, `compact` or `json`
//! - `LOG_FILE`: append to this file instead of stderr
//! - `LOG_ANSI`: `true`/`false`, colours on console output

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format for log aggregation
    Json,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: LogLevel,
    pub format: LogFormat,
    /// Enable ANSI colors (ignored for JSON and file output)
    pub ansi_colors: bool,
    pub log_file: Option<PathBuf>,
    /// Module-specific log levels
    pub module_levels: Vec<(String, LogLevel)>,
    /// Log span close events with their duration
    pub span_events: bool,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            ansi_colors: true,
            log_file: None,
            module_levels: vec![
                ("o2ul_economics".to_string(), LogLevel::Info),
                ("o2ul_execution".to_string(), LogLevel::Warn),
            ],
            span_events: false,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(rust_log) = lookup("RUST_LOG") {
            // First directive without a target is the default level
            if let Some(level) = rust_log.split(',').find(|d| !d.contains('=')) {
                config.level = LogLevel::parse(level);
            }
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        if let Some(path) = lookup("LOG_FILE").filter(|p| !p.is_empty()) {
            config.log_file = Some(PathBuf::from(path));
        }
        if let Some(ansi) = lookup("LOG_ANSI") {
            config.ansi_colors = ansi.eq_ignore_ascii_case("true");
        }

        config
    }

    /// Build the env filter string
    fn build_filter(&self) -> String {
        let mut filter = self.level.as_str().to_string();
        for (module, level) in &self.module_levels {
            filter.push_str(&format!(",{}={}", module, level.as_str()));
        }
        filter
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured levels
    let filter = match std::env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::try_new(rust_log)?,
        Err(_) => EnvFilter::try_new(config.build_filter())?,
    };

    let span_events = if config.span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (writer, ansi) = match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), config.ansi_colors),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(span_events);

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry.with(layer.json().with_ansi(false)).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty().with_ansi(ansi)).try_init(),
        LogFormat::Compact => registry.with(layer.compact().with_ansi(ansi)).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))
}
