//! Structured logging for the CLI
//!
//! Verbosity flags pick a starting level; the `logging` section of the
//! config file and then `BOUNCER_LOG_*` / `RUST_LOG` refine it. Logs go to
//! stderr or, when a file is configured, through a non-blocking appender.
//! Every run gets a request id, and call metadata is redacted before it is
//! logged.

use crate::config::LoggingSettings;
use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

static REQUEST_ID: OnceLock<String> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    pub format: LogFormat,
    /// Log to stderr when no file is set
    pub console: bool,
    pub file: Option<PathBuf>,
    pub thread_ids: bool,
    /// File and line of each event
    pub source_location: bool,
    /// Emit span close events, which carry timings
    pub span_events: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        [LogFormat::Compact, LogFormat::Full, LogFormat::Json]
            .into_iter()
            .find(|format| format!("{:?}", format).eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown log format '{}'", name))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// `-v` is info, `-vv` debug with source locations, `-vvv` everything
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let tracing_all = verbosity >= 3;

        Self {
            level: level.to_string(),
            format: if tracing_all {
                LogFormat::Full
            } else {
                LogFormat::Compact
            },
            source_location: verbosity >= 2,
            thread_ids: tracing_all,
            span_events: tracing_all,
            ..Self::default()
        }
    }

    /// Apply the `logging` section of the config file
    pub fn merge_with_settings(&mut self, settings: &LoggingSettings) {
        if let Some(level) = &settings.level {
            self.level = level.clone();
        }
        if let Ok(format) = settings.format.parse() {
            self.format = format;
        }
        if settings.file.is_some() {
            self.file = settings.file.clone();
        }
    }

    /// Environment overrides, which win over the config file
    pub fn merge_with_env(&mut self) {
        // RUST_LOG beats BOUNCER_LOG_LEVEL
        if let Some(level) = std::env::var("RUST_LOG")
            .or_else(|_| std::env::var("BOUNCER_LOG_LEVEL"))
            .ok()
        {
            self.level = level;
        }

        if let Ok(format) = std::env::var("BOUNCER_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Warning: BOUNCER_LOG_FORMAT: {}", e),
            }
        }

        if let Ok(file) = std::env::var("BOUNCER_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }

        if let Ok(console) = std::env::var("BOUNCER_LOG_CONSOLE") {
            self.console = console.eq_ignore_ascii_case("true") || console == "1";
        }
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file sink when dropped and must outlive
/// the run.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let (writer, guard, ansi) = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::config(format!("Invalid log file {}", path.display())))?;

            std::fs::create_dir_all(&directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None if config.console => (
            BoxMakeWriter::new(std::io::stderr),
            None,
            std::io::stderr().is_terminal(),
        ),
        None => (BoxMakeWriter::new(std::io::sink), None, false),
    };

    let span_events = if config.span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_span_events(span_events);

    // Each format is a different subscriber type
    let installed = match config.format {
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
        }
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
    };
    installed.map_err(|e| Error::Logging(e.to_string()))?;

    let request_id = REQUEST_ID.get_or_init(generate_request_id);
    tracing::debug!(%request_id, ?config, "Logging initialized");

    Ok(guard)
}

pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Set once logging is initialized
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(String::as_str)
}

/// Span for one step of the run; `duration_ms` is recorded on close
pub fn operation_span(operation: &str, details: &str) -> Span {
    tracing::info_span!(
        "operation",
        operation,
        details,
        request_id = current_request_id().unwrap_or("unknown"),
        duration_ms = field::Empty,
    )
}

/// Keeping credentials out of the logs
pub mod redaction {
    use bouncer_core::CallMetadata;
    use regex::Regex;
    use std::collections::BTreeMap;
    use std::sync::OnceLock;

    const REDACTED: &str = "***";

    /// A key containing any of these carries a credential
    const SENSITIVE_KEY_PARTS: [&str; 7] = [
        "auth",
        "token",
        "key",
        "secret",
        "password",
        "cookie",
        "credential",
    ];

    static SCHEME_CREDENTIALS: OnceLock<Option<Regex>> = OnceLock::new();

    /// `Bearer <token>` and `Basic <token>` anywhere in a value
    pub fn redact_sensitive(input: &str) -> String {
        let regex = SCHEME_CREDENTIALS
            .get_or_init(|| Regex::new(r"(?i)\b(bearer|basic)\s+[a-z0-9._~+/=-]+").ok());
        match regex {
            Some(regex) => regex.replace_all(input, "$1 ***").into_owned(),
            None => input.to_string(),
        }
    }

    pub fn is_sensitive_key(key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        SENSITIVE_KEY_PARTS.iter().any(|part| key.contains(part))
    }

    /// Repeated values are joined; sensitive keys lose their values entirely
    pub fn redact_metadata(metadata: &CallMetadata) -> BTreeMap<String, String> {
        metadata
            .iter()
            .map(|(key, values)| {
                let value = if is_sensitive_key(key) {
                    REDACTED.to_string()
                } else {
                    redact_sensitive(&values.join(", "))
                };
                (key.to_string(), value)
            })
            .collect()
    }
}

pub mod timing {
    use std::time::{Duration, Instant};
    use tracing::Span;

    /// Logs how long an operation took when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: &'static str,
    }

    impl Timer {
        pub fn new(operation: &'static str) -> Self {
            Self::with_details(operation, "")
        }

        pub fn with_details(operation: &'static str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::operation_span(operation, details),
                operation,
            }
        }

        pub fn elapsed(&self) -> Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration_ms = self.start.elapsed().as_millis() as u64;
            self.span.record("duration_ms", duration_ms);
            tracing::debug!(operation = self.operation, duration_ms, "Operation completed");
        }
    }
}
