//! # Observability
//!
//! Structured logging shared by every interaction bot crate.
//!
//! ## Design Philosophy
//!
//! Services are **log producers**. They call `observability::init()` once at
//! startup and use standard `tracing` macros everywhere else. They have no
//! knowledge of where the lines end up.
//!
//! In production every event becomes one JSON object on stdout. The hosting
//! platform's log collector reads the `severity` field directly, which is what
//! lets an external log-based metric count `ERROR` lines per bot and page the
//! operator. Nothing in this crate talks to the alerting system itself.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("interaction-bot");
//!     tracing::info!("service started");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "imagebot".into(),
//!     default_level: "debug".into(),
//!     format: observability::LogFormat::Compact,
//!     ..Default::default()
//! });
//! ```

mod json_layer;
mod sink;

use std::path::PathBuf;

pub use json_layer::{JsonLayer, LogEntry};
pub use sink::{LineWriter, LineWriterFactory};

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line with a `severity` field.
    #[default]
    Json,
    /// Human-readable single-line output for local runs.
    Compact,
}

impl LogFormat {
    /// Parse a format name; anything unrecognised selects JSON.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" | "pretty" | "text" => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (usually the bot name).
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Output encoding.
    pub format: LogFormat,

    /// Optional file to append JSON lines to instead of stdout.
    pub log_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            format: LogFormat::Json,
            log_path: None,
        }
    }
}

/// Initialize the observability layer with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// Does nothing if a global subscriber is already installed, so tests and
/// administrative subcommands may call it more than once.
pub fn init_with_config(config: LogConfig) {
    match config.format {
        LogFormat::Json => sink::init_json_subscriber(&config),
        LogFormat::Compact => {
            use tracing_subscriber::util::SubscriberInitExt;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(&config.default_level)
                    }),
                )
                .with_target(true)
                .compact()
                .finish()
                .try_init();
        }
    }
}

/// Re-export tracing macros for convenience.
/// Services can use `observability::info!()` or `tracing::info!()`.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
