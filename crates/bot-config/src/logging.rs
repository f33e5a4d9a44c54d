//! Logging initialization for the bot.
//!
//! Thin wrapper over the observability crate. Every process mode logs through
//! the same JSON stream so operator alerts and request traces share one
//! destination.

use observability::{LogConfig, LogFormat};

/// Initialize the logging system.
///
/// This sets up tracing with:
/// - One JSON object per line on stdout (or compact text when requested)
/// - Log level from RUST_LOG env var or the provided default
/// - The bot name included in every log line as `service`
///
/// # Example
///
/// ```ignore
/// init_logging("info", "json", "imagebot");
/// tracing::info!("bot started");
/// ```
pub fn init_logging(level: &str, format: &str, bot_name: &str) {
    observability::init_with_config(LogConfig {
        service_name: bot_name.into(),
        default_level: level.into(),
        format: LogFormat::parse(format),
        log_path: std::env::var_os("BOT_LOG_FILE").map(Into::into),
    });
    tracing::debug!(level, format, "logging initialized");
}
