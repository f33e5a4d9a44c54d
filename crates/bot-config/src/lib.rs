//! Configuration, core errors, and logging bootstrap for the interaction bot.

mod config;
mod error;
mod logging;

pub use config::{
    Config, RunMode, DEFAULT_API_BASE_URL, DEFAULT_FOLLOWUP_TIMEOUT_SECS, DEFAULT_IMAGE_API_URL,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
