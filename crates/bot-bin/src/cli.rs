//! Command-line interface.

use bot_config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_FOLLOWUP_TIMEOUT_SECS, DEFAULT_IMAGE_API_URL,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT,
};
use clap::Parser;

/// Interaction bot command-line interface. Every option can also come from
/// the environment.
#[derive(Parser, Debug)]
#[command(name = "interaction-bot")]
#[command(about = "Signed interaction webhook for a chat-platform bot")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Project that owns the downstream credential secret
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT", default_value = "")]
    pub project: String,

    /// Secret holding the downstream API key
    #[arg(long, env = "SECRET_ID", default_value = "")]
    pub secret_id: String,

    /// Platform application id
    #[arg(long, env = "APPLICATION_ID", default_value = "")]
    pub application_id: String,

    /// Hex-encoded Ed25519 public key for request verification
    #[arg(long, env = "PUBLIC_KEY", default_value = "")]
    pub public_key: String,

    /// Bot token, needed only to install or tear down commands
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Name used in logs and operator alerts
    #[arg(long, env = "BOT_NAME", default_value = "interaction-bot")]
    pub bot_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Log format (json, compact)
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Platform REST API base URL
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Image generation endpoint
    #[arg(long, env = "IMAGE_API_URL", default_value = DEFAULT_IMAGE_API_URL)]
    pub image_api_url: String,

    /// Seconds a deferred handler may run before it is abandoned
    #[arg(long, env = "FOLLOWUP_TIMEOUT_SECS", default_value_t = DEFAULT_FOLLOWUP_TIMEOUT_SECS)]
    pub followup_timeout_secs: u64,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Register every command, then exit
    #[arg(long, conflicts_with = "teardown_commands")]
    pub install_commands: bool,

    /// Remove every registered command, then exit
    #[arg(long)]
    pub teardown_commands: bool,
}

impl Cli {
    pub fn into_config(self) -> Config {
        Config {
            bot_name: self.bot_name,
            port: self.port,
            project_id: self.project,
            secret_id: self.secret_id,
            application_id: self.application_id,
            public_key: self.public_key,
            bot_token: self.bot_token.filter(|token| !token.trim().is_empty()),
            api_base_url: self.api_base_url,
            image_api_url: self.image_api_url,
            log_level: self.log_level,
            log_format: self.log_format,
            followup_timeout_secs: self.followup_timeout_secs,
            max_body_bytes: self.max_body_bytes,
            install_commands: self.install_commands,
            teardown_commands: self.teardown_commands,
        }
    }
}
