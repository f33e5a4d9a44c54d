//! Process configuration for the interaction bot.

use crate::{CoreError, CoreResult};
use serde::Serialize;
use url::Url;

/// Default listening port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8080;

/// Default base URL of the chat platform's REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Default downstream image generation endpoint.
pub const DEFAULT_IMAGE_API_URL: &str = "https://api.openai.com/v1/images/generations";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Follow-up tokens stay valid for 15 minutes; stop a minute early.
pub const DEFAULT_FOLLOWUP_TIMEOUT_SECS: u64 = 14 * 60;

/// Upper bound on an inbound interaction body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// What the process was started to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Serve the interaction webhook.
    Serve,
    /// Upsert every command descriptor, then exit.
    InstallCommands,
    /// Delete every registered command, then exit.
    TeardownCommands,
}

/// Main bot configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Bot identity used in logs and operator alerts.
    pub bot_name: String,
    /// HTTP listening port.
    pub port: u16,
    /// Project/namespace that owns the secret.
    pub project_id: String,
    /// Identifier of the downstream credential in the secret store.
    pub secret_id: String,
    /// Platform application id.
    pub application_id: String,
    /// Hex-encoded Ed25519 verification key.
    pub public_key: String,
    /// Bot token for the command registration API (admin modes only).
    #[serde(skip_serializing)]
    pub bot_token: Option<String>,
    /// Platform REST API base URL.
    pub api_base_url: String,
    /// Downstream image generation endpoint.
    pub image_api_url: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, compact).
    pub log_format: String,
    /// Upper bound on a single deferred handler run.
    pub followup_timeout_secs: u64,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
    /// Install commands instead of serving.
    pub install_commands: bool,
    /// Tear down commands instead of serving.
    pub teardown_commands: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_name: "interaction-bot".to_string(),
            port: DEFAULT_PORT,
            project_id: String::new(),
            secret_id: String::new(),
            application_id: String::new(),
            public_key: String::new(),
            bot_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_api_url: DEFAULT_IMAGE_API_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: "json".to_string(),
            followup_timeout_secs: DEFAULT_FOLLOWUP_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            install_commands: false,
            teardown_commands: false,
        }
    }
}

impl Config {
    /// Which mode the flags select.
    pub fn mode(&self) -> RunMode {
        if self.install_commands {
            RunMode::InstallCommands
        } else if self.teardown_commands {
            RunMode::TeardownCommands
        } else {
            RunMode::Serve
        }
    }

    /// Check that the options required by the selected mode are present.
    pub fn validate(&self) -> CoreResult<()> {
        if self.install_commands && self.teardown_commands {
            return Err(CoreError::Config(
                "install and teardown modes are mutually exclusive".to_string(),
            ));
        }
        require("bot name", &self.bot_name)?;
        require("application id", &self.application_id)?;
        self.api_base_url()?;

        match self.mode() {
            RunMode::Serve => {
                if self.port == 0 {
                    return Err(CoreError::Config("port must be non-zero".to_string()));
                }
                require("public key", &self.public_key)?;
                require("project id", &self.project_id)?;
                require("secret id", &self.secret_id)?;
                self.image_api_url()?;
                if self.followup_timeout_secs == 0 {
                    return Err(CoreError::Config(
                        "follow-up timeout must be non-zero".to_string(),
                    ));
                }
            }
            RunMode::InstallCommands | RunMode::TeardownCommands => {
                require("bot token", self.bot_token.as_deref().unwrap_or_default())?;
            }
        }
        Ok(())
    }

    /// Platform API base URL, parsed.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// Downstream image endpoint, parsed.
    pub fn image_api_url(&self) -> CoreResult<Url> {
        Url::parse(&self.image_api_url).map_err(CoreError::from)
    }
}

fn require(what: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::Config(format!("{what} is required")));
    }
    Ok(())
}
