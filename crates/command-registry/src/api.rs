//! Registration API client.

use crate::{RegistrationError, RegistrationResult};
use async_trait::async_trait;
use interaction_protocol_types::{CommandDescriptor, RegisteredCommand};
use serde::Serialize;
use tracing::debug;

/// Application command type for slash commands.
const CHAT_INPUT: u8 = 1;

/// Operations the registry needs from the platform, scoped to one application.
#[async_trait]
pub trait CommandRegistrationApi: Send + Sync {
    /// Create or overwrite the command with the descriptor's name.
    async fn upsert(&self, command: &CommandDescriptor) -> RegistrationResult<RegisteredCommand>;

    /// Commands currently registered for the application.
    async fn list(&self) -> RegistrationResult<Vec<RegisteredCommand>>;

    async fn delete(&self, command_id: &str) -> RegistrationResult<()>;
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(flatten)]
    command: &'a CommandDescriptor,
}

/// Global application commands over the platform's REST API.
#[derive(Clone)]
pub struct DiscordCommandApi {
    http_client: reqwest::Client,
    api_base_url: String,
    application_id: String,
    bot_token: String,
}

impl DiscordCommandApi {
    pub fn new(
        http_client: reqwest::Client,
        api_base_url: impl Into<String>,
        application_id: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_base_url: api_base_url.into(),
            application_id: application_id.into(),
            bot_token: bot_token.into(),
        }
    }

    fn commands_url(&self) -> String {
        format!(
            "{}/applications/{}/commands",
            self.api_base_url.trim_end_matches('/'),
            self.application_id
        )
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    async fn check_response(
        response: reqwest::Response,
        operation: &str,
    ) -> RegistrationResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RegistrationError::Api {
            status: status.as_u16(),
            operation: operation.to_string(),
            message,
        })
    }
}

#[async_trait]
impl CommandRegistrationApi for DiscordCommandApi {
    async fn upsert(&self, command: &CommandDescriptor) -> RegistrationResult<RegisteredCommand> {
        debug!(command = %command.name, "Upserting command");
        let response = self
            .http_client
            .post(self.commands_url())
            .header("Authorization", self.authorization())
            .json(&UpsertBody {
                kind: CHAT_INPUT,
                command,
            })
            .send()
            .await?;
        let response = Self::check_response(response, &format!("upsert {}", command.name)).await?;
        Ok(response.json().await?)
    }

    async fn list(&self) -> RegistrationResult<Vec<RegisteredCommand>> {
        let response = self
            .http_client
            .get(self.commands_url())
            .header("Authorization", self.authorization())
            .send()
            .await?;
        let response = Self::check_response(response, "list").await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, command_id: &str) -> RegistrationResult<()> {
        debug!(command_id, "Deleting command");
        let response = self
            .http_client
            .delete(format!("{}/{}", self.commands_url(), command_id))
            .header("Authorization", self.authorization())
            .send()
            .await?;
        Self::check_response(response, &format!("delete {command_id}")).await?;
        Ok(())
    }
}
