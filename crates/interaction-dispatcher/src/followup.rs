//! Follow-up webhook client.

use crate::{FollowupTransport, ReplyError, ReplyResult};
use async_trait::async_trait;
use interaction_protocol_types::{FileAttachment, FollowupMessage, InteractionToken};
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Posts follow-ups to `{api_base}/webhooks/{application_id}/{token}`.
#[derive(Clone)]
pub struct DiscordFollowupClient {
    http_client: reqwest::Client,
    api_base_url: String,
    application_id: String,
}

impl DiscordFollowupClient {
    pub fn new(
        http_client: reqwest::Client,
        api_base_url: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_base_url: api_base_url.into(),
            application_id: application_id.into(),
        }
    }

    fn webhook_url(&self, token: &InteractionToken) -> String {
        format!(
            "{}/webhooks/{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.application_id,
            token.expose()
        )
    }

    fn multipart(message: &FollowupMessage, files: &[FileAttachment]) -> ReplyResult<Form> {
        let mut form = Form::new().text("payload_json", serde_json::to_string(message)?);
        for (index, file) in files.iter().enumerate() {
            let part = Part::bytes(file.data.clone())
                .file_name(file.filename.clone())
                .mime_str(&file.content_type)?;
            form = form.part(format!("files[{index}]"), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl FollowupTransport for DiscordFollowupClient {
    async fn send(
        &self,
        token: &InteractionToken,
        message: &FollowupMessage,
        files: &[FileAttachment],
    ) -> ReplyResult<()> {
        let request = self.http_client.post(self.webhook_url(token));
        let request = if files.is_empty() {
            request.json(message)
        } else {
            request.multipart(Self::multipart(message, files)?)
        };

        debug!(files = files.len(), "Sending follow-up");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReplyError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
