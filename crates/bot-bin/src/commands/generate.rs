//! `/generate`: turn a prompt into an image attachment.

use crate::image_client::ImageGenerator;
use async_trait::async_trait;
use interaction_dispatcher::{CommandHandler, HandlerContext, ReplySender, GENERIC_FAILURE_MESSAGE};
use interaction_protocol_types::{FileAttachment, Interaction};
use secret_client_factory::LazyClient;
use std::sync::Arc;
use tracing::{info, warn};

pub const PROMPT_ARGUMENT: &str = "image-prompt";

const MISSING_PROMPT_MESSAGE: &str = "Please tell me what to draw.";

/// Generates an image from the prompt and posts it as an attachment.
///
/// Rejected prompts and throttling are explained to the user and reported as
/// success. Anything else is an operator problem.
pub struct GenerateHandler<G> {
    images: Arc<LazyClient<G>>,
}

impl<G> GenerateHandler<G> {
    pub fn new(images: Arc<LazyClient<G>>) -> Self {
        Self { images }
    }
}

#[async_trait]
impl<G: ImageGenerator + 'static> CommandHandler for GenerateHandler<G> {
    async fn handle(
        &self,
        reply: &ReplySender,
        interaction: &Interaction,
        _ctx: &HandlerContext,
    ) -> anyhow::Result<()> {
        let Some(prompt) = interaction
            .string_argument(PROMPT_ARGUMENT)
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
        else {
            reply.text(MISSING_PROMPT_MESSAGE).await?;
            return Ok(());
        };

        let client = match self.images.get().await {
            Ok(client) => client,
            Err(e) => {
                let err = anyhow::Error::new(e).context("image client unavailable");
                return Err(fail(reply, err).await);
            }
        };

        match client.generate(prompt).await {
            Ok(png) => {
                reply
                    .files(
                        Some(format!("> {prompt}")),
                        vec![FileAttachment::png("image.png", png)],
                    )
                    .await?;
                Ok(())
            }
            Err(e) => {
                if let Some(message) = e.user_message() {
                    info!(interaction_id = %interaction.id, error = %e, "Image request refused");
                    reply.text(message).await?;
                    return Ok(());
                }
                let err = anyhow::Error::new(e).context("image generation failed");
                Err(fail(reply, err).await)
            }
        }
    }
}

/// Send the generic apology and hand `err` back for escalation.
async fn fail(reply: &ReplySender, err: anyhow::Error) -> anyhow::Error {
    if let Err(reply_err) = reply.text(GENERIC_FAILURE_MESSAGE).await {
        warn!(error = %reply_err, "Failed to tell user about image failure");
    }
    err
}
