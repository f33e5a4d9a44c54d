//! Follow-up replies to the invoking user.

use async_trait::async_trait;
use interaction_protocol_types::{FileAttachment, FollowupMessage, InteractionToken};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("follow-up rejected with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReplyResult<T> = Result<T, ReplyError>;

/// Delivers follow-up messages using an interaction's token.
#[async_trait]
pub trait FollowupTransport: Send + Sync {
    async fn send(
        &self,
        token: &InteractionToken,
        message: &FollowupMessage,
        files: &[FileAttachment],
    ) -> ReplyResult<()>;
}

/// Reply channel handed to a handler for one interaction.
///
/// Remembers whether any reply got through so the error reporter does not
/// send a generic failure message on top of one the handler already sent.
pub struct ReplySender {
    transport: Arc<dyn FollowupTransport>,
    token: InteractionToken,
    replied: AtomicBool,
}

impl ReplySender {
    pub fn new(transport: Arc<dyn FollowupTransport>, token: InteractionToken) -> Self {
        Self {
            transport,
            token,
            replied: AtomicBool::new(false),
        }
    }

    /// Send a plain text message.
    pub async fn text(&self, content: impl Into<String>) -> ReplyResult<()> {
        self.send(&FollowupMessage::text(content), &[]).await
    }

    /// Send files, with optional text.
    pub async fn files(&self, content: Option<String>, files: Vec<FileAttachment>) -> ReplyResult<()> {
        let message = FollowupMessage::with_files(content, &files);
        self.send(&message, &files).await
    }

    pub fn has_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    async fn send(&self, message: &FollowupMessage, files: &[FileAttachment]) -> ReplyResult<()> {
        self.transport.send(&self.token, message, files).await?;
        self.replied.store(true, Ordering::SeqCst);
        Ok(())
    }
}
