//! Acknowledgment and follow-up bodies.

use serde::Serialize;

/// Response type answering a liveness probe.
pub const PONG: u8 = 1;

/// Response type telling the platform a follow-up will arrive later.
pub const DEFERRED_CHANNEL_MESSAGE: u8 = 5;

/// Synchronous reply to an inbound interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: PONG }
    }

    pub fn deferred() -> Self {
        Self {
            kind: DEFERRED_CHANNEL_MESSAGE,
        }
    }
}

/// Binary file sent along with a follow-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileAttachment {
    pub fn png(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "image/png".to_string(),
            data,
        }
    }
}

/// Reference tying a multipart file part to the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRef {
    pub id: usize,
    pub filename: String,
}

/// JSON body of a follow-up message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowupMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

impl FollowupMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            attachments: Vec::new(),
        }
    }

    /// Message whose attachment refs line up with `files[n]` multipart parts.
    pub fn with_files(content: Option<String>, files: &[FileAttachment]) -> Self {
        Self {
            content,
            attachments: files
                .iter()
                .enumerate()
                .map(|(id, file)| AttachmentRef {
                    id,
                    filename: file.filename.clone(),
                })
                .collect(),
        }
    }
}
