//! `/version`: report the running build.

use async_trait::async_trait;
use interaction_dispatcher::{CommandHandler, HandlerContext, ReplySender};
use interaction_protocol_types::Interaction;

/// Fixed identifier of this build.
pub fn build_identifier() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Replies with the build identifier.
pub struct VersionHandler {
    build: String,
}

impl VersionHandler {
    pub fn new() -> Self {
        Self {
            build: build_identifier(),
        }
    }
}

impl Default for VersionHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for VersionHandler {
    async fn handle(
        &self,
        reply: &ReplySender,
        _interaction: &Interaction,
        _ctx: &HandlerContext,
    ) -> anyhow::Result<()> {
        reply.text(self.build.clone()).await?;
        Ok(())
    }
}
