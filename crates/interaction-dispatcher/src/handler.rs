//! Handler contract.

use crate::ReplySender;
use async_trait::async_trait;
use interaction_protocol_types::Interaction;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Per-invocation context.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub bot_name: Arc<str>,
    /// When the request reached the endpoint.
    pub received_at: Instant,
    /// After this the interaction token is no longer usable.
    pub deadline: Instant,
}

impl HandlerContext {
    pub fn new(bot_name: Arc<str>, received_at: Instant, followup_window: Duration) -> Self {
        Self {
            bot_name,
            received_at,
            deadline: received_at + followup_window,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Work bound to one command name.
///
/// Return `Ok(())` when the user has been told the outcome, including
/// expected failures like a rejected prompt. Return `Err` only for failures
/// the operator should hear about; the dispatcher then sends the user a
/// generic message if nothing was sent yet.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        reply: &ReplySender,
        interaction: &Interaction,
        ctx: &HandlerContext,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn remaining_counts_down_to_zero() {
        let ctx = HandlerContext::new(Arc::from("bot"), Instant::now(), Duration::from_secs(10));
        assert_eq!(ctx.remaining(), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(ctx.remaining(), Duration::from_secs(6));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }
}
