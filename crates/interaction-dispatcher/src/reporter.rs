//! Dual-channel error reporting.
//!
//! The user channel is a best-effort generic follow-up. The operator channel
//! is a single ERROR-level alert per failure. Neither is retried.

use crate::{InteractionState, ReplySender};
use interaction_protocol_types::Interaction;
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

/// Target of operator alert events; the log-based alert filters on it.
pub const ALERT_TARGET: &str = "operator_alert";

/// What the user sees when a command fails for reasons they cannot fix.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while running that command. The bot's operator has been notified.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Verified request that could not be parsed.
    Protocol,
    /// Command with no handler bound.
    Configuration,
    /// Handler returned an error, panicked or ran out of time.
    Internal,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Protocol => "protocol",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        })
    }
}

/// One escalation to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorAlert {
    pub bot: String,
    pub kind: AlertKind,
    pub interaction_id: Option<String>,
    pub command: Option<String>,
    /// User who invoked the command, when the platform sent one.
    pub user_id: Option<String>,
    pub detail: String,
}

/// Destination for operator alerts. Must not block.
pub trait AlertSink: Send + Sync {
    fn alert(&self, alert: OperatorAlert);
}

/// Emits each alert as one ERROR event on [`ALERT_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, alert: OperatorAlert) {
        error!(
            target: ALERT_TARGET,
            bot = %alert.bot,
            kind = %alert.kind,
            interaction_id = alert.interaction_id.as_deref().unwrap_or(""),
            command = alert.command.as_deref().unwrap_or(""),
            user_id = alert.user_id.as_deref().unwrap_or(""),
            "{}",
            alert.detail
        );
    }
}

/// Routes failures to the user and the operator.
#[derive(Clone)]
pub struct ErrorReporter {
    bot_name: Arc<str>,
    sink: Arc<dyn AlertSink>,
}

impl ErrorReporter {
    pub fn new(bot_name: Arc<str>, sink: Arc<dyn AlertSink>) -> Self {
        Self { bot_name, sink }
    }

    /// Settle a handler outcome into a terminal state.
    pub async fn settle(
        &self,
        outcome: anyhow::Result<()>,
        reply: &ReplySender,
        interaction: &Interaction,
    ) -> InteractionState {
        match outcome {
            Ok(()) => InteractionState::Responded,
            Err(e) => {
                self.escalate(
                    AlertKind::Internal,
                    Some(reply),
                    Some(interaction),
                    format!("{e:#}"),
                )
                .await
            }
        }
    }

    /// Tell the user (when a reply channel exists) and alert the operator.
    pub async fn escalate(
        &self,
        kind: AlertKind,
        reply: Option<&ReplySender>,
        interaction: Option<&Interaction>,
        detail: String,
    ) -> InteractionState {
        if let Some(reply) = reply {
            if !reply.has_replied() {
                if let Err(e) = reply.text(GENERIC_FAILURE_MESSAGE).await {
                    warn!(error = %e, "Failed to send generic failure reply");
                }
            }
        }

        self.sink.alert(OperatorAlert {
            bot: self.bot_name.to_string(),
            kind,
            interaction_id: interaction.map(|i| i.id.clone()),
            command: interaction
                .map(|i| i.command_name.clone())
                .filter(|name| !name.is_empty()),
            user_id: interaction.and_then(|i| i.user_id.clone()),
            detail,
        });
        InteractionState::Escalated
    }
}
