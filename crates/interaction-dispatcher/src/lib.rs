//! Interaction webhook dispatcher.
//!
//! Verifies each signed request, answers liveness probes inline, acknowledges
//! commands with a deferred response and runs the bound handler only after
//! that acknowledgment has been handed to the transport. Handler failures are
//! routed twice: a generic reply to the user and one alert to the operator.

mod config;
mod dispatcher;
mod error;
mod followup;
mod handler;
mod reply;
mod reporter;
mod server;
mod state;

#[cfg(test)]
mod tests;

pub use config::{
    BotRuntimeConfig, BotRuntimeConfigBuilder, HandlerBindings, RuntimeConfigError,
    DEFAULT_FOLLOWUP_TIMEOUT, DEFAULT_MAX_BODY_BYTES,
};
pub use dispatcher::{Dispatcher, SettledInteraction};
pub use error::{DispatchError, DispatchResult};
pub use followup::DiscordFollowupClient;
pub use handler::{CommandHandler, HandlerContext};
pub use reply::{FollowupTransport, ReplyError, ReplyResult, ReplySender};
pub use reporter::{
    AlertKind, AlertSink, ErrorReporter, OperatorAlert, TracingAlertSink, ALERT_TARGET,
    GENERIC_FAILURE_MESSAGE,
};
pub use server::{router, serve, INTERACTIONS_PATH};
pub use state::{InteractionState, InvalidTransition};
