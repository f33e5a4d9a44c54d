//! Request handling and deferred dispatch.

use crate::state::Lifecycle;
use crate::{
    AlertKind, BotRuntimeConfig, DispatchResult, ErrorReporter, FollowupTransport,
    HandlerContext, InteractionState, ReplySender,
};
use anyhow::anyhow;
use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use futures_util::{stream, FutureExt, StreamExt};
use interaction_protocol_types::{Interaction, InteractionKind, InteractionResponse};
use signature_verifier::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

const SETTLED_CHANNEL_CAPACITY: usize = 64;

/// Terminal state of one interaction, published after it settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledInteraction {
    pub interaction_id: String,
    pub command: String,
    pub state: InteractionState,
}

/// Owns the runtime configuration and the follow-up transport.
pub struct Dispatcher {
    config: Arc<BotRuntimeConfig>,
    transport: Arc<dyn FollowupTransport>,
    reporter: ErrorReporter,
    settled: broadcast::Sender<SettledInteraction>,
}

impl Dispatcher {
    pub fn new(config: Arc<BotRuntimeConfig>, transport: Arc<dyn FollowupTransport>) -> Self {
        let reporter = ErrorReporter::new(
            Arc::clone(config.bot_name()),
            Arc::clone(config.alert_sink()),
        );
        let (settled, _) = broadcast::channel(SETTLED_CHANNEL_CAPACITY);
        Self {
            config,
            transport,
            reporter,
            settled,
        }
    }

    pub fn config(&self) -> &BotRuntimeConfig {
        &self.config
    }

    /// Receive terminal states of pings and commands as they settle.
    pub fn subscribe(&self) -> broadcast::Receiver<SettledInteraction> {
        self.settled.subscribe()
    }

    /// Verify, parse and answer one webhook request.
    ///
    /// Commands are answered with a deferred acknowledgment; the handler runs
    /// on a detached task once the response body has been taken by the
    /// transport.
    pub async fn handle_request(
        self: &Arc<Self>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> DispatchResult<Response> {
        let received_at = Instant::now();
        let mut lifecycle = Lifecycle::new("unparsed");

        if let Err(e) = self.config.verifier().verify(
            header_str(headers, SIGNATURE_HEADER),
            header_str(headers, TIMESTAMP_HEADER),
            body,
        ) {
            debug!(error = %e, "Rejected request signature");
            return Err(e.into());
        }
        lifecycle.advance(InteractionState::Verified);

        let mut interaction = match Interaction::from_slice(body) {
            Ok(interaction) => interaction,
            Err(e) => {
                warn!(error = %e, "Verified request carried an unusable payload");
                let state = self
                    .reporter
                    .escalate(AlertKind::Protocol, None, None, e.to_string())
                    .await;
                lifecycle.advance(state);
                return Err(e.into());
            }
        };
        lifecycle.set_request_id(interaction.id.as_str());

        match interaction.kind {
            InteractionKind::Ping => {
                lifecycle.advance(InteractionState::Responded);
                self.publish(&interaction, lifecycle.state());
                Ok(Json(InteractionResponse::pong()).into_response())
            }
            InteractionKind::ApplicationCommand => {
                let payload = serde_json::to_vec(&InteractionResponse::deferred())?;
                interaction.acknowledge();
                lifecycle.advance(InteractionState::Acked);

                let (ack_tx, ack_rx) = oneshot::channel();
                let dispatcher = Arc::clone(self);
                tokio::spawn(async move {
                    dispatcher
                        .run_command(interaction, lifecycle, received_at, ack_rx)
                        .await;
                });
                Ok(deferred_response(payload, AckGuard(Some(ack_tx))))
            }
        }
    }

    async fn run_command(
        self: Arc<Self>,
        interaction: Interaction,
        mut lifecycle: Lifecycle,
        received_at: Instant,
        ack_sent: oneshot::Receiver<()>,
    ) {
        // A closed channel means the response was dropped unsent; the
        // acknowledgment is out of our hands then too.
        let _ = ack_sent.await;

        let reply = ReplySender::new(Arc::clone(&self.transport), interaction.token.clone());
        let Some(handler) = self
            .config
            .bindings()
            .get(&interaction.command_name)
            .cloned()
        else {
            warn!(command = %interaction.command_name, "No handler bound for command");
            let state = self
                .reporter
                .escalate(
                    AlertKind::Configuration,
                    Some(&reply),
                    Some(&interaction),
                    format!("no handler bound for command {}", interaction.command_name),
                )
                .await;
            lifecycle.advance(state);
            self.publish(&interaction, lifecycle.state());
            return;
        };
        lifecycle.advance(InteractionState::Dispatched);

        let ctx = HandlerContext::new(
            Arc::clone(self.config.bot_name()),
            received_at,
            self.config.followup_timeout(),
        );
        let run = AssertUnwindSafe(handler.handle(&reply, &interaction, &ctx)).catch_unwind();
        let outcome = match timeout_at(ctx.deadline, run).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(anyhow!("handler panicked")),
            Err(_) => Err(anyhow!(
                "handler did not finish within {}s",
                self.config.followup_timeout().as_secs()
            )),
        };

        let state = self.reporter.settle(outcome, &reply, &interaction).await;
        lifecycle.advance(state);
        info!(
            interaction_id = %interaction.id,
            command = %interaction.command_name,
            state = %state,
            elapsed_ms = received_at.elapsed().as_millis() as u64,
            "Interaction settled"
        );
        self.publish(&interaction, lifecycle.state());
    }

    fn publish(&self, interaction: &Interaction, state: InteractionState) {
        // No subscribers is the normal case outside tests.
        let _ = self.settled.send(SettledInteraction {
            interaction_id: interaction.id.clone(),
            command: interaction.command_name.clone(),
            state,
        });
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Fires when dropped, which for a response body means hyper is done with it.
struct AckGuard(Option<oneshot::Sender<()>>);

impl Drop for AckGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

fn deferred_response(payload: Vec<u8>, guard: AckGuard) -> Response {
    let len = payload.len();
    let chunks = stream::once(async move { Ok::<_, Infallible>(Bytes::from(payload)) }).map(
        move |chunk| {
            let _held = &guard;
            chunk
        },
    );

    let mut response = Response::new(Body::from_stream(chunks));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    response
}
