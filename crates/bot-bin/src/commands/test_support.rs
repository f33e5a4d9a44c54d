//! Fakes for exercising handlers through the error reporter.

use async_trait::async_trait;
use interaction_dispatcher::{
    AlertSink, CommandHandler, ErrorReporter, FollowupTransport, HandlerContext,
    InteractionState, OperatorAlert, ReplyResult, ReplySender,
};
use interaction_protocol_types::{FileAttachment, FollowupMessage, Interaction, InteractionToken};
use secret_client_factory::{SecretError, SecretRef, SecretResult, SecretStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(FollowupMessage, Vec<FileAttachment>)>>,
}

impl RecordingTransport {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(message, _)| message.content.clone())
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.sent.lock().unwrap().iter().map(|(_, f)| f.len()).sum()
    }
}

#[async_trait]
impl FollowupTransport for RecordingTransport {
    async fn send(
        &self,
        _token: &InteractionToken,
        message: &FollowupMessage,
        files: &[FileAttachment],
    ) -> ReplyResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((message.clone(), files.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAlertSink(pub Mutex<Vec<OperatorAlert>>);

impl AlertSink for MemoryAlertSink {
    fn alert(&self, alert: OperatorAlert) {
        self.0.lock().unwrap().push(alert);
    }
}

/// Secret store holding one value, counting reads.
pub struct StaticSecret {
    pub value: String,
    pub reads: AtomicUsize,
    pub unavailable: bool,
}

impl StaticSecret {
    pub fn new(value: &str) -> Arc<Self> {
        Arc::new(Self {
            value: value.to_string(),
            reads: AtomicUsize::new(0),
            unavailable: false,
        })
    }

    /// Store that answers every read with a 503.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            value: String::new(),
            reads: AtomicUsize::new(0),
            unavailable: true,
        })
    }
}

#[async_trait]
impl SecretStore for StaticSecret {
    async fn access_latest(&self, secret: &SecretRef) -> SecretResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(SecretError::Status {
                status: 503,
                secret: secret.to_string(),
            });
        }
        Ok(self.value.clone())
    }
}

pub fn command(name: &str, options: serde_json::Value) -> Interaction {
    let body = json!({
        "id": "int-1",
        "type": 2,
        "token": "tok",
        "data": {"name": name, "options": options}
    });
    Interaction::from_slice(body.to_string().as_bytes()).unwrap()
}

pub struct Outcome {
    pub state: InteractionState,
    pub transport: Arc<RecordingTransport>,
    pub alerts: Vec<OperatorAlert>,
}

/// Run a handler the way the dispatcher does and settle its outcome.
pub async fn run(handler: &dyn CommandHandler, interaction: &Interaction) -> Outcome {
    let transport = Arc::new(RecordingTransport::default());
    let sink = Arc::new(MemoryAlertSink::default());
    let reporter = ErrorReporter::new(Arc::from("imagebot"), sink.clone());
    let reply = ReplySender::new(transport.clone(), interaction.token.clone());
    let ctx = HandlerContext::new(Arc::from("imagebot"), Instant::now(), Duration::from_secs(60));

    let result = handler.handle(&reply, interaction, &ctx).await;
    let state = reporter.settle(result, &reply, interaction).await;
    let alerts = sink.0.lock().unwrap().clone();
    Outcome {
        state,
        transport,
        alerts,
    }
}
