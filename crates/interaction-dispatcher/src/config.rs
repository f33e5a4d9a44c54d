//! Bot runtime configuration.

use crate::{AlertSink, CommandHandler, TracingAlertSink};
use interaction_protocol_types::{CommandDescriptor, DescriptorError};
use signature_verifier::SignatureVerifier;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How long a follow-up token stays usable.
pub const DEFAULT_FOLLOWUP_TIMEOUT: Duration = Duration::from_secs(14 * 60);

/// Largest accepted request body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeConfigError {
    #[error("command declared twice: {0}")]
    DuplicateCommand(String),

    #[error("handler bound twice: {0}")]
    DuplicateBinding(String),

    #[error("command has no handler: {0}")]
    MissingBinding(String),

    #[error("handler bound to undeclared command: {0}")]
    UnknownBinding(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("follow-up timeout must be non-zero")]
    ZeroTimeout,
}

/// Command name to handler.
#[derive(Clone, Default)]
pub struct HandlerBindings {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerBindings {
    pub fn get(&self, command: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.handlers.get(command)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Everything one bot deployment needs, built once at startup.
pub struct BotRuntimeConfig {
    bot_name: Arc<str>,
    application_id: String,
    verifier: SignatureVerifier,
    commands: Vec<CommandDescriptor>,
    bindings: HandlerBindings,
    port: u16,
    secret_id: String,
    alert_sink: Arc<dyn AlertSink>,
    followup_timeout: Duration,
    max_body_bytes: usize,
}

impl BotRuntimeConfig {
    pub fn builder(
        bot_name: impl Into<String>,
        application_id: impl Into<String>,
        verifier: SignatureVerifier,
    ) -> BotRuntimeConfigBuilder {
        BotRuntimeConfigBuilder {
            bot_name: bot_name.into(),
            application_id: application_id.into(),
            verifier,
            commands: Vec::new(),
            bindings: Vec::new(),
            port: 8080,
            secret_id: String::new(),
            alert_sink: Arc::new(TracingAlertSink),
            followup_timeout: DEFAULT_FOLLOWUP_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn bot_name(&self) -> &Arc<str> {
        &self.bot_name
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub fn commands(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    pub fn bindings(&self) -> &HandlerBindings {
        &self.bindings
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub fn alert_sink(&self) -> &Arc<dyn AlertSink> {
        &self.alert_sink
    }

    pub fn followup_timeout(&self) -> Duration {
        self.followup_timeout
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

pub struct BotRuntimeConfigBuilder {
    bot_name: String,
    application_id: String,
    verifier: SignatureVerifier,
    commands: Vec<CommandDescriptor>,
    bindings: Vec<(String, Arc<dyn CommandHandler>)>,
    port: u16,
    secret_id: String,
    alert_sink: Arc<dyn AlertSink>,
    followup_timeout: Duration,
    max_body_bytes: usize,
}

impl BotRuntimeConfigBuilder {
    /// Declare a command and bind its handler.
    pub fn command(self, descriptor: CommandDescriptor, handler: Arc<dyn CommandHandler>) -> Self {
        let name = descriptor.name.clone();
        self.descriptor(descriptor).bind(name, handler)
    }

    /// Declare a command without binding it.
    pub fn descriptor(mut self, descriptor: CommandDescriptor) -> Self {
        self.commands.push(descriptor);
        self
    }

    /// Bind a handler to a command name.
    pub fn bind(mut self, command: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        self.bindings.push((command.into(), handler));
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn secret_id(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = secret_id.into();
        self
    }

    pub fn alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = sink;
        self
    }

    pub fn followup_timeout(mut self, timeout: Duration) -> Self {
        self.followup_timeout = timeout;
        self
    }

    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Check that descriptors and bindings pair up one to one.
    pub fn build(self) -> Result<BotRuntimeConfig, RuntimeConfigError> {
        if self.followup_timeout.is_zero() {
            return Err(RuntimeConfigError::ZeroTimeout);
        }

        let mut declared = HashSet::new();
        for descriptor in &self.commands {
            descriptor.validate()?;
            if !declared.insert(descriptor.name.as_str()) {
                return Err(RuntimeConfigError::DuplicateCommand(descriptor.name.clone()));
            }
        }

        let mut handlers = HashMap::new();
        for (command, handler) in self.bindings {
            if !declared.contains(command.as_str()) {
                return Err(RuntimeConfigError::UnknownBinding(command));
            }
            if handlers.contains_key(&command) {
                return Err(RuntimeConfigError::DuplicateBinding(command));
            }
            handlers.insert(command, handler);
        }

        if let Some(unbound) = self
            .commands
            .iter()
            .find(|descriptor| !handlers.contains_key(&descriptor.name))
        {
            return Err(RuntimeConfigError::MissingBinding(unbound.name.clone()));
        }

        Ok(BotRuntimeConfig {
            bot_name: Arc::from(self.bot_name),
            application_id: self.application_id,
            verifier: self.verifier,
            commands: self.commands,
            bindings: HandlerBindings { handlers },
            port: self.port,
            secret_id: self.secret_id,
            alert_sink: self.alert_sink,
            followup_timeout: self.followup_timeout,
            max_body_bytes: self.max_body_bytes,
        })
    }
}
