//! Per-request lifecycle.

use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Where one interaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Received,
    Verified,
    Acked,
    Dispatched,
    Responded,
    Escalated,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid interaction transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: InteractionState,
    pub to: InteractionState,
}

impl InteractionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Responded | Self::Escalated)
    }

    /// Move to `next` if the edge exists.
    ///
    /// Pings go straight from `Verified` to `Responded`. A payload that fails
    /// to parse goes from `Verified` to `Escalated`, and a command with no
    /// binding goes from `Acked` to `Escalated`.
    pub fn advance(self, next: Self) -> Result<Self, InvalidTransition> {
        use InteractionState::*;
        let allowed = matches!(
            (self, next),
            (Received, Verified)
                | (Verified, Responded)
                | (Verified, Acked)
                | (Verified, Escalated)
                | (Acked, Dispatched)
                | (Acked, Escalated)
                | (Dispatched, Responded)
                | (Dispatched, Escalated)
        );
        if allowed {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Verified => "verified",
            Self::Acked => "acked",
            Self::Dispatched => "dispatched",
            Self::Responded => "responded",
            Self::Escalated => "escalated",
        };
        f.write_str(name)
    }
}

/// Traced state holder for one request.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    request_id: String,
    state: InteractionState,
}

impl Lifecycle {
    pub(crate) fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: InteractionState::Received,
        }
    }

    pub(crate) fn state(&self) -> InteractionState {
        self.state
    }

    /// The id is unknown until the payload parses.
    pub(crate) fn set_request_id(&mut self, request_id: impl Into<String>) {
        self.request_id = request_id.into();
    }

    pub(crate) fn advance(&mut self, next: InteractionState) {
        match self.state.advance(next) {
            Ok(state) => {
                debug!(interaction_id = %self.request_id, from = %self.state, to = %state, "Interaction state changed");
                self.state = state;
            }
            Err(e) => warn!(interaction_id = %self.request_id, error = %e, "Rejected state change"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InteractionState::*;
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[test]
    fn command_path_is_allowed() {
        let state = Received
            .advance(Verified)
            .and_then(|s| s.advance(Acked))
            .and_then(|s| s.advance(Dispatched))
            .and_then(|s| s.advance(Responded))
            .unwrap();
        assert_eq!(state, Responded);
        assert!(state.is_terminal());
    }

    #[test]
    fn ping_skips_dispatch() {
        assert_eq!(Verified.advance(Responded), Ok(Responded));
    }

    #[test]
    fn cannot_skip_verification_or_ack() {
        assert!(Received.advance(Acked).is_err());
        assert!(Received.advance(Responded).is_err());
        assert!(Verified.advance(Dispatched).is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        for next in [Received, Verified, Acked, Dispatched, Responded, Escalated] {
            assert!(Responded.advance(next).is_err());
            assert!(Escalated.advance(next).is_err());
        }
    }

    #[test]
    fn lifecycle_ignores_invalid_edges() {
        let mut lifecycle = Lifecycle::new("1");
        lifecycle.advance(Dispatched);
        assert_eq!(lifecycle.state(), Received);
        lifecycle.advance(Verified);
        assert_eq!(lifecycle.state(), Verified);
    }

    /// Records the level of every event.
    #[derive(Clone, Default)]
    struct Levels(Arc<Mutex<Vec<Level>>>);

    impl<S: Subscriber> Layer<S> for Levels {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[test]
    fn rejected_edge_never_logs_at_error() {
        let levels = Levels::default();
        let subscriber = tracing_subscriber::registry().with(levels.clone());

        tracing::subscriber::with_default(subscriber, || {
            let mut lifecycle = Lifecycle::new("1");
            lifecycle.advance(Escalated);
        });

        let seen = levels.0.lock().unwrap().clone();
        assert_eq!(seen, [Level::WARN]);
    }
}
