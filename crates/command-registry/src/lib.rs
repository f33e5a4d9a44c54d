//! Command registration for the chat platform.
//!
//! Install mode upserts every declared command by name, which the platform
//! treats as an overwrite, so running it twice leaves the same set behind.
//! Teardown lists what is registered and deletes each entry, logging failures
//! instead of stopping.

mod api;
mod error;
mod registry;

pub use api::{CommandRegistrationApi, DiscordCommandApi};
pub use error::{RegistrationError, RegistrationResult};
pub use registry::{CommandRegistry, SyncMode, SyncReport};
