//! The bot's commands: descriptors and their handlers.

mod generate;
mod version;

#[cfg(test)]
mod test_support;

pub use generate::{GenerateHandler, PROMPT_ARGUMENT};
pub use version::{build_identifier, VersionHandler};

use interaction_protocol_types::{ArgumentSpec, CommandDescriptor};

pub fn version_descriptor() -> CommandDescriptor {
    CommandDescriptor::new("version", "Show which build of the bot is running")
}

pub fn generate_descriptor() -> CommandDescriptor {
    CommandDescriptor::new("generate", "Generate an image from a text prompt").argument(
        ArgumentSpec::string(PROMPT_ARGUMENT, "What the image should show").required(),
    )
}

/// Every command this bot registers.
pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![version_descriptor(), generate_descriptor()]
}
