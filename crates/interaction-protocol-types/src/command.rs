//! Command descriptors as pushed to the platform's registration API.

use crate::DescriptorError;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

/// Declared type of a command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    String,
    Integer,
    Boolean,
}

impl ArgumentKind {
    /// Numeric option type used on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::String => 3,
            Self::Integer => 4,
            Self::Boolean => 5,
        }
    }
}

impl Serialize for ArgumentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Shape of one declared argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ArgumentKind,
    pub required: bool,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ArgumentKind::String)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ArgumentKind::Integer)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ArgumentKind::Boolean)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Declarative shape of one invocable command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "options", skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentSpec>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: Vec::new(),
        }
    }

    pub fn argument(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    /// Check the constraints the registration API enforces, so a bad
    /// descriptor fails at startup instead of halfway through an install.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if !is_valid_name(&self.name) {
            return Err(DescriptorError::InvalidName(self.name.clone()));
        }
        if !is_valid_description(&self.description) {
            return Err(DescriptorError::InvalidDescription(self.name.clone()));
        }

        let mut seen = HashSet::new();
        let mut optional_seen = false;
        for spec in &self.arguments {
            if !is_valid_name(&spec.name) {
                return Err(DescriptorError::InvalidName(spec.name.clone()));
            }
            if !is_valid_description(&spec.description) {
                return Err(DescriptorError::InvalidDescription(format!(
                    "{}/{}",
                    self.name, spec.name
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(DescriptorError::DuplicateArgument {
                    command: self.name.clone(),
                    argument: spec.name.clone(),
                });
            }
            if spec.required && optional_seen {
                return Err(DescriptorError::RequiredAfterOptional {
                    command: self.name.clone(),
                    argument: spec.name.clone(),
                });
            }
            optional_seen |= !spec.required;
        }
        Ok(())
    }
}

/// A command as the platform reports it back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredCommand {
    pub id: String,
    pub name: String,
}

fn is_valid_name(name: &str) -> bool {
    let len = name.chars().count();
    (1..=32).contains(&len)
        && name
            .chars()
            .all(|c| c == '-' || c == '_' || c.is_ascii_digit() || c.is_ascii_lowercase())
}

fn is_valid_description(description: &str) -> bool {
    let len = description.chars().count();
    (1..=100).contains(&len)
}
