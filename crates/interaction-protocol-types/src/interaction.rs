//! Inbound interaction payloads.

use crate::ParseError;
use serde::Deserialize;
use std::fmt;

const TYPE_PING: u8 = 1;
const TYPE_APPLICATION_COMMAND: u8 = 2;

const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;
const OPTION_BOOLEAN: u8 = 5;

/// What the platform is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Liveness probe; answered synchronously.
    Ping,
    /// A user invoked one of the bot's commands.
    ApplicationCommand,
}

/// Whether the deferred acknowledgment has gone out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    Pending,
    Acknowledged,
}

/// Typed value of one command argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

/// One named argument, in the order the platform sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ArgumentValue,
}

/// Short-lived credential for follow-up calls. Redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct InteractionToken(String);

impl InteractionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InteractionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InteractionToken(..)")
    }
}

/// One inbound command invocation (or liveness probe).
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: String,
    pub kind: InteractionKind,
    /// Empty for pings.
    pub command_name: String,
    pub arguments: Vec<Argument>,
    pub token: InteractionToken,
    pub user_id: Option<String>,
    ack: AckState,
}

#[derive(Deserialize)]
struct RawInteraction {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    token: String,
    #[serde(default)]
    data: Option<RawCommandData>,
    #[serde(default)]
    member: Option<RawMember>,
    #[serde(default)]
    user: Option<RawUser>,
}

#[derive(Deserialize)]
struct RawCommandData {
    name: String,
    #[serde(default)]
    options: Vec<RawOption>,
}

#[derive(Deserialize)]
struct RawOption {
    name: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawMember {
    user: Option<RawUser>,
}

#[derive(Deserialize)]
struct RawUser {
    id: String,
}

impl Interaction {
    /// Parse the raw request body. Call only after the signature has been
    /// verified over these exact bytes.
    pub fn from_slice(body: &[u8]) -> Result<Self, ParseError> {
        let raw: RawInteraction =
            serde_json::from_slice(body).map_err(|e| ParseError::Malformed(e.to_string()))?;

        if raw.id.trim().is_empty() {
            return Err(ParseError::MissingField("id"));
        }

        let user_id = raw
            .member
            .and_then(|member| member.user)
            .or(raw.user)
            .map(|user| user.id);

        match raw.kind {
            TYPE_PING => Ok(Self {
                id: raw.id,
                kind: InteractionKind::Ping,
                command_name: String::new(),
                arguments: Vec::new(),
                token: InteractionToken::new(raw.token),
                user_id,
                ack: AckState::Pending,
            }),
            TYPE_APPLICATION_COMMAND => {
                let data = raw.data.ok_or(ParseError::MissingField("data"))?;
                if data.name.trim().is_empty() {
                    return Err(ParseError::MissingField("data.name"));
                }
                if raw.token.trim().is_empty() {
                    return Err(ParseError::MissingField("token"));
                }
                let arguments = data
                    .options
                    .into_iter()
                    .map(parse_option)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self {
                    id: raw.id,
                    kind: InteractionKind::ApplicationCommand,
                    command_name: data.name,
                    arguments,
                    token: InteractionToken::new(raw.token),
                    user_id,
                    ack: AckState::Pending,
                })
            }
            other => Err(ParseError::UnsupportedType(other)),
        }
    }

    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    /// Look up a string argument by name.
    pub fn string_argument(&self, name: &str) -> Option<&str> {
        match self.argument(name) {
            Some(ArgumentValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn ack_state(&self) -> AckState {
        self.ack
    }

    /// Flip to acknowledged. Returns false if it already was.
    pub fn acknowledge(&mut self) -> bool {
        match self.ack {
            AckState::Pending => {
                self.ack = AckState::Acknowledged;
                true
            }
            AckState::Acknowledged => false,
        }
    }
}

fn parse_option(option: RawOption) -> Result<Argument, ParseError> {
    let invalid = || ParseError::InvalidArgument(option.name.clone());
    let value = match option.kind {
        OPTION_STRING => option
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .map(|s| ArgumentValue::String(s.to_string()))
            .ok_or_else(invalid)?,
        OPTION_INTEGER => option
            .value
            .as_ref()
            .and_then(|v| v.as_i64())
            .map(ArgumentValue::Integer)
            .ok_or_else(invalid)?,
        OPTION_BOOLEAN => option
            .value
            .as_ref()
            .and_then(|v| v.as_bool())
            .map(ArgumentValue::Boolean)
            .ok_or_else(invalid)?,
        kind => {
            return Err(ParseError::UnsupportedArgumentType {
                name: option.name,
                kind,
            })
        }
    };
    Ok(Argument {
        name: option.name,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn command_payload() -> serde_json::Value {
        json!({
            "id": "1100",
            "application_id": "42",
            "type": 2,
            "token": "tok-abc",
            "member": {"user": {"id": "u-7"}},
            "data": {
                "id": "cmd-1",
                "name": "generate",
                "options": [
                    {"name": "image-prompt", "type": 3, "value": "a red cube"},
                    {"name": "count", "type": 4, "value": 2},
                    {"name": "private", "type": 5, "value": true}
                ]
            }
        })
    }

    #[test]
    fn parses_ping() {
        let interaction = Interaction::from_slice(br#"{"id":"1","type":1}"#).unwrap();
        assert_eq!(interaction.kind, InteractionKind::Ping);
        assert!(interaction.command_name.is_empty());
        assert_eq!(interaction.ack_state(), AckState::Pending);
    }

    #[test]
    fn parses_command_with_ordered_typed_arguments() {
        let body = command_payload().to_string();
        let interaction = Interaction::from_slice(body.as_bytes()).unwrap();

        assert_eq!(interaction.kind, InteractionKind::ApplicationCommand);
        assert_eq!(interaction.command_name, "generate");
        assert_eq!(interaction.user_id.as_deref(), Some("u-7"));
        assert_eq!(interaction.token.expose(), "tok-abc");

        let names: Vec<_> = interaction.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["image-prompt", "count", "private"]);
        assert_eq!(interaction.string_argument("image-prompt"), Some("a red cube"));
        assert_eq!(
            interaction.argument("count"),
            Some(&ArgumentValue::Integer(2))
        );
        assert_eq!(
            interaction.argument("private"),
            Some(&ArgumentValue::Boolean(true))
        );
        assert_eq!(interaction.string_argument("count"), None);
    }

    #[test]
    fn user_id_falls_back_to_top_level_user() {
        let body = json!({
            "id": "1", "type": 2, "token": "t",
            "user": {"id": "dm-user"},
            "data": {"name": "version"}
        });
        let interaction = Interaction::from_slice(body.to_string().as_bytes()).unwrap();
        assert_eq!(interaction.user_id.as_deref(), Some("dm-user"));
        assert!(interaction.arguments.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Interaction::from_slice(b"{not json"),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unknown_interaction_type() {
        let err = Interaction::from_slice(br#"{"id":"1","type":3,"token":"t"}"#).unwrap_err();
        assert_eq!(err, ParseError::UnsupportedType(3));
    }

    #[test]
    fn rejects_command_without_data_or_token() {
        let err = Interaction::from_slice(br#"{"id":"1","type":2,"token":"t"}"#).unwrap_err();
        assert_eq!(err, ParseError::MissingField("data"));

        let err = Interaction::from_slice(br#"{"id":"1","type":2,"data":{"name":"version"}}"#)
            .unwrap_err();
        assert_eq!(err, ParseError::MissingField("token"));
    }

    #[test]
    fn rejects_mistyped_argument() {
        let body = json!({
            "id": "1", "type": 2, "token": "t",
            "data": {"name": "generate", "options": [{"name": "count", "type": 4, "value": "two"}]}
        });
        let err = Interaction::from_slice(body.to_string().as_bytes()).unwrap_err();
        assert_eq!(err, ParseError::InvalidArgument("count".to_string()));
    }

    #[test]
    fn rejects_subcommand_arguments() {
        let body = json!({
            "id": "1", "type": 2, "token": "t",
            "data": {"name": "admin", "options": [{"name": "reset", "type": 1}]}
        });
        let err = Interaction::from_slice(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedArgumentType { kind: 1, .. }));
    }

    #[test]
    fn acknowledge_flips_once() {
        let mut interaction = Interaction::from_slice(br#"{"id":"1","type":1}"#).unwrap();
        assert!(interaction.acknowledge());
        assert!(!interaction.acknowledge());
        assert_eq!(interaction.ack_state(), AckState::Acknowledged);
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let token = InteractionToken::new("very-secret");
        assert!(!format!("{token:?}").contains("very-secret"));
    }
}
