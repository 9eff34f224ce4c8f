use crate::{CoreError, CoreResult, MessagePriority, MessageType};

use herald_proto::{WireMessage, WireMessageType, WirePriority};

use std::fmt;
use std::panic::Location;

use error_location::ErrorLocation;
use prost::Message as _;
use uuid::Uuid;

/// An immutable protocol message.
///
/// The id is assigned once at construction and travels unchanged through the
/// wire encoding and the overflow store. Only `SERVER_PUSH` messages carry a
/// priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: String,
    message_type: MessageType,
    priority: Option<MessagePriority>,
    data: Option<String>,
}

impl Message {
    /// A control message without payload (`HEARTBEAT`, `REGISTERED`, `DEREGISTER`).
    pub fn new(message_type: MessageType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message_type,
            priority: None,
            data: None,
        }
    }

    pub fn with_data(message_type: MessageType, data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::new(message_type)
        }
    }

    pub fn server_push(priority: MessagePriority, data: impl Into<String>) -> Self {
        Self {
            priority: Some(priority),
            data: Some(data.into()),
            ..Self::new(MessageType::ServerPush)
        }
    }

    /// Synthetic push with a random priority and a fresh payload.
    pub fn generate() -> Self {
        Self::server_push(MessagePriority::random(), Uuid::new_v4().to_string())
    }

    /// Confirmation of a delivered push, echoing its id.
    pub fn response(original_id: &str) -> Self {
        Self::with_data(MessageType::Response, original_id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn priority(&self) -> Option<MessagePriority> {
        self.priority
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn is_type(&self, message_type: MessageType) -> bool {
        self.message_type == message_type
    }

    /// Encode as a protobuf payload (no length prefix).
    pub fn encode(&self) -> Vec<u8> {
        WireMessage::from(self).encode_to_vec()
    }

    /// Decode a protobuf payload produced by [`Message::encode`].
    #[track_caller]
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let wire = WireMessage::decode(bytes)?;
        Self::try_from(wire)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message{{id='{}', type={}, priority={}, data='{}'}}",
            self.id,
            self.message_type,
            self.priority.map(|p| p.as_str().to_string()).unwrap_or_else(|| "none".into()),
            self.data.as_deref().unwrap_or("")
        )
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        WireMessage {
            id: message.id.clone(),
            message_type: WireMessageType::from(message.message_type) as i32,
            priority: message.priority.map(|p| WirePriority::from(p) as i32),
            data: message.data.clone(),
        }
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = CoreError;

    #[track_caller]
    fn try_from(wire: WireMessage) -> CoreResult<Self> {
        if wire.id.is_empty() {
            return Err(CoreError::malformed("message id is empty"));
        }

        let message_type = WireMessageType::try_from(wire.message_type)
            .map_err(|_| CoreError::InvalidMessageType {
                value: wire.message_type.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
            .and_then(MessageType::try_from)?;

        let priority = match wire.priority {
            Some(raw) => Some(
                WirePriority::try_from(raw)
                    .map_err(|_| CoreError::InvalidPriority {
                        value: raw.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    })
                    .and_then(MessagePriority::try_from)?,
            ),
            None => None,
        };

        match (message_type, priority) {
            (MessageType::ServerPush, None) => {
                return Err(CoreError::malformed("SERVER_PUSH without priority"));
            }
            (other, Some(_)) if other != MessageType::ServerPush => {
                return Err(CoreError::malformed(format!(
                    "{other} must not carry a priority"
                )));
            }
            _ => {}
        }

        Ok(Self {
            id: wire.id,
            message_type,
            priority,
            data: wire.data,
        })
    }
}
