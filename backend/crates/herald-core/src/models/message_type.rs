use crate::{CoreError, CoreResult};

use herald_proto::WireMessageType;

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Heartbeat,
    Registered,
    ServerPush,
    Response,
    Deregister,
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "HEARTBEAT",
            Self::Registered => "REGISTERED",
            Self::ServerPush => "SERVER_PUSH",
            Self::Response => "RESPONSE",
            Self::Deregister => "DEREGISTER",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "HEARTBEAT" => Ok(Self::Heartbeat),
            "REGISTERED" => Ok(Self::Registered),
            "SERVER_PUSH" => Ok(Self::ServerPush),
            "RESPONSE" => Ok(Self::Response),
            "DEREGISTER" => Ok(Self::Deregister),
            _ => Err(CoreError::InvalidMessageType {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl From<MessageType> for WireMessageType {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Heartbeat => WireMessageType::Heartbeat,
            MessageType::Registered => WireMessageType::Registered,
            MessageType::ServerPush => WireMessageType::ServerPush,
            MessageType::Response => WireMessageType::Response,
            MessageType::Deregister => WireMessageType::Deregister,
        }
    }
}

impl TryFrom<WireMessageType> for MessageType {
    type Error = CoreError;

    #[track_caller]
    fn try_from(message_type: WireMessageType) -> CoreResult<Self> {
        match message_type {
            WireMessageType::Heartbeat => Ok(Self::Heartbeat),
            WireMessageType::Registered => Ok(Self::Registered),
            WireMessageType::ServerPush => Ok(Self::ServerPush),
            WireMessageType::Response => Ok(Self::Response),
            WireMessageType::Deregister => Ok(Self::Deregister),
            WireMessageType::Unspecified => Err(CoreError::InvalidMessageType {
                value: "UNSPECIFIED".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
