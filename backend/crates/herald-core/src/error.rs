use std::panic::Location;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid message type: {value} {location}")]
    InvalidMessageType {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid message priority: {value} {location}")]
    InvalidPriority {
        value: String,
        location: ErrorLocation,
    },

    #[error("Malformed message: {message} {location}")]
    MalformedMessage {
        message: String,
        location: ErrorLocation,
    },

    #[error("Protobuf decode failed: {source} {location}")]
    Decode {
        #[source]
        source: prost::DecodeError,
        location: ErrorLocation,
    },
}

impl CoreError {
    #[track_caller]
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedMessage {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<prost::DecodeError> for CoreError {
    #[track_caller]
    fn from(source: prost::DecodeError) -> Self {
        Self::Decode {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type CoreResult<T> = StdResult<T, CoreError>;
