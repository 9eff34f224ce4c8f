use herald_broker::BrokerError;
use herald_core::MessageType;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors raised by the worker side of the protocol
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to connect to {addr}: {source} {location}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Broker connection failed: {source}")]
    Broker {
        #[source]
        source: BrokerError,
        location: ErrorLocation,
    },

    #[error("Unexpected {actual} message, expected {expected} {location}")]
    UnexpectedMessageType {
        expected: &'static str,
        actual: MessageType,
        location: ErrorLocation,
    },
}

impl WorkerError {
    #[track_caller]
    pub fn connect(addr: impl Into<String>, source: std::io::Error) -> Self {
        WorkerError::Connect {
            addr: addr.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unexpected(expected: &'static str, actual: MessageType) -> Self {
        WorkerError::UnexpectedMessageType {
            expected,
            actual,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<BrokerError> for WorkerError {
    #[track_caller]
    fn from(source: BrokerError) -> Self {
        WorkerError::Broker {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
