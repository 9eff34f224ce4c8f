use herald_core::{CoreError, Message};

use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Priority buffer full ({capacity} messages) {location}")]
    CapacityExceeded {
        capacity: usize,
        /// The rejected message, handed back so the caller can spill it.
        message: Box<Message>,
        location: ErrorLocation,
    },

    #[error("Only SERVER_PUSH messages can be buffered, got {message_type} {location}")]
    NotPushMessage {
        message_type: String,
        location: ErrorLocation,
    },

    #[error("Overflow IO error on {path}: {source} {location}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Corrupt overflow entry {path}: {source} {location}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: CoreError,
        location: ErrorLocation,
    },
}

impl StoreError {
    #[track_caller]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Recover the message a full buffer refused.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::CapacityExceeded { message, .. } => Some(*message),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
