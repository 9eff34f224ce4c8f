use herald_config::ConfigError;
use herald_core::{CoreError, MessageType};
use herald_store::StoreError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Connection closed: {reason} {location}")]
    ConnectionClosed {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Connection IO failed: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Frame of {size} bytes exceeds limit of {max} {location}")]
    FrameTooLarge {
        size: usize,
        max: usize,
        location: ErrorLocation,
    },

    #[error("Malformed frame: {source} {location}")]
    MalformedFrame {
        #[source]
        source: CoreError,
        location: ErrorLocation,
    },

    #[error("Unexpected {actual} message, expected {expected} {location}")]
    UnexpectedMessageType {
        expected: &'static str,
        actual: MessageType,
        location: ErrorLocation,
    },

    #[error("Registration of '{name}' rejected: {reason} {location}")]
    HandshakeRejected {
        name: String,
        reason: &'static str,
        location: ErrorLocation,
    },

    #[error("Failed to bind {addr}: {source} {location}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Listener failed: {source} {location}")]
    Listener {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Store error: {source}")]
    Store {
        #[source]
        source: StoreError,
        location: ErrorLocation,
    },

    #[error("Config error: {source}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },
}

impl BrokerError {
    #[track_caller]
    pub fn closed<S: Into<String>>(reason: S) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unexpected(expected: &'static str, actual: MessageType) -> Self {
        Self::UnexpectedMessageType {
            expected,
            actual,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn rejected(name: impl Into<String>, reason: &'static str) -> Self {
        Self::HandshakeRejected {
            name: name.into(),
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionClosed { .. } => "CONNECTION_CLOSED",
            Self::Io { .. } => "CONNECTION_IO",
            Self::FrameTooLarge { .. } => "FRAME_TOO_LARGE",
            Self::MalformedFrame { .. } => "MALFORMED_FRAME",
            Self::UnexpectedMessageType { .. } => "UNEXPECTED_MESSAGE_TYPE",
            Self::HandshakeRejected { .. } => "HANDSHAKE_REJECTED",
            Self::Bind { .. } => "BIND_FAILED",
            Self::Listener { .. } => "LISTENER_FAILED",
            Self::Store { .. } => "STORE_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Errors that leave the connection unusable; the worker must be removed.
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed { .. }
                | Self::Io { .. }
                | Self::FrameTooLarge { .. }
                | Self::MalformedFrame { .. }
                | Self::UnexpectedMessageType { .. }
        )
    }
}

impl From<std::io::Error> for BrokerError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for BrokerError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        Self::MalformedFrame {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<StoreError> for BrokerError {
    #[track_caller]
    fn from(source: StoreError) -> Self {
        Self::Store {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for BrokerError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;
