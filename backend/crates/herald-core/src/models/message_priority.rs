use crate::{CoreError, CoreResult};

use herald_proto::WirePriority;

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;

/// Delivery priority of a `SERVER_PUSH` message.
///
/// Ordering follows the numeric rank: `High` sorts before `Medium` before `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MessagePriority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl MessagePriority {
    pub const ALL: [MessagePriority; 3] = [Self::High, Self::Medium, Self::Low];

    /// Numeric rank, lower is more urgent.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Pick a priority uniformly at random.
    pub fn random() -> Self {
        Self::ALL[rand::random_range(0..Self::ALL.len())]
    }

    #[track_caller]
    pub fn from_rank(rank: u8) -> CoreResult<Self> {
        match rank {
            1 => Ok(Self::High),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Low),
            _ => Err(CoreError::InvalidPriority {
                value: rank.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessagePriority {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            _ => Err(CoreError::InvalidPriority {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl From<MessagePriority> for WirePriority {
    fn from(priority: MessagePriority) -> Self {
        match priority {
            MessagePriority::High => WirePriority::High,
            MessagePriority::Medium => WirePriority::Medium,
            MessagePriority::Low => WirePriority::Low,
        }
    }
}

impl TryFrom<WirePriority> for MessagePriority {
    type Error = CoreError;

    #[track_caller]
    fn try_from(priority: WirePriority) -> CoreResult<Self> {
        match priority {
            WirePriority::High => Ok(Self::High),
            WirePriority::Medium => Ok(Self::Medium),
            WirePriority::Low => Ok(Self::Low),
            WirePriority::Unspecified => Err(CoreError::InvalidPriority {
                value: "UNSPECIFIED".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
