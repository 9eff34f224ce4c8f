//! Wire types for the herald broadcast protocol.
//!
//! Every frame on the wire is `[length:4 big-endian][payload:N]` where the
//! payload is a protobuf-encoded [`WireMessage`]. The same encoding (without
//! the length prefix) is used for spilled overflow files.

/// Size of the big-endian length prefix preceding each frame.
pub const FRAME_HEADER_LEN: usize = 4;

/// Maximum encoded payload size accepted by a reader (1 MiB).
///
/// Larger frames are treated as malformed framing and fault the connection.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// A single protocol message as it travels between server and worker.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WireMessage {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(enumeration = "WireMessageType", tag = "2")]
    pub message_type: i32,
    #[prost(enumeration = "WirePriority", optional, tag = "3")]
    pub priority: Option<i32>,
    #[prost(string, optional, tag = "4")]
    pub data: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum WireMessageType {
    Unspecified = 0,
    Heartbeat = 1,
    Registered = 2,
    ServerPush = 3,
    Response = 4,
    Deregister = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum WirePriority {
    Unspecified = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}
