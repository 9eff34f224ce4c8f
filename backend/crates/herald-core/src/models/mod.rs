pub mod message;
pub mod message_priority;
pub mod message_type;
