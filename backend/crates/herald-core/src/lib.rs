pub mod error;
pub mod models;

#[cfg(test)]
mod tests;

pub use error::{CoreError, CoreResult};
pub use models::message::Message;
pub use models::message_priority::MessagePriority;
pub use models::message_type::MessageType;
