mod message;
mod message_priority;
mod message_type;
