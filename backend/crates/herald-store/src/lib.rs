pub mod error;
pub mod overflow_store;
pub mod priority_buffer;


pub use error::{Result, StoreError};
pub use overflow_store::OverflowStore;
pub use priority_buffer::PriorityBuffer;
