pub mod client;
pub mod error;

pub use client::{WorkerClient, echo_line};
pub use error::{Result as WorkerClientResult, WorkerError};
