//! herald-worker library
//!
//! Exports the worker client so tests and other crates can drive real workers.

pub mod cli;
pub mod client;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use client::{WorkerClient, WorkerClientResult, WorkerError, echo_line};
