pub mod cli;
pub mod error;
pub mod logger;


pub use cli::Cli;
pub use error::{Result as ServerResult, ServerError};
