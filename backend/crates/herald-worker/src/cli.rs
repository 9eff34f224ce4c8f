use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "herald-worker")]
#[command(about = "Registers with a herald broker and confirms every broadcast push")]
#[command(version)]
pub struct Cli {
    /// Broker host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Broker port
    #[arg(long, default_value_t = 7700)]
    pub port: u16,

    /// Worker name to register under (a fresh UUID when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Time spent processing each push before confirming it
    #[arg(long, default_value_t = 1000)]
    pub process_delay_ms: u64,

    /// Log level written to stderr
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl Cli {
    pub fn worker_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub fn process_delay(&self) -> Duration {
        Duration::from_millis(self.process_delay_ms)
    }
}
