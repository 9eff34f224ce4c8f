use herald_config::Config;

use clap::Parser;

/// Startup overrides. Anything given here wins over `config.toml` and the
/// `HERALD_*` environment.
#[derive(Parser, Debug, Default)]
#[command(name = "herald-server")]
#[command(about = "Priority broadcast broker")]
#[command(version)]
pub struct Cli {
    /// Port to listen on (0 picks a free port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Messages generated on every tick
    #[arg(long)]
    pub messages_per_tick: Option<usize>,
}

impl Cli {
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(messages_per_tick) = self.messages_per_tick {
            config.generator.messages_per_tick = messages_per_tick;
        }
    }
}
