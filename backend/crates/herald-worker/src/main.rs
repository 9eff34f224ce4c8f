//! herald-worker - a worker for the herald broker
//!
//! Connects to a broker, registers under a name, and prints every pushed
//! message before confirming it. Ctrl+C deregisters and exits.
//!
//! ```bash
//! herald-worker --port 7700 --name alpha --process-delay-ms 250
//! ```

use herald_worker::{Cli, WorkerClient};

use std::process::ExitCode;
use std::time::SystemTime;

use clap::Parser;
use fern::Dispatch;
use log::{LevelFilter, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = initialize_logger(cli.log_level) {
        eprintln!("Failed to initialize logger: {e}");
        return ExitCode::FAILURE;
    }

    let client = match WorkerClient::connect(
        &cli.host,
        cli.port,
        cli.worker_name(),
        cli.process_delay(),
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = client.handshake().await {
        error!("Handshake failed: {e}");
        return ExitCode::FAILURE;
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received");
    };

    match client.run(shutdown).await {
        Ok(processed) => {
            info!("Worker '{}' stopped after {processed} push(es)", client.name());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only echoed pushes.
fn initialize_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message}",
                date = humantime::format_rfc3339_seconds(SystemTime::now()),
                level = record.level(),
            ))
        })
        .chain(std::io::stderr())
        .apply()
}
