use crate::Cli;

use std::time::Duration;

use clap::Parser;
use log::LevelFilter;

#[test]
fn given_no_arguments_when_parsed_then_defaults_apply() {
    let cli = Cli::try_parse_from(["herald-worker"]).unwrap();

    assert_eq!(cli.host, "127.0.0.1");
    assert_eq!(cli.port, 7700);
    assert_eq!(cli.process_delay(), Duration::from_secs(1));
    assert_eq!(cli.log_level, LevelFilter::Info);
    assert!(cli.name.is_none());
}

#[test]
fn given_flags_when_parsed_then_they_override_defaults() {
    let cli = Cli::try_parse_from([
        "herald-worker",
        "--host",
        "10.0.0.5",
        "--port",
        "9000",
        "--name",
        "alpha",
        "--process-delay-ms",
        "25",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert_eq!(cli.host, "10.0.0.5");
    assert_eq!(cli.port, 9000);
    assert_eq!(cli.worker_name(), "alpha");
    assert_eq!(cli.process_delay(), Duration::from_millis(25));
    assert_eq!(cli.log_level, LevelFilter::Debug);
}

#[test]
fn given_no_name_when_worker_name_then_fresh_uuid_each_time() {
    let cli = Cli::try_parse_from(["herald-worker"]).unwrap();

    let first = cli.worker_name();
    let second = cli.worker_name();

    assert!(uuid::Uuid::parse_str(&first).is_ok());
    assert_ne!(first, second);
}

#[test]
fn given_port_out_of_range_when_parsed_then_rejected() {
    let result = Cli::try_parse_from(["herald-worker", "--port", "70000"]);

    assert!(result.is_err());
}
