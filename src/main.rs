use std::process::ExitCode;

use clap::Parser;
use hbnb_lib::config::StorageConfig;
use hbnb_lib::console::{execute, Cli};
use hbnb_lib::storage::init_storage;
use hbnb_lib::AppResult;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("** {err} **");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> AppResult<String> {
    let config = StorageConfig::from_env()?;
    let storage = init_storage(&config)?;
    execute(&cli.command, storage)
}
