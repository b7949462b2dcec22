//! Command-line entry point of `ringcsv-split`.

use std::process::ExitCode;

use clap::Parser;
use ringcsv_split::{Cli, run};
use tracing::Level;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(summary) => {
            println!("{summary}");
            println!("OK, totals match");
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let Some(summary) = err.summary() {
                println!("{summary}");
            }
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
