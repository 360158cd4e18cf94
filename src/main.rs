// ABOUTME: CLI entrypoint for the drivectl command
// ABOUTME: Uniform error handling: print to stderr, exit 1

use clap::Parser;
use drivectl::{cli::Cli, commands, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    commands::run(cli)
}
