//! `echoverse` command-line entry point

use clap::Parser;
use echoverse_cli::commands::Commands;

/// Tone-adaptive audiobook generator
#[derive(Debug, Parser)]
#[command(name = "echoverse", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.command.execute()
}
