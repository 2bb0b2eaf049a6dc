//! HEXFALL CLI - Command-line interface
//!
//! Solves hex falling-unit puzzles and prints contest solutions as JSON on stdout.
//! Diagnostics go to stderr through `tracing`; `-v` raises the level and `RUST_LOG`
//! overrides it.

mod solve_cmd;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use solve_cmd::SolveArgs;

#[derive(Parser)]
#[command(name = "hexfall")]
#[command(about = "HEXFALL hex puzzle solver")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    solve: SolveArgs,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    solve_cmd::run(cli.solve)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
