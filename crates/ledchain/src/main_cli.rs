//! ledchain CLI: control a daisy-chained string of P9813 RGB LED modules.
//!
//! Each invocation loads the saved chain, re-sends it to the LEDs, applies one
//! change, and saves the result.

use std::path::PathBuf;

use clap::Parser;

mod cli;

#[derive(Parser)]
#[command(
    name = "ledchain-cli",
    version,
    about = "Control a daisy-chained string of P9813 RGB LED modules"
)]
struct Args {
    /// Output as JSON (for list, show, frame, config)
    #[arg(long, global = true)]
    json: bool,

    /// Log transmissions and state changes
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chain state file (overrides `state_path` from the config)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// GPIO backend: auto, sysfs or noop (overrides the config)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let opts = cli::GlobalOpts {
        json: args.json,
        config: args.config,
        state: args.state,
        backend: args.backend,
    };

    if let Err(e) = cli::run(args.command, &opts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
