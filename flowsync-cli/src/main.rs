//! flowsync — mirror conversational flows between a remote project and local
//! files.
//!
//! # Usage
//!
//! ```text
//! flowsync [-v...] [--agent-dir <path>] pull flows
//! flowsync pull flow <name>
//! flowsync pull locales
//! flowsync push flows
//! flowsync push flow <name>
//! flowsync diff flow <name> [--mode full|node]
//! flowsync train flow <name> [--timeout <ms>]
//! ```

mod commands;
mod http;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{
    diff::DiffCommand, pull::PullCommand, push::PushCommand, train::TrainCommand, GlobalOpts,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "flowsync",
    version,
    about = "Pull, push, diff, and train conversational flows",
    long_about = None,
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Root of the local mirror, overriding the configured `agent_dir`.
    #[arg(long, value_name = "PATH", global = true)]
    agent_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace local state with the remote.
    Pull {
        #[command(subcommand)]
        command: PullCommand,
    },

    /// Write local state back to the remote.
    Push {
        #[command(subcommand)]
        command: PushCommand,
    },

    /// Compare local state with the remote.
    Diff {
        #[command(subcommand)]
        command: DiffCommand,
    },

    /// Retrain a flow's intents.
    Train {
        #[command(subcommand)]
        command: TrainCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = GlobalOpts {
        agent_dir: cli.agent_dir,
    };
    match cli.command {
        Commands::Pull { command } => commands::pull::run(command, &opts),
        Commands::Push { command } => commands::push::run(command, &opts),
        Commands::Diff { command } => commands::diff::run(command, &opts),
        Commands::Train { command } => commands::train::run(command, &opts),
    }
}
