use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ticketctl")]
#[command(about = "Decide and replay support ticket commands stored as JSON")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Fold an event history into the current ticket state
    Replay {
        /// JSON array of events, or `-` for stdin
        events: PathBuf,

        /// Print the full ticket read model instead of the decision state
        #[arg(long)]
        full: bool,
    },

    /// Decide one command against an event history and print the new events
    Decide {
        /// JSON command, or `-` for stdin
        command: PathBuf,

        /// JSON array of prior events (defaults to a ticket that does not exist yet)
        #[arg(short, long)]
        events: Option<PathBuf>,
    },

    /// Run a list of commands for one ticket through an in-memory event store
    Simulate {
        /// JSON array of commands; the first must be `CreateTicket`
        commands: PathBuf,
    },

    /// Print the status transition table
    Transitions,
}
