//! CLI command parsing.

use clap::{Parser, Subcommand};

/// TaskPilot - chat-style task assistant.
#[derive(Parser)]
#[command(name = "taskpilot")]
#[command(about = "Chat-style task assistant backed by a hosted language model")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single message and print the reply.
    Send {
        /// The message to send.
        message: String,
    },

    /// Start the HTTP agent server.
    Serve {
        /// Host to bind to.
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(short, long, default_value = "7878")]
        port: u16,
    },

    /// Manage configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration.
    Show,

    /// Show the configuration file path.
    Path,
}
