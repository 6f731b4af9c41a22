//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Diagramma - streaming chat for diagram and system-design analysis
#[derive(Parser, Debug)]
#[command(name = "diagramma")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the composition service
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Chat interactively against a running service
    Chat {
        /// Chat endpoint URL
        #[arg(short, long, default_value = "http://127.0.0.1:8080/api/chat")]
        endpoint: String,
    },
}
