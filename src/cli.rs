use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// servicedesk: service definition console for data APIs
#[derive(Parser)]
#[command(name = "servicedesk", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the admin API server
    Serve {
        /// Port to bind (overrides SERVICEDESK_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate a service draft stored as JSON or YAML
    Validate {
        /// Path to the draft file
        file: PathBuf,
        /// Reject duplicate parameter keys
        #[arg(long)]
        unique_keys: bool,
        /// Reject private services that select no role
        #[arg(long)]
        require_roles: bool,
    },

    /// Print the endpoint derived from a category and a service name
    Endpoint {
        #[arg(long)]
        category: String,
        #[arg(long)]
        name: String,
    },
}
