//! CLI module for the team key provisioner
//!
//! Provides subcommands:
//! - `serve`: run the provisioning API server
//! - `sign`: compute the signature header value for a request body

pub mod serve;
pub mod sign;

use clap::{Parser, Subcommand};

/// Team API key provisioner - HMAC authenticated key issue and rotation
#[derive(Parser)]
#[command(name = "team-key-provisioner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the provisioning API server
    Serve,

    /// Print the hex HMAC-SHA256 signature of a request body
    Sign(sign::SignArgs),
}
