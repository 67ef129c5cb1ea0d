//! CLI module for PMP Auth Gateway
//!
//! Provides subcommands:
//! - `serve`: run the HTTP server (default)
//! - `migrate`: apply or revert PostgreSQL schema migrations

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// PMP Auth Gateway - credentials, access tokens and refresh sessions
#[derive(Parser)]
#[command(name = "pmp-auth-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Apply pending PostgreSQL migrations and exit
    Migrate(migrate::MigrateArgs),
}
