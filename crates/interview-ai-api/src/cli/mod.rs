//! CLI command definitions for the `iai` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod generate;
pub mod keys;
pub mod usage;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Interview AI generation core: provider failover, key pool and usage ledger.
#[derive(Parser)]
#[command(name = "iai", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans to stdout via OpenTelemetry.
    #[arg(long, global = true, env = "INTERVIEW_AI_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate text for a prompt through the failover router.
    Generate {
        /// The user prompt.
        prompt: String,

        /// Caller's user ID. Without one the fallback provider is never used.
        #[arg(long)]
        user: Option<String>,

        /// Treat the caller as premium (unlimited fallback).
        #[arg(long)]
        premium: bool,

        /// Feature tag recorded in the usage ledger.
        #[arg(long, default_value = "general")]
        feature: String,

        /// System prompt override.
        #[arg(long)]
        system: Option<String>,

        /// Primary-provider model override.
        #[arg(long)]
        model: Option<String>,
    },

    /// List the configured primary key slots (live state: admin status endpoint).
    Keys,

    /// Show a user's usage ledger.
    Usage {
        /// User ID to report on.
        user_id: String,

        /// UTC days to include, today counted.
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
