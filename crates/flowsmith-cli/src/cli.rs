//! CLI argument definitions for flowsmith.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use flowsmith_synth::{Complexity, TriggerKind};

/// flowsmith -- turn a plain-language description into an importable
/// automation workflow.
#[derive(Debug, Parser)]
#[command(
    name = "flowsmith",
    version,
    about = "flowsmith -- text to automation workflow",
    long_about = "Generates n8n-compatible workflow JSON from a free-text description, \
                  from the command line or over HTTP."
)]
pub struct Cli {
    /// Configuration file.  Defaults to `flowsmith.toml` when present.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a workflow and print it as JSON.
    Generate {
        /// What the automation should do.
        description: String,

        /// How the workflow starts.  Inferred from the text when omitted.
        #[arg(long, short, value_enum)]
        trigger: Option<TriggerArg>,

        #[arg(long, value_enum, default_value_t = ComplexityArg::Medium)]
        complexity: ComplexityArg,

        /// Write the JSON to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Single-line JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Start the HTTP API.
    Serve {
        /// Overrides `[server] bind`.
        #[arg(long)]
        bind: Option<String>,

        /// Overrides `[server] port`.
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// List the node templates flowsmith can emit.
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TriggerArg {
    Webhook,
    Schedule,
    Manual,
}

impl From<TriggerArg> for TriggerKind {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::Webhook => Self::Webhook,
            TriggerArg::Schedule => Self::Schedule,
            TriggerArg::Manual => Self::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComplexityArg {
    Simple,
    Medium,
    Complex,
}

impl From<ComplexityArg> for Complexity {
    fn from(arg: ComplexityArg) -> Self {
        match arg {
            ComplexityArg::Simple => Self::Simple,
            ComplexityArg::Medium => Self::Medium,
            ComplexityArg::Complex => Self::Complex,
        }
    }
}
