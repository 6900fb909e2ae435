//! CLI command definitions for the `viper` binary.
//!
//! Running `viper` with no subcommand opens the interactive app
//! (landing, dashboard, builder). The other subcommands expose the same
//! operations for scripting.

pub mod app;
pub mod builder;
pub mod config;
pub mod fleet;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Design and deploy Discord bots from a description.
#[derive(Parser)]
#[command(name = "viper", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors. Command output is still printed; use --json for
    /// plain machine-readable output.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive app (default).
    App,

    /// Build and deploy a bot from a description.
    #[command(alias = "new")]
    Build {
        /// What the bot should do. Prompted for when omitted.
        description: Option<String>,

        /// Bot token. Prompted for when omitted.
        #[arg(long, env = "VIPER_BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Application client id.
        #[arg(long)]
        client_id: Option<String>,

        /// Application client secret.
        #[arg(long, env = "VIPER_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },

    /// List deployed bots.
    #[command(alias = "ls")]
    List,

    /// Show one bot.
    Show {
        /// Bot id, id prefix, or node label (e.g. VP-51c2).
        id: String,

        /// Print credentials unmasked.
        #[arg(long)]
        reveal: bool,
    },

    /// Decommission a bot.
    #[command(alias = "rm")]
    Delete {
        /// Bot id, id prefix, or node label.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
