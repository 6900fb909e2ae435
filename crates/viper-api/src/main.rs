//! Viper command-line entry point.
//!
//! Binary name: `viper`
//!
//! Parses arguments, sets up tracing, opens the data directory, then
//! dispatches to the interactive app or a single command.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::builder::BuildOptions;
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,viper=debug",
        _ => "trace",
    };
    viper_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    // Shell completions don't need app state
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "viper", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    let result = run(&state, cli).await;
    viper_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::App) {
        Commands::App => cli::app::run_app(state).await?,

        Commands::Build {
            description,
            token,
            client_id,
            client_secret,
        } => {
            let options = BuildOptions {
                description,
                token,
                client_id,
                client_secret,
                json: cli.json,
            };
            cli::builder::run_build(state, options).await?;
        }

        Commands::List => cli::fleet::list_bots(state, cli.json).await?,

        Commands::Show { id, reveal } => {
            cli::fleet::show_bot(state, &id, reveal, cli.json).await?;
        }

        Commands::Delete { id, force } => {
            cli::fleet::delete_bot(state, &id, force, cli.json).await?;
        }

        Commands::Config => cli::config::show_config(state, cli.json).await?,

        Commands::Completions { .. } => {}
    }

    Ok(())
}
