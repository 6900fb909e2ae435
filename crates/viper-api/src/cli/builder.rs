//! CLI builder for describing and deploying a bot (`viper build`).
//!
//! Drives one builder session through the router: prompt, generation,
//! credentials, finalize. Generation runs as a spawned task so Ctrl+C can
//! abandon the session while the call is in flight; a result arriving for
//! an abandoned session is discarded by its ticket.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use viper_core::builder::generator::SpecificationGenerator;
use viper_core::builder::session::GenerationStatus;
use viper_types::bot::BotRecord;
use viper_types::error::{GenerationError, SessionError};
use viper_types::llm::LlmError;
use viper_types::message::{ConversationMessage, MessageRole};
use viper_types::session::SessionPhase;

use crate::state::{AppState, ConcreteRouter};

/// Options for a builder run. Anything left `None` is prompted for.
#[derive(Debug, Default, Clone)]
pub struct BuildOptions {
    pub description: Option<String>,
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub json: bool,
}

/// Entry point for `viper build`.
pub async fn run_build(state: &AppState, options: BuildOptions) -> Result<()> {
    let mut router = state.router().await;
    router.start();

    match run_session(state, &mut router, options.clone()).await? {
        Some(record) if options.json => {
            let shown = super::fleet::masked_record(&record);
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        Some(_) => {}
        None if options.json => {
            println!("{}", serde_json::json!({"deployed": false}));
        }
        None => {}
    }
    Ok(())
}

/// Run one builder session on `router`.
///
/// Returns the deployed record, or `None` when the user abandons the session.
pub async fn run_session(
    state: &AppState,
    router: &mut ConcreteRouter,
    options: BuildOptions,
) -> Result<Option<BotRecord>> {
    let interactive = !options.json;
    router.create_new()?;

    if interactive {
        println!();
        print_last_assistant(router);
    }

    let mut description = options.description.clone();

    // Prompt until a specification is accepted.
    loop {
        let prompt = match description.take() {
            Some(text) => text,
            None if interactive => {
                let text: String = Input::new()
                    .with_prompt("Describe your bot")
                    .allow_empty(true)
                    .interact_text()?;
                if text.trim().is_empty() {
                    if confirm_abandon()? {
                        router.cancel_builder()?;
                        return Ok(None);
                    }
                    continue;
                }
                text
            }
            None => anyhow::bail!("a bot description is required with --json"),
        };

        let ticket = match router.begin_submit(&prompt) {
            Ok(ticket) => ticket,
            Err(SessionError::EmptyPrompt) if interactive => continue,
            Err(e) => return Err(e.into()),
        };

        let generator = state.generator.clone();
        let task_prompt = ticket.prompt.clone();
        let mut handle = tokio::spawn(async move { generator.generate(&task_prompt).await });

        let spinner = spinner(interactive, "{spinner:.cyan} {msg}");
        spinner.set_message("Architecting...");

        let result = tokio::select! {
            joined = &mut handle => joined.unwrap_or_else(|e| {
                Err(GenerationError::ServiceFailure(LlmError::Provider {
                    message: format!("generation task failed: {e}"),
                }))
            }),
            _ = tokio::signal::ctrl_c() => {
                handle.abort();
                spinner.finish_and_clear();
                router.cancel_builder()?;
                if interactive {
                    println!("  {} Build abandoned.", style("✗").yellow());
                }
                return Ok(None);
            }
        };
        spinner.finish_and_clear();

        let status = router.apply_generation(&ticket, result);
        if interactive {
            print_last_assistant(router);
        }

        match status {
            GenerationStatus::Ready => break,
            GenerationStatus::Failed if interactive => continue,
            GenerationStatus::Failed => {
                anyhow::bail!("generation failed; see the log for details")
            }
            GenerationStatus::Ignored => continue,
        }
    }

    collect_credentials(router, &options)?;

    let record = finalize(state, router, interactive).await?;

    if interactive {
        println!(
            "  {} {} is online as {}.",
            style("✓").green().bold(),
            style(&record.name).cyan().bold(),
            style(record.id.node_label()).dim()
        );
        println!();
    }

    Ok(Some(record))
}

/// Ask for credentials until a token is accepted.
fn collect_credentials(router: &mut ConcreteRouter, options: &BuildOptions) -> Result<()> {
    let interactive = !options.json;
    let mut token = options.token.clone();

    loop {
        let token_value = match token.take() {
            Some(t) => t,
            None if interactive => Password::new()
                .with_prompt("Bot token")
                .allow_empty_password(true)
                .interact()?,
            None => anyhow::bail!("--token is required with --json"),
        };

        let client_id = match &options.client_id {
            Some(id) => id.clone(),
            None if interactive => Input::new()
                .with_prompt("Client id (optional)")
                .allow_empty(true)
                .interact_text()?,
            None => String::new(),
        };

        let client_secret = match &options.client_secret {
            Some(secret) => secret.clone(),
            None if interactive => Password::new()
                .with_prompt("Client secret (optional)")
                .allow_empty_password(true)
                .interact()?,
            None => String::new(),
        };

        match router.submit_credentials(&token_value, &client_id, &client_secret) {
            Ok(()) => return Ok(()),
            Err(SessionError::MissingToken) if interactive => {
                println!("  {} A bot token is required.", style("!").red().bold());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Store the bot, offering a retry when persistence fails.
async fn finalize(
    state: &AppState,
    router: &mut ConcreteRouter,
    interactive: bool,
) -> Result<BotRecord> {
    loop {
        let spinner = spinner(interactive, "{spinner:.green} {msg}");
        spinner.set_message("Provisioning container...");

        let result = router.finalize(state.finalize_delay()).await;
        spinner.finish_and_clear();

        match result {
            Ok(record) => return Ok(record),
            Err(SessionError::Store(e)) if interactive => {
                println!("  {} Could not save the bot: {e}", style("!").red().bold());
                let retry = Confirm::new()
                    .with_prompt("Retry?")
                    .default(true)
                    .interact()?;
                if !retry {
                    return Err(e).context("bot was not saved");
                }
            }
            Err(e) => return Err(e).context("failed to finalize deployment"),
        }
    }
}

fn confirm_abandon() -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt("Abandon this build?")
        .default(false)
        .interact()?)
}

fn spinner(visible: bool, template: &str) -> ProgressBar {
    let spinner = if visible {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

fn print_last_assistant(router: &ConcreteRouter) {
    let Some(session) = router.session() else {
        return;
    };
    if let Some(message) = session
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::Assistant)
    {
        println!("{}", render_message(message));
        if session.phase() == SessionPhase::AwaitingCredentials {
            println!();
        }
    }
}

/// Render an assistant message for the terminal. `**bold**` spans become styled text.
fn render_message(message: &ConversationMessage) -> String {
    message
        .content
        .lines()
        .map(|line| format!("  {}", render_line(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(line: &str) -> String {
    let mut out = String::new();
    for (i, part) in line.split("**").enumerate() {
        if i % 2 == 1 {
            out.push_str(&style(part).cyan().bold().to_string());
        } else {
            out.push_str(part);
        }
    }
    out
}
