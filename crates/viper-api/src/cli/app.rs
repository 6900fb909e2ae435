//! Interactive app (`viper` / `viper app`).
//!
//! Landing screen, then the fleet dashboard, from which the builder is
//! opened. Navigation goes through the core `ViewRouter`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::Select;

use viper_types::view::AppView;

use super::builder::{BuildOptions, run_session};
use super::fleet::{confirm_delete, masked_record, print_fleet, print_record};
use crate::state::{AppState, ConcreteRouter};

const DASHBOARD_ACTIONS: [&str; 4] = [
    "Deploy a new bot",
    "Inspect a bot",
    "Decommission a bot",
    "Quit",
];

/// Run the interactive app until the user quits.
pub async fn run_app(state: &AppState) -> Result<()> {
    let mut router = state.router().await;

    loop {
        match router.view() {
            AppView::Landing => {
                print_landing();
                let choice = Select::new()
                    .items(&["Open the fleet dashboard", "Quit"])
                    .default(0)
                    .interact()?;
                if choice == 1 {
                    return Ok(());
                }
                router.start();
            }
            AppView::Dashboard => {
                print_fleet(router.fleet().list());
                let choice = Select::new()
                    .with_prompt("Fleet")
                    .items(&DASHBOARD_ACTIONS)
                    .default(0)
                    .interact()?;
                let result = match choice {
                    0 => run_session(state, &mut router, BuildOptions::default())
                        .await
                        .map(|_| ()),
                    1 => inspect(&router),
                    2 => decommission(&mut router).await,
                    _ => return Ok(()),
                };
                recover(result)?;
            }
            AppView::Builder => {
                // run_session returned early; a finalizing session cannot be
                // abandoned, so offer to finish it.
                if router.navigate(AppView::Dashboard).is_err() {
                    match resume_deployment(state, &mut router).await {
                        Ok(false) => return Ok(()),
                        other => recover(other.map(|_| ()))?,
                    }
                }
            }
        }
    }
}

/// Report a failed action and keep the app running. Terminal I/O errors
/// still end the app.
fn recover(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if is_terminal_error(&e) => Err(e),
        Err(e) => {
            println!("  {} {e:#}", style("!").red().bold());
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

fn is_terminal_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.is::<dialoguer::Error>() || cause.is::<std::io::Error>())
}

/// Retry finalizing a stuck session. `Ok(false)` when the user quits instead.
async fn resume_deployment(state: &AppState, router: &mut ConcreteRouter) -> Result<bool> {
    println!(
        "  {} A deployment is still pending.",
        style("!").yellow().bold()
    );
    let choice = Select::new()
        .items(&["Retry deployment", "Quit"])
        .default(0)
        .interact()?;
    if choice == 1 {
        return Ok(false);
    }
    let record = router.finalize(state.finalize_delay()).await?;
    println!(
        "  {} {} is online as {}.",
        style("✓").green().bold(),
        style(&record.name).cyan().bold(),
        style(record.id.node_label()).dim()
    );
    Ok(true)
}

fn print_landing() {
    println!();
    println!("  {}", style("V I P E R").green().bold());
    println!(
        "  {}",
        style("Describe a Discord bot. Viper drafts it, you deploy it.").dim()
    );
    println!();
}

/// Let the user pick a bot from the fleet. `None` when the fleet is empty.
fn pick_bot(router: &ConcreteRouter, prompt: &str) -> Result<Option<usize>> {
    let records = router.fleet().list();
    if records.is_empty() {
        return Ok(None);
    }
    let items: Vec<String> = records
        .iter()
        .map(|r| format!("{}  {}", r.id.node_label(), r.name))
        .collect();
    let choice = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()?;
    Ok(choice)
}

fn inspect(router: &ConcreteRouter) -> Result<()> {
    if let Some(index) = pick_bot(router, "Inspect")? {
        print_record(&masked_record(&router.fleet().list()[index]));
    }
    Ok(())
}

async fn decommission(router: &mut ConcreteRouter) -> Result<()> {
    let Some(index) = pick_bot(router, "Decommission")? else {
        return Ok(());
    };
    let record = router.fleet().list()[index].clone();

    if !confirm_delete(&record)? {
        println!("  Cancelled.");
        return Ok(());
    }

    if router.delete_bot(&record.id).await.context("could not decommission bot")? {
        println!(
            "  {} Bot '{}' decommissioned.",
            style("✓").red().bold(),
            record.name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use viper_types::error::{SessionError, StoreError};

    #[test]
    fn test_session_errors_are_recovered() {
        let err = anyhow::Error::new(SessionError::Store(StoreError::PersistFailure(
            "disk full".to_string(),
        )))
        .context("bot was not saved");
        assert!(!is_terminal_error(&err));
        assert!(recover(Err(err)).is_ok());
    }

    #[test]
    fn test_terminal_errors_propagate() {
        let err = anyhow::Error::new(std::io::Error::other("tty closed"));
        assert!(is_terminal_error(&err));
        assert!(recover(Err(err)).is_err());

        let err = anyhow::Error::new(dialoguer::Error::IO(std::io::Error::other("tty closed")));
        assert!(is_terminal_error(&err));
    }
}
