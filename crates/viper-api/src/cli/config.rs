//! `viper config` -- show the effective configuration.
//!
//! Reports whether an API key is available without ever printing it.

use anyhow::Result;
use console::style;

use viper_infra::config::config_path;
use viper_infra::secret::env::resolve_api_key;
use viper_infra::sqlite::pool::database_url;

use crate::state::AppState;

pub async fn show_config(state: &AppState, json: bool) -> Result<()> {
    let config = &state.config;
    let config_file = config_path(&state.data_dir);
    let config_file_exists = tokio::fs::try_exists(&config_file).await.unwrap_or(false);
    let api_key_set = resolve_api_key(&config.api_key_env).is_ok();

    if json {
        let out = serde_json::json!({
            "data_dir": state.data_dir.display().to_string(),
            "database": database_url(&state.data_dir),
            "config_file": config_file.display().to_string(),
            "config_file_exists": config_file_exists,
            "api_key_set": api_key_set,
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let check = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!("  {}", style("Viper configuration").bold());
    println!();
    println!("  {}  {}", style("Data dir").dim(), state.data_dir.display());
    println!(
        "  {}  {} {}",
        style("Config").dim(),
        config_file.display(),
        if config_file_exists {
            String::new()
        } else {
            format!("{}", style("(not found, using defaults)").dim())
        }
    );
    println!("  {}  {}", style("Model").dim(), config.model);
    println!(
        "  {} API key ({})",
        check(api_key_set),
        style(&config.api_key_env).yellow()
    );
    println!(
        "  {}  {}",
        style("Timeout").dim(),
        match config.generation.deadline() {
            Some(d) => format!("{}s", d.as_secs()),
            None => "none".to_string(),
        }
    );
    println!(
        "  {}  {}",
        style("Attempts").dim(),
        config.generation.attempts()
    );
    println!(
        "  {}  {} ({} bytes max)",
        style("Slot").dim(),
        config.storage.slot_name,
        config.storage.max_slot_bytes
    );
    println!();

    Ok(())
}
