//! Fleet commands: list, show, delete (`viper list|show|delete`).

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use viper_core::fleet::slot_store::SlotStore;
use viper_core::fleet::store::FleetStore;
use viper_types::bot::{BotCredentials, BotRecord, BotStatus};

use crate::state::AppState;

/// List all bots in the fleet.
pub async fn list_bots(state: &AppState, json: bool) -> Result<()> {
    let fleet = state.open_fleet().await;

    if json {
        let masked: Vec<BotRecord> = fleet.list().iter().map(masked_record).collect();
        println!("{}", serde_json::to_string_pretty(&masked)?);
        return Ok(());
    }

    print_fleet(fleet.list());
    Ok(())
}

/// Show a single bot.
pub async fn show_bot(state: &AppState, query: &str, reveal: bool, json: bool) -> Result<()> {
    let fleet = state.open_fleet().await;
    let record = find_record(fleet.list(), query)?;

    let shown = if reveal {
        record.clone()
    } else {
        masked_record(record)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    print_record(&shown);
    Ok(())
}

/// Decommission a bot after confirmation.
pub async fn delete_bot(state: &AppState, query: &str, force: bool, json: bool) -> Result<()> {
    let mut fleet = state.open_fleet().await;
    let record = find_record(fleet.list(), query)?.clone();

    if !force && !json && !confirm_delete(&record)? {
        println!("  Cancelled.");
        return Ok(());
    }

    remove_with_spinner(&mut fleet, &record, json).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "id": record.id.as_str()})
        );
    } else {
        println!(
            "  {} Bot '{}' decommissioned.",
            style("✓").red().bold(),
            record.name
        );
    }

    Ok(())
}

pub(crate) fn confirm_delete(record: &BotRecord) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!(
            "Decommission bot '{}' ({})?",
            style(&record.name).red().bold(),
            record.id.node_label()
        ))
        .default(false)
        .interact()?)
}

pub(crate) async fn remove_with_spinner<S: SlotStore>(
    fleet: &mut FleetStore<S>,
    record: &BotRecord,
    quiet: bool,
) -> Result<bool> {
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.red} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Decommissioning {}...", record.name));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = fleet.remove(&record.id).await;
    spinner.finish_and_clear();
    Ok(result?)
}

/// Find a record by full id, node label, or unique id prefix.
pub(crate) fn find_record<'a>(records: &'a [BotRecord], query: &str) -> Result<&'a BotRecord> {
    let query = query.trim();
    if query.is_empty() {
        bail!("bot id is empty");
    }

    if let Some(record) = records.iter().find(|r| r.id.as_str() == query) {
        return Ok(record);
    }

    let matches: Vec<&BotRecord> = records
        .iter()
        .filter(|r| {
            r.id.node_label().eq_ignore_ascii_case(query) || r.id.as_str().starts_with(query)
        })
        .collect();

    match matches.as_slice() {
        [record] => Ok(*record),
        [] => bail!("no bot matches '{query}'"),
        _ => bail!(
            "'{query}' matches {} bots; use a longer id",
            matches.len()
        ),
    }
}

/// Copy of a record with secrets masked for display.
pub(crate) fn masked_record(record: &BotRecord) -> BotRecord {
    let mut shown = record.clone();
    if let Some(creds) = shown.credentials.as_mut() {
        creds.token = BotCredentials::mask(&creds.token);
        creds.client_secret = BotCredentials::mask(&creds.client_secret);
    }
    shown
}

/// Print the fleet as a table, or a hint when it is empty.
pub(crate) fn print_fleet(records: &[BotRecord]) {
    if records.is_empty() {
        println!();
        println!(
            "  {} No bots deployed yet. Build one with: {}",
            style("i").blue().bold(),
            style("viper build").yellow()
        );
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Node").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Commands").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Deployed").fg(Color::White),
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(record.id.node_label()).fg(Color::DarkGrey),
            Cell::new(&record.name).fg(Color::Cyan),
            status_cell(&record.status),
            Cell::new(record.commands.len()),
            Cell::new(truncate(&record.description, 50)),
            Cell::new(format_relative_time(&record.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} bot{}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    println!();
}

/// Print one record's details. Callers mask secrets first.
pub(crate) fn print_record(record: &BotRecord) {
    println!();
    println!(
        "  {} {}  {}",
        style(&record.name).cyan().bold(),
        style(record.id.node_label()).dim(),
        format_status(&record.status)
    );
    println!();
    println!("  {}  {}", style("Id").dim(), record.id);
    println!("  {}  {}", style("Intent").dim(), record.description);
    println!(
        "  {}  {}",
        style("Deployed").dim(),
        record.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
    println!("  {}", style("Commands").bold());
    if record.commands.is_empty() {
        println!("    {}", style("(none)").dim());
    }
    for command in &record.commands {
        println!("    {} {}", style("•").cyan(), command);
    }

    if let Some(creds) = &record.credentials {
        println!();
        println!("  {}", style("Credentials").bold());
        println!("    {}  {}", style("Token").dim(), creds.token);
        if !creds.client_id.is_empty() {
            println!("    {}  {}", style("Client id").dim(), creds.client_id);
        }
        if !creds.client_secret.is_empty() {
            println!("    {}  {}", style("Client secret").dim(), creds.client_secret);
        }
    }
    println!();
}

// --- Formatting helpers ---

fn status_cell(status: &BotStatus) -> Cell {
    match status {
        BotStatus::Online => Cell::new("● online").fg(Color::Green),
        BotStatus::Deploying => Cell::new("◐ deploying").fg(Color::Yellow),
        BotStatus::Offline => Cell::new("○ offline").fg(Color::DarkGrey),
    }
}

fn format_status(status: &BotStatus) -> String {
    match status {
        BotStatus::Online => format!("{}", style("● online").green()),
        BotStatus::Deploying => format!("{}", style("◐ deploying").yellow()),
        BotStatus::Offline => format!("{}", style("○ offline").dim()),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
