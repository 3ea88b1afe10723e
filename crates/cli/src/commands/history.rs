//! `history` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use persistence::RecordStore;

use crate::cli::HistoryArgs;

/// Execute the `history` command
pub fn run_history(args: &HistoryArgs) -> Result<()> {
    let blueprint = if args.config.exists() {
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else {
        contracts::EngineBlueprint::default()
    };

    let limit = args.limit.unwrap_or(blueprint.storage.history_limit);
    info!(
        database = %blueprint.storage.database_path.display(),
        limit,
        "Loading history"
    );

    let store = RecordStore::open(&blueprint.storage.database_path).with_context(|| {
        format!(
            "Failed to open record store at {}",
            blueprint.storage.database_path.display()
        )
    })?;
    let entries = store.recent(limit).context("Failed to query history")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialize history")?
        );
        return Ok(());
    }

    if entries.is_empty() {
        println!("No analysis records yet.");
        return Ok(());
    }

    println!("{:<38} {:<28} {:<26} artist", "id", "filename", "timestamp");
    for entry in &entries {
        println!(
            "{:<38} {:<28} {:<26} {}",
            entry.id,
            entry.filename,
            entry.timestamp.to_rfc3339(),
            entry.artist_id
        );
    }
    Ok(())
}
