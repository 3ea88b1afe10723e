//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    worker_count: usize,
    temp_dir: String,
    database_path: String,
    graph_enabled: bool,
    embedding_dim: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    worker_count: blueprint.engine.worker_count,
                    temp_dir: blueprint.engine.temp_dir.display().to_string(),
                    database_path: blueprint.storage.database_path.display().to_string(),
                    graph_enabled: blueprint.graph.enabled,
                    embedding_dim: blueprint.listening.embedding_dim,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::EngineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.graph.enabled {
        warnings.push(
            "Graph mirror disabled - artist centrality will always be 0.0".to_string(),
        );
    }

    if !blueprint.stages.lyric_analysis || !blueprint.stages.listening {
        warnings.push(
            "Resonance prerequisites partially disabled - resonance will always be skipped"
                .to_string(),
        );
    }

    if blueprint.engine.worker_count == 1 {
        warnings.push("Single worker configured - jobs run strictly serially".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Workers: {}", summary.worker_count);
            println!("  Temp dir: {}", summary.temp_dir);
            println!("  Database: {}", summary.database_path);
            println!("  Graph mirror: {}", summary.graph_enabled);
            println!("  Embedding dim: {}", summary.embedding_dim);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
