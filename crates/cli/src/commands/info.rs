//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    engine: EngineInfo,
    storage: StorageInfo,
    graph_enabled: bool,
    listening: ListeningInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    enabled_stages: Vec<&'static str>,
}

#[derive(Serialize)]
struct EngineInfo {
    worker_count: usize,
    temp_dir: String,
}

#[derive(Serialize)]
struct StorageInfo {
    database_path: String,
    history_limit: usize,
}

#[derive(Serialize)]
struct ListeningInfo {
    embedding_dim: usize,
    norm_center: f64,
    norm_scale: f64,
    seed: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn enabled_stages(blueprint: &contracts::EngineBlueprint) -> Vec<&'static str> {
    let s = &blueprint.stages;
    let mut names = Vec::new();
    if s.listening {
        names.push("listening");
    }
    if s.signal_features {
        names.push("signal_features");
    }
    if s.harmonic_profile {
        names.push("harmonic_profile");
    }
    if s.lyric_analysis {
        names.push("lyric_analysis");
    }
    if s.industry {
        names.push("industry_network");
    }
    if s.platform {
        names.push("platform_fit");
    }
    if s.market {
        names.push("market_risk");
    }
    if s.culture {
        names.push("cultural_distance");
    }
    if s.audience {
        names.push("hook_efficacy");
    }
    names
}

fn build_config_info(blueprint: &contracts::EngineBlueprint, args: &InfoArgs) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        engine: EngineInfo {
            worker_count: blueprint.engine.worker_count,
            temp_dir: blueprint.engine.temp_dir.display().to_string(),
        },
        storage: StorageInfo {
            database_path: blueprint.storage.database_path.display().to_string(),
            history_limit: blueprint.storage.history_limit,
        },
        graph_enabled: blueprint.graph.enabled,
        listening: ListeningInfo {
            embedding_dim: blueprint.listening.embedding_dim,
            norm_center: blueprint.listening.norm_center,
            norm_scale: blueprint.listening.norm_scale,
            seed: blueprint.listening.seed,
        },
        enabled_stages: if args.stages {
            enabled_stages(blueprint)
        } else {
            Vec::new()
        },
    }
}

fn print_config_info(blueprint: &contracts::EngineBlueprint, args: &InfoArgs) {
    println!("Version: {:?}", blueprint.version);
    println!("Workers: {}", blueprint.engine.worker_count);
    println!("Temp dir: {}", blueprint.engine.temp_dir.display());
    println!("Database: {}", blueprint.storage.database_path.display());
    println!("History limit: {}", blueprint.storage.history_limit);
    println!("Graph mirror: {}", blueprint.graph.enabled);
    println!(
        "Listening model: dim={} center={} scale={} seed={}",
        blueprint.listening.embedding_dim,
        blueprint.listening.norm_center,
        blueprint.listening.norm_scale,
        blueprint.listening.seed
    );

    if args.stages {
        println!("\nEnabled stages:");
        for name in enabled_stages(blueprint) {
            println!("  - {name}");
        }
    }
}
