//! `analyze` command implementation.
//!
//! Assembles the engine runtime, submits every file, polls until all jobs
//! reach a terminal state, then prints results and a metrics summary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use tracing::{info, warn};

use contracts::{JobMetadata, JobStatus};
use jobs::JobStatusView;
use observability::JobMetricsAggregator;

use crate::cli::AnalyzeArgs;
use crate::runtime::EngineRuntime;

/// Execute the `analyze` command
pub async fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let metadata = build_metadata(args)?;
    let runtime = EngineRuntime::start(&blueprint).context("Failed to start engine runtime")?;

    // Submit everything up front; submission never waits on analysis
    let mut job_ids = Vec::new();
    for file in &args.files {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let filename = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.wav");

        match runtime
            .dispatcher()
            .submit(Bytes::from(bytes), filename, metadata.clone())
            .await
        {
            Ok(job_id) => {
                println!("queued {} -> job {}", file.display(), job_id);
                job_ids.push((job_id, std::time::Instant::now()));
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "submission rejected");
                println!("rejected {}: {}", file.display(), e);
            }
        }
    }

    if job_ids.is_empty() {
        runtime.shutdown().await;
        anyhow::bail!("No jobs were accepted");
    }

    // Poll until every job is terminal
    let mut aggregator = JobMetricsAggregator::new();
    let interval = Duration::from_millis(args.poll_interval_ms.max(10));
    for (job_id, submitted) in &job_ids {
        let view = poll_until_terminal(&runtime, job_id, interval).await?;
        report_job(&view, submitted.elapsed().as_secs_f64(), args.json, &mut aggregator)?;
    }

    runtime.shutdown().await;

    if !args.quiet_summary() {
        println!("\n{}", aggregator.summary());
    }
    Ok(())
}

impl AnalyzeArgs {
    /// Summary is suppressed in JSON mode to keep stdout machine-readable.
    fn quiet_summary(&self) -> bool {
        self.json
    }
}

fn load_blueprint(path: &Path) -> Result<contracts::EngineBlueprint> {
    if path.exists() {
        config_loader::ConfigLoader::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    } else {
        info!(config = %path.display(), "config not found, using defaults");
        Ok(contracts::EngineBlueprint::default())
    }
}

fn build_metadata(args: &AnalyzeArgs) -> Result<JobMetadata> {
    let lyrics = match (&args.lyrics, &args.lyrics_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read lyrics from {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let target_markets: Vec<String> = args
        .markets
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    Ok(JobMetadata {
        artist_id: args.artist_id.clone(),
        platform: args.platform.clone(),
        target_markets,
        lyrics,
    })
}

async fn poll_until_terminal(
    runtime: &EngineRuntime,
    job_id: &str,
    interval: Duration,
) -> Result<JobStatusView> {
    loop {
        let view = runtime
            .status
            .status(job_id)
            .with_context(|| format!("Job {job_id} disappeared"))?;
        if view.status.is_terminal() {
            return Ok(view);
        }
        tokio::time::sleep(interval).await;
    }
}

fn report_job(
    view: &JobStatusView,
    duration_secs: f64,
    json: bool,
    aggregator: &mut JobMetricsAggregator,
) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(view).context("Failed to serialize job view")?
        );
    } else {
        match view.status {
            JobStatus::Completed => {
                println!("job {} completed", view.job_id);
                if let Some(result) = &view.result {
                    if let Some(d) = result.dissonance_score() {
                        println!("  dissonance: {d:.3}");
                    }
                    if let Some(vibe) = result.vibe_descriptor() {
                        println!("  vibe: {vibe}");
                    }
                    println!("  categories: {result}");
                }
            }
            JobStatus::Failed => {
                println!(
                    "job {} failed: {}",
                    view.job_id,
                    view.error.as_deref().unwrap_or("unknown error")
                );
            }
            _ => unreachable!("poll_until_terminal returns terminal states only"),
        }
    }

    let dissonance = view.result.as_ref().and_then(|r| r.dissonance_score());
    aggregator.update_job(view.status == JobStatus::Completed, duration_secs, dissonance);
    Ok(())
}
