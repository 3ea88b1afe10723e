//! Job/stage metric collection
//!
//! Records pipeline behavior on the global metrics recorder and aggregates
//! in-memory statistics for end-of-run summaries.

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// Record a job accepted by the dispatcher.
pub fn record_job_submitted() {
    counter!("totality_jobs_submitted_total").increment(1);
}

/// Record a job reaching a terminal state.
///
/// # Example
///
/// ```ignore
/// use observability::record_job_completed;
///
/// record_job_completed("completed", elapsed.as_secs_f64());
/// ```
pub fn record_job_completed(status: &str, duration_secs: f64) {
    counter!("totality_jobs_finished_total", "status" => status.to_string()).increment(1);
    histogram!("totality_job_duration_seconds").record(duration_secs);
}

/// Record one stage outcome (success / failed / skipped).
pub fn record_stage_outcome(stage: &str, status: &str) {
    counter!(
        "totality_stage_outcomes_total",
        "stage" => stage.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record one stage's wall-clock duration.
pub fn record_stage_duration_ms(stage: &str, duration_ms: f64) {
    histogram!(
        "totality_stage_duration_ms",
        "stage" => stage.to_string()
    )
    .record(duration_ms);
}

/// Record current job queue depth.
pub fn record_queue_depth(depth: usize) {
    gauge!("totality_jobs_queue_depth").set(depth as f64);
}

/// Record a durable-store or graph-mirror write failure.
pub fn record_persist_failure(store: &str) {
    counter!(
        "totality_persist_failures_total",
        "store" => store.to_string()
    )
    .increment(1);
}

/// Job metrics aggregator
///
/// Aggregates metrics in memory for summary output at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct JobMetricsAggregator {
    /// Total finished jobs
    pub total_jobs: u64,

    /// Completed jobs
    pub completed: u64,

    /// Failed jobs
    pub failed: u64,

    /// Failure count per stage
    pub stage_failures: HashMap<String, u64>,

    /// Skip count per stage
    pub stage_skips: HashMap<String, u64>,

    /// Job duration statistics (seconds)
    pub duration_stats: RunningStats,

    /// Dissonance score statistics
    pub dissonance_stats: RunningStats,
}

impl JobMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with one finished job.
    pub fn update_job(&mut self, completed: bool, duration_secs: f64, dissonance: Option<f64>) {
        self.total_jobs += 1;
        if completed {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
        self.duration_stats.push(duration_secs);
        if let Some(d) = dissonance {
            self.dissonance_stats.push(d);
        }
    }

    /// Update with one stage outcome.
    pub fn update_stage(&mut self, stage: &str, status: &str) {
        match status {
            "failed" => *self.stage_failures.entry(stage.to_string()).or_insert(0) += 1,
            "skipped" => *self.stage_skips.entry(stage.to_string()).or_insert(0) += 1,
            _ => {}
        }
    }

    /// Produce a summary report.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_jobs: self.total_jobs,
            completed: self.completed,
            failed: self.failed,
            failure_rate: if self.total_jobs > 0 {
                self.failed as f64 / self.total_jobs as f64 * 100.0
            } else {
                0.0
            },
            duration_secs: StatsSummary::from(&self.duration_stats),
            dissonance: StatsSummary::from(&self.dissonance_stats),
            stage_failures: self.stage_failures.clone(),
            stage_skips: self.stage_skips.clone(),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_jobs: u64,
    pub completed: u64,
    pub failed: u64,
    pub failure_rate: f64,
    pub duration_secs: StatsSummary,
    pub dissonance: StatsSummary,
    pub stage_failures: HashMap<String, u64>,
    pub stage_skips: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Job Metrics Summary ===")?;
        writeln!(f, "Total jobs: {}", self.total_jobs)?;
        writeln!(f, "Completed: {}", self.completed)?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Job duration (s): {}", self.duration_secs)?;
        writeln!(f, "Dissonance score: {}", self.dissonance)?;

        if !self.stage_failures.is_empty() {
            writeln!(f, "Stage failures:")?;
            for (stage, count) in &self.stage_failures {
                writeln!(f, "  {}: {}", stage, count)?;
            }
        }
        if !self.stage_skips.is_empty() {
            writeln!(f, "Stage skips:")?;
            for (stage, count) in &self.stage_skips {
                writeln!(f, "  {}: {}", stage, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = JobMetricsAggregator::new();

        aggregator.update_job(true, 1.5, Some(0.4));
        aggregator.update_job(false, 0.5, None);
        aggregator.update_stage("lyric_analysis", "skipped");
        aggregator.update_stage("signal_features", "failed");
        aggregator.update_stage("signal_features", "success");

        assert_eq!(aggregator.total_jobs, 2);
        assert_eq!(aggregator.completed, 1);
        assert_eq!(aggregator.failed, 1);
        assert_eq!(aggregator.stage_failures.get("signal_features"), Some(&1));
        assert_eq!(aggregator.stage_skips.get("lyric_analysis"), Some(&1));
        assert_eq!(aggregator.dissonance_stats.count(), 1);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = JobMetricsAggregator::new();
        aggregator.update_job(true, 2.0, Some(0.2));
        aggregator.update_job(true, 4.0, Some(0.6));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Total jobs: 2"));
        assert!(output.contains("mean=3.000"));
    }
}
