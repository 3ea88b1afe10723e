//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Totality - asynchronous track analysis engine
#[derive(Parser, Debug)]
#[command(
    name = "totality",
    author,
    version,
    about = "Asynchronous multi-stage track analysis engine",
    long_about = "Runs uploaded audio through a multi-stage analysis pipeline in the\n\
                  background: signal features, audio embeddings, lyric analysis,\n\
                  cross-modal resonance, market/culture/platform heuristics.\n\n\
                  Results are persisted to a local durable store and mirrored into an\n\
                  industry graph for centrality lookups."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TOTALITY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TOTALITY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit audio files for analysis and poll until done
    Analyze(AnalyzeArgs),

    /// Show recently persisted analysis records
    History(HistoryArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `analyze` command
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Audio files to analyze (wav/mp3/aiff/flac/ogg)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "totality.toml", env = "TOTALITY_CONFIG")]
    pub config: PathBuf,

    /// Inline lyrics text
    #[arg(long, conflicts_with = "lyrics_file")]
    pub lyrics: Option<String>,

    /// Read lyrics from a text file
    #[arg(long)]
    pub lyrics_file: Option<PathBuf>,

    /// Artist identifier
    #[arg(long, default_value = "unknown", env = "TOTALITY_ARTIST_ID")]
    pub artist_id: String,

    /// Release platform
    #[arg(long, default_value = "Spotify")]
    pub platform: String,

    /// Target markets, comma-separated (e.g. US,UK,JP)
    #[arg(long, default_value = "")]
    pub markets: String,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "200")]
    pub poll_interval_ms: u64,

    /// Print full result JSON instead of the summary
    #[arg(long)]
    pub json: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TOTALITY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `history` command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "totality.toml", env = "TOTALITY_CONFIG")]
    pub config: PathBuf,

    /// Maximum number of records (defaults to storage.history_limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "totality.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "totality.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show per-stage toggles
    #[arg(long)]
    pub stages: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
