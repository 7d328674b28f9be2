pub mod config_cmd;
pub mod dedup;

use canon_core::{EmbeddingsDistance, FuzzyDistance, Method};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "canon")]
#[command(version, about = "Deduplicate extracted entities and facts")]
pub struct Cli {
    /// Path to canon.toml
    #[arg(
        long,
        global = true,
        env = "CANON_CONFIG",
        default_value = "canon.toml"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deduplicate an entity or fact document
    Dedup(DedupArgs),
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate canon.toml
    Validate,
    /// Print the effective configuration
    Show,
}

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// JSON document with an `entities` or `facts` array ("-" for stdin)
    pub file: PathBuf,

    /// Matching method: exact_match, fuzzy or embeddings
    #[arg(long)]
    pub method: Option<Method>,

    /// Distance for the fuzzy method: token_sort, partial_ratio or simple_ratio
    #[arg(long)]
    pub fuzzy_distance: Option<FuzzyDistance>,

    /// Distance for the embeddings method: cosine or euclidean
    #[arg(long)]
    pub embeddings_distance: Option<EmbeddingsDistance>,

    /// Pairs at or below this distance are merged
    #[arg(long)]
    pub max_distance: Option<f32>,

    /// Compare entities across labels
    #[arg(long)]
    pub any_label: bool,

    /// Per-run budget for fuzzy and embedding matching, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Write output here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pub pretty: bool,

    /// Print run statistics to stderr
    #[arg(long)]
    pub stats: bool,
}
