use crate::domain::defaults::AutoPopulateRequest;
use crate::domain::model::IndustryCountryPair;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "coverage-monitor")]
#[command(about = "Detect and fill coverage gaps in an (industry, country) dataset")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "coverage-monitor.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON (overrides [logging] json)
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List pairs that have some records but fewer than the threshold
    LowData {
        #[arg(long)]
        threshold: Option<u64>,
    },
    /// List pairs without any record
    Missing,
    /// Fetch records for a single pair
    Fetch {
        /// Pair as industry/country
        #[arg(value_parser = parse_pair)]
        pair: IndustryCountryPair,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch records for several pairs with bounded concurrency
    Batch {
        /// Pairs as industry/country
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<IndustryCountryPair>,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Print dataset population statistics
    Stats,
    /// Detect low-data (and optionally missing) pairs and fetch them
    AutoPopulate {
        #[arg(long)]
        threshold: Option<u64>,
        /// Maximum number of pairs to remediate
        #[arg(long)]
        count: Option<usize>,
        #[command(flatten)]
        batch: BatchArgs,
        /// Append missing pairs after the low-data ones
        #[arg(long)]
        include_missing: bool,
    },
    /// Validate the configuration file and exit
    CheckConfig,
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    #[arg(long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

impl Command {
    /// 只有明確指定 --include-missing 時才覆蓋設定檔的預設值
    pub fn auto_populate_request(&self) -> Option<AutoPopulateRequest> {
        match self {
            Command::AutoPopulate {
                threshold,
                count,
                batch,
                include_missing,
            } => Some(AutoPopulateRequest {
                threshold: *threshold,
                count: *count,
                max_concurrent: batch.max_concurrent,
                limit: batch.limit,
                include_missing: include_missing.then_some(true),
            }),
            _ => None,
        }
    }
}

pub fn parse_pair(value: &str) -> Result<IndustryCountryPair, String> {
    let (industry, country) = value
        .split_once('/')
        .ok_or_else(|| format!("expected industry/country, got '{}'", value))?;
    let (industry, country) = (industry.trim(), country.trim());
    if industry.is_empty() || country.is_empty() {
        return Err(format!("expected industry/country, got '{}'", value));
    }
    Ok(IndustryCountryPair::new(industry, country))
}
