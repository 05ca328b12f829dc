use clap::{Args, Parser, Subcommand, ValueEnum};
use simdupe_core::config::ClusteringConfig;
use simdupe_core::{ClusterMethod, KeepStrategy, Metric, SimilarityLevel};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "simdupe")]
#[command(about = "Find exact and near-duplicate files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories and report duplicate groups
    Scan(ScanArgs),
    /// Print the exact, content and perceptual hashes of a file
    Hash { file: PathBuf },
    /// Print the most frequent keywords of a text file
    Keywords {
        file: PathBuf,
        #[arg(long, default_value_t = 10)]
        max: usize,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to scan; defaults to the configured root paths
    pub paths: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t = StrategyArg::First)]
    pub strategy: StrategyArg,
    #[arg(long, value_enum, default_value_t = MethodArg::Threshold)]
    pub method: MethodArg,
    #[arg(long, value_enum, default_value_t = MetricArg::Cosine)]
    pub metric: MetricArg,
    #[arg(long, value_enum, default_value_t = LevelArg::Medium)]
    pub level: LevelArg,
    /// Explicit threshold, overriding --level
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Upper bound on clusters for hierarchical clustering; defaults to config
    #[arg(long)]
    pub max_clusters: Option<usize>,
    /// Merge floor for hierarchical clustering; defaults to config
    #[arg(long)]
    pub min_similarity: Option<f64>,
    /// JSON file mapping file paths to precomputed embeddings
    #[arg(long)]
    pub embeddings: Option<PathBuf>,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
    /// Also print a dry-run deletion plan
    #[arg(long)]
    pub plan: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    First,
    Largest,
    Newest,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Threshold,
    Hierarchical,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    Cosine,
    Euclidean,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelArg {
    High,
    Medium,
    Low,
}

impl From<StrategyArg> for KeepStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::First => KeepStrategy::First,
            StrategyArg::Largest => KeepStrategy::Largest,
            StrategyArg::Newest => KeepStrategy::Newest,
        }
    }
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Cosine => Metric::Cosine,
            MetricArg::Euclidean => Metric::Euclidean,
        }
    }
}

impl From<LevelArg> for SimilarityLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::High => SimilarityLevel::High,
            LevelArg::Medium => SimilarityLevel::Medium,
            LevelArg::Low => SimilarityLevel::Low,
        }
    }
}

impl ScanArgs {
    /// Flags win over the `clustering` section of the configuration.
    pub fn cluster_method(&self, clustering: &ClusteringConfig) -> ClusterMethod {
        match self.method {
            MethodArg::Threshold => ClusterMethod::Threshold {
                metric: self.metric.into(),
                threshold: self.threshold,
            },
            MethodArg::Hierarchical => ClusterMethod::Hierarchical {
                max_clusters: self.max_clusters.unwrap_or(clustering.max_clusters),
                min_similarity: self
                    .min_similarity
                    .unwrap_or(clustering.hierarchical_threshold),
            },
        }
    }
}
