// Coverage Effect - Core Library
// Exposes all modules for use in the CLI, results server, and tests

pub mod align;
pub mod chart;
pub mod config;
pub mod estimator;
pub mod parser;
pub mod pipeline;
pub mod provenance;
pub mod table;

// Re-export commonly used types
pub use align::{intersect_entities, window_for, AlignedEntityWindow, AlignmentOutcome};
pub use chart::{ChartArtifact, ChartAxis, ChartMeta, ChartSeries, ThresholdLine};
pub use config::RunConfig;
pub use estimator::{EffectEstimator, EstimateError, LinearEffectEstimator};
pub use parser::{clean_numeric_cell, TableReader};
pub use pipeline::{EffectRecord, PipelineRunner, ResultSet, ResultsArtifact, RunSummary};
pub use provenance::{fingerprint_file, InputFingerprint, ProvenanceLog, RunHeader};
pub use table::{CleanStats, TimeSeriesTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
