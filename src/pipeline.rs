// 🚦 Pipeline Runner - per-entity align → estimate → record loop
// Entities are independent: one entity's failure never aborts the run.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::align::{intersect_entities, window_for, AlignmentOutcome};
use crate::estimator::EffectEstimator;
use crate::provenance::ProvenanceLog;
use crate::table::{CleanStats, TimeSeriesTable};

// ============================================================================
// EFFECT RECORD
// ============================================================================

/// EffectRecord - one recorded entity
///
/// Created exactly once, never mutated. A record only exists when alignment
/// produced a window AND estimation succeeded; on estimator failure the means
/// are discarded along with the estimate so the three value series stay
/// index-aligned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectRecord {
    pub entity: String,
    pub mean_treatment: f64,
    pub mean_outcome: f64,
    pub effect: f64,
    pub years_used: Vec<i32>,
}

// ============================================================================
// RESULT SET
// ============================================================================

/// ResultSet - EffectRecords in the order entities were processed
/// (intersection order, stable, not sorted)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    records: Vec<EffectRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet { records: Vec::new() }
    }

    pub(crate) fn push(&mut self, record: EffectRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EffectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn entities(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.entity.as_str()).collect()
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

/// RunSummary - how the candidate entities fared
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Entities present in both tables
    pub candidates: usize,

    /// Entities with a window and a successful estimate
    pub recorded: usize,

    /// Entities with no usable window (no common valid years / insufficient data)
    pub skipped: usize,

    /// Entities where the estimator failed
    pub failed: usize,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} candidates: {} recorded, {} skipped, {} failed",
            self.candidates, self.recorded, self.skipped, self.failed
        )
    }
}

// ============================================================================
// RESULTS ARTIFACT
// ============================================================================

/// ResultsArtifact - everything a run produced, as one JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsArtifact {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub treatment_clean: CleanStats,
    pub outcome_clean: CleanStats,
    pub results: ResultSet,
}

// ============================================================================
// PIPELINE RUNNER
// ============================================================================

/// PipelineRunner - drives align + estimate across the shared entities
///
/// Per entity: PENDING → window? → estimate? → RECORDED, or SKIPPED when
/// alignment finds no window, or FAILED when the estimator errors. Terminal
/// outcomes are logged to provenance; the run always continues to the next
/// entity.
pub struct PipelineRunner<'a> {
    estimator: &'a dyn EffectEstimator,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(estimator: &'a dyn EffectEstimator) -> Self {
        PipelineRunner { estimator }
    }

    /// Process every shared entity in intersection order.
    ///
    /// Sequential by entity. Entities share no state, so this loop could be
    /// parallelized, but ResultSet and provenance order must then still be
    /// the canonical intersection order.
    pub fn run(
        &self,
        treatment: &TimeSeriesTable,
        outcome: &TimeSeriesTable,
        log: &mut ProvenanceLog,
    ) -> Result<(ResultSet, RunSummary)> {
        let candidates = intersect_entities(treatment, outcome);

        let mut results = ResultSet::new();
        let mut summary = RunSummary {
            candidates: candidates.len(),
            ..RunSummary::default()
        };

        for entity in &candidates {
            match window_for(entity, treatment, outcome) {
                AlignmentOutcome::Window(window) => {
                    match self.estimator.estimate(&window.treatment, &window.outcome) {
                        Ok(effect) => {
                            println!("Causal estimate for {}: {}", entity, effect);
                            log.record_entity(entity, &window.years)?;
                            results.push(EffectRecord {
                                entity: entity.clone(),
                                mean_treatment: window.mean_treatment(),
                                mean_outcome: window.mean_outcome(),
                                effect,
                                years_used: window.years,
                            });
                            summary.recorded += 1;
                        }
                        Err(error) => {
                            eprintln!("Error for {}: {}", entity, error);
                            log.record_failure(entity, &error)?;
                            summary.failed += 1;
                        }
                    }
                }
                no_window => {
                    // skip_reason is always Some for non-window outcomes
                    let reason = no_window.skip_reason().unwrap_or("no window");
                    println!("Skipping {} due to {}.", entity, reason);
                    log.record_skip(entity, reason)?;
                    summary.skipped += 1;
                }
            }
        }

        Ok((results, summary))
    }
}

// ============================================================================
// TESTS
// ============================================================================
