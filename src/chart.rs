// 📊 Chart Artifact - plot-friendly data for the results chart
// The artifact is plain arrays; the HTML page renders it client-side with
// three y-axes (effect, coverage %, cases/1M) over the entity x-axis.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::RunConfig;
use crate::pipeline::ResultSet;

/// Entity tick labels are cut to this many characters so the x-axis stays
/// readable with ~150 countries.
const TICK_LABEL_CHARS: usize = 15;

// ============================================================================
// ARTIFACT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartMeta {
    pub tool: String,
    pub tool_version: String,
    pub title: String,
    pub year_range: String,
    pub created_at: DateTime<Utc>,
}

/// Which y-axis a series is plotted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartAxis {
    /// Primary axis: estimated causal effect
    Effect,
    /// Secondary axis: mean coverage percent
    Coverage,
    /// Tertiary axis: mean cases per 1M
    Incidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub axis: ChartAxis,
    pub values: Vec<f64>,
}

/// Horizontal reference line (the coverage target)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdLine {
    pub label: String,
    pub axis: ChartAxis,
    pub value: f64,
}

/// ChartArtifact - one self-contained chart description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub schema_version: String,
    pub meta: ChartMeta,
    /// Full entity names, x-axis order = ResultSet order
    pub entities: Vec<String>,
    /// Truncated tick labels, parallel to `entities`
    pub ticks: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub threshold: ThresholdLine,
}

impl ChartArtifact {
    /// Build the artifact from a finished ResultSet.
    pub fn from_results(results: &ResultSet, config: &RunConfig) -> Self {
        let records = results.records();
        let entities: Vec<String> = records.iter().map(|r| r.entity.clone()).collect();
        let ticks: Vec<String> = entities
            .iter()
            .map(|name| name.chars().take(TICK_LABEL_CHARS).collect())
            .collect();

        let series = vec![
            ChartSeries {
                label: "Mean Vaccination Coverage (%)".to_string(),
                axis: ChartAxis::Coverage,
                values: records.iter().map(|r| r.mean_treatment).collect(),
            },
            ChartSeries {
                label: "Causal Effect Vac Coverage on Cases/1M".to_string(),
                axis: ChartAxis::Effect,
                values: records.iter().map(|r| r.effect).collect(),
            },
            ChartSeries {
                label: "Mean Reported Cases/1M".to_string(),
                axis: ChartAxis::Incidence,
                values: records.iter().map(|r| r.mean_outcome).collect(),
            },
        ];

        ChartArtifact {
            schema_version: "coverage_effect_chart_v1".to_string(),
            meta: ChartMeta {
                tool: "coverage-effect".to_string(),
                tool_version: crate::VERSION.to_string(),
                title: config.chart_title.clone(),
                year_range: config.year_range.clone(),
                created_at: Utc::now(),
            },
            entities,
            ticks,
            series,
            threshold: ThresholdLine {
                label: format!("Coverage target ({}%)", config.coverage_target),
                axis: ChartAxis::Coverage,
                value: config.coverage_target,
            },
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write chart artifact {:?}", path))
    }

    /// Standalone interactive HTML page with the artifact inlined.
    pub fn render_html(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        let page = include_str!("../web/chart.html")
            .replace("__TITLE__", &self.meta.title)
            .replace("__ARTIFACT_JSON__", &json);
        Ok(page)
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render_html()?)
            .with_context(|| format!("Failed to write chart {:?}", path))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EffectRecord;

    fn result_set() -> ResultSet {
        let mut results = ResultSet::new();
        for (entity, coverage, effect, cases) in [
            ("france", 92.0, -1.2, 10.0),
            ("united republic of tanzania", 78.0, -0.4, 55.0),
        ] {
            results.push(EffectRecord {
                entity: entity.to_string(),
                mean_treatment: coverage,
                mean_outcome: cases,
                effect,
                years_used: vec![2000, 2001],
            });
        }
        results
    }

    #[test]
    fn test_series_are_parallel_to_entities() {
        let artifact = ChartArtifact::from_results(&result_set(), &RunConfig::default());

        assert_eq!(artifact.entities.len(), 2);
        assert_eq!(artifact.ticks.len(), 2);
        for series in &artifact.series {
            assert_eq!(series.values.len(), 2);
        }
    }

    #[test]
    fn test_ticks_are_truncated() {
        let artifact = ChartArtifact::from_results(&result_set(), &RunConfig::default());

        assert_eq!(artifact.ticks[0], "france");
        assert_eq!(artifact.ticks[1], "united republic");
        assert_eq!(artifact.ticks[1].chars().count(), 15);
    }

    #[test]
    fn test_series_axes_and_values() {
        let artifact = ChartArtifact::from_results(&result_set(), &RunConfig::default());

        let coverage = &artifact.series[0];
        assert_eq!(coverage.axis, ChartAxis::Coverage);
        assert_eq!(coverage.values, vec![92.0, 78.0]);

        let effect = &artifact.series[1];
        assert_eq!(effect.axis, ChartAxis::Effect);
        assert_eq!(effect.values, vec![-1.2, -0.4]);

        assert_eq!(artifact.threshold.value, 95.0);
        assert_eq!(artifact.threshold.axis, ChartAxis::Coverage);
    }

    #[test]
    fn test_render_html_embeds_artifact() {
        let artifact = ChartArtifact::from_results(&result_set(), &RunConfig::default());
        let html = artifact.render_html().unwrap();

        assert!(html.contains("coverage_effect_chart_v1"));
        assert!(html.contains(&artifact.meta.title));
        assert!(html.contains("france"));
    }

    #[test]
    fn test_write_artifacts_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ChartArtifact::from_results(&result_set(), &RunConfig::default());

        let json_path = dir.path().join("chart.json");
        let html_path = dir.path().join("chart.html");
        artifact.write_json(&json_path).unwrap();
        artifact.write_html(&html_path).unwrap();

        let reloaded: ChartArtifact =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(reloaded.entities, artifact.entities);
        assert!(std::fs::read_to_string(&html_path).unwrap().contains("<html"));
    }
}
