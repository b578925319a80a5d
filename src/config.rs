// ⚙️ Run Configuration
// Defaults mirror the WHO surveillance exports the tool was built around:
// semicolon-delimited, ISO-8859-1, `Country` entity column, years from 1980.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Treatment table (vaccination coverage, percent)
    pub treatment_path: PathBuf,

    /// Outcome table (reported incidence, cases per 1M)
    pub outcome_path: PathBuf,

    /// Directory for all output artifacts
    pub output_dir: PathBuf,

    /// Field delimiter of the input files
    pub delimiter: char,

    /// Encoding label of the input files (resolved via encoding_rs)
    pub encoding: String,

    /// Header of the entity column (matched case-insensitively)
    pub entity_column: String,

    /// Year columns below this are dropped
    pub min_year: i32,

    /// Chart title text
    pub chart_title: String,

    /// Year range text shown in the chart and used in artifact filenames
    pub year_range: String,

    /// Reference line on the coverage axis (WHO herd-immunity target)
    pub coverage_target: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            treatment_path: PathBuf::from("data/vaccination-coverage.csv"),
            outcome_path: PathBuf::from("data/reported-cases.csv"),
            output_dir: PathBuf::from("out"),
            delimiter: ';',
            encoding: "iso-8859-1".to_string(),
            entity_column: "Country".to_string(),
            min_year: 1980,
            chart_title: "Causal estimate of vaccination coverage on reported cases".to_string(),
            year_range: "1980-2023".to_string(),
            coverage_target: 95.0,
        }
    }
}

impl RunConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: RunConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        if self.entity_column.trim().is_empty() {
            bail!("entity_column must not be empty");
        }
        Ok(())
    }

    /// Delimiter as the single byte the csv reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        Ok(self.delimiter as u8)
    }

    // Output artifact paths, all under output_dir

    pub fn provenance_path(&self) -> PathBuf {
        self.output_dir.join(format!("valid-years-{}.txt", self.year_range))
    }

    pub fn chart_html_path(&self) -> PathBuf {
        self.output_dir.join(format!("causal-effect-{}.html", self.year_range))
    }

    pub fn chart_json_path(&self) -> PathBuf {
        self.output_dir.join(format!("causal-effect-{}.json", self.year_range))
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(format!("results-{}.json", self.year_range))
    }
}
