// 📝 Provenance Log - which years fed each estimate, and what was skipped
// Append-only text file. The per-entity entry format is stable because
// downstream notebooks grep it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// INPUT FINGERPRINTS
// ============================================================================

/// InputFingerprint - identifies exactly which file bytes a run consumed
#[derive(Debug, Clone, Serialize)]
pub struct InputFingerprint {
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

/// Hash an input file for the run header.
pub fn fingerprint_file(path: &Path) -> Result<InputFingerprint> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read input file {:?} for fingerprinting", path))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();

    Ok(InputFingerprint {
        path: path.display().to_string(),
        sha256: format!("{:x}", digest),
        bytes: bytes.len() as u64,
    })
}

// ============================================================================
// RUN HEADER
// ============================================================================

/// RunHeader - written once at the top of the log
#[derive(Debug, Clone, Serialize)]
pub struct RunHeader {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub estimator: String,
    pub inputs: Vec<InputFingerprint>,
}

impl RunHeader {
    pub fn new(estimator: &str, inputs: Vec<InputFingerprint>) -> Self {
        RunHeader {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            estimator: estimator.to_string(),
            inputs,
        }
    }
}

// ============================================================================
// PROVENANCE LOG
// ============================================================================

/// Uppercase the first character, leave the rest as stored (keys are already
/// lowercase): "france" → "France".
pub fn capitalize(entity: &str) -> String {
    let mut chars = entity.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// ProvenanceLog - append-only sink for per-entity outcomes
pub struct ProvenanceLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ProvenanceLog {
    /// Create the log file and write the run header.
    pub fn create(path: &Path, header: &RunHeader) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {:?}", parent))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create provenance log {:?}", path))?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "# coverage-effect v{} run {}", crate::VERSION, header.run_id)?;
        writeln!(writer, "# started: {}", header.started_at.to_rfc3339())?;
        writeln!(writer, "# estimator: {}", header.estimator)?;
        for input in &header.inputs {
            writeln!(
                writer,
                "# input: {} sha256={} ({} bytes)",
                input.path, input.sha256, input.bytes
            )?;
        }
        writeln!(writer)?;

        Ok(ProvenanceLog {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One entry per recorded entity. Format is stable:
    ///
    /// ```text
    /// Country: France
    /// Years used for causal analysis: 2000, 2001
    /// ```
    pub fn record_entity(&mut self, entity: &str, years: &[i32]) -> Result<()> {
        let years_text = years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(self.writer, "Country: {}", capitalize(entity))?;
        writeln!(self.writer, "Years used for causal analysis: {}", years_text)?;
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn record_skip(&mut self, entity: &str, reason: &str) -> Result<()> {
        writeln!(self.writer, "Skipped {}: {}", capitalize(entity), reason)?;
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn record_failure(&mut self, entity: &str, error: &dyn Display) -> Result<()> {
        writeln!(self.writer, "Estimation failed for {}: {}", capitalize(entity), error)?;
        writeln!(self.writer)?;
        Ok(())
    }

    /// Flush and close, returning the log path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush().context("Failed to flush provenance log")?;
        Ok(self.path)
    }
}

// ============================================================================
// TESTS
// ============================================================================
