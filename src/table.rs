// 📋 Time Series Table - entity × year numeric table
// Built once by the cleaning step, immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// TIME SERIES TABLE
// ============================================================================

/// TimeSeriesTable - one row per entity, one value per year
///
/// Entity keys are normalized (trimmed + lowercased) and unique. A (entity,
/// year) pair with no stored value is missing. Entities keep first-seen order
/// so downstream results are deterministic across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeriesTable {
    /// Normalized entity keys in first-seen order
    order: Vec<String>,

    /// entity key → (year → value)
    values: HashMap<String, HashMap<i32, f64>>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        TimeSeriesTable {
            order: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Normalize a raw entity name into a table key.
    ///
    /// Idempotent: normalizing an already-normalized key returns it unchanged.
    /// `"  France "` and `"france"` map to the same key.
    pub fn normalize_key(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// Insert one entity row. The key is normalized here.
    ///
    /// Returns `true` if the normalized key was already present. Collision
    /// policy is last write wins: the previous row is replaced, the entity
    /// keeps its original position.
    pub fn insert_row(&mut self, raw_key: &str, row: HashMap<i32, f64>) -> bool {
        let key = Self::normalize_key(raw_key);
        let collided = self.values.insert(key.clone(), row).is_some();
        if !collided {
            self.order.push(key);
        }
        collided
    }

    /// Entity keys in first-seen order
    pub fn entities(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Stored value for (entity, year). `None` means missing.
    pub fn value(&self, key: &str, year: i32) -> Option<f64> {
        self.values.get(key).and_then(|row| row.get(&year)).copied()
    }

    /// All years with a stored value for this entity, ascending.
    pub fn years_observed(&self, key: &str) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .values
            .get(key)
            .map(|row| row.keys().copied().collect())
            .unwrap_or_default();
        years.sort_unstable();
        years
    }
}

// ============================================================================
// CLEANING STATISTICS
// ============================================================================

/// CleanStats - what the cleaning step did to one input table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanStats {
    /// Source file this table was built from
    pub source_file: String,

    /// Data rows read from the file
    pub rows_read: usize,

    /// Rows dropped (unreadable record or empty entity cell)
    pub rows_skipped: usize,

    /// Non-empty cells that failed numeric parsing (became missing)
    pub cells_unparseable: usize,

    /// Distinct raw names that collapsed onto an existing normalized key
    pub key_collisions: usize,

    /// Year columns kept after the minimum-year filter
    pub year_columns_kept: usize,

    /// Columns dropped (non-year header or below the minimum year)
    pub columns_dropped: usize,
}

impl CleanStats {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows ({} skipped), {} year columns ({} dropped), {} unparseable cells, {} key collisions",
            self.source_file,
            self.rows_read,
            self.rows_skipped,
            self.year_columns_kept,
            self.columns_dropped,
            self.cells_unparseable,
            self.key_collisions
        )
    }

    pub fn has_collisions(&self) -> bool {
        self.key_collisions > 0
    }
}

// ============================================================================
// TESTS
// ============================================================================
