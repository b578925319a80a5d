// 🧹 Table Reader - delimited surveillance exports → TimeSeriesTable
// Handles the messy parts of the WHO exports: legacy encoding, semicolon
// delimiter, European number formatting, ragged rows.

use anyhow::{anyhow, bail, Context, Result};
use encoding_rs::Encoding;
use std::collections::HashMap;
use std::path::Path;

use crate::config::RunConfig;
use crate::table::{CleanStats, TimeSeriesTable};

// ============================================================================
// CELL CLEANUP
// ============================================================================

/// Parse one numeric cell written with `.` thousands and `,` decimal
/// separators ("1.234,56" → 1234.56). Anything that still fails to parse is
/// missing, never an error.
pub fn clean_numeric_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let canonical = trimmed.replace('.', "").replace(',', ".");
    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// TABLE READER
// ============================================================================

/// TableReader - builds a TimeSeriesTable from one delimited file
pub struct TableReader {
    delimiter: u8,
    encoding: &'static Encoding,
    entity_column: String,
    min_year: i32,
}

impl TableReader {
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        let encoding = Encoding::for_label(config.encoding.as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding label '{}'", config.encoding))?;

        Ok(TableReader {
            delimiter: config.delimiter_byte()?,
            encoding,
            entity_column: config.entity_column.clone(),
            min_year: config.min_year,
        })
    }

    /// Read and clean one input file.
    ///
    /// Fatal only on structural problems (unreadable file, missing entity
    /// column, no usable year columns). Row and cell level problems are
    /// counted in CleanStats and skipped.
    pub fn read_table(&self, path: &Path) -> Result<(TimeSeriesTable, CleanStats)> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read input file {:?}", path))?;
        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.parse_bytes(&bytes, &source_file)
            .with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Decode + parse raw file bytes. Split out from read_table so the
    /// cleaning rules are testable without touching the filesystem.
    pub fn parse_bytes(&self, bytes: &[u8], source_file: &str) -> Result<(TimeSeriesTable, CleanStats)> {
        let (decoded, _, _) = self.encoding.decode(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(decoded.as_bytes());

        let headers = reader
            .headers()
            .context("Failed to read header row")?
            .clone();

        let entity_idx = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(&self.entity_column))
            .ok_or_else(|| {
                anyhow!(
                    "Entity column '{}' not found in {} (headers: {})",
                    self.entity_column,
                    source_file,
                    headers.iter().take(8).collect::<Vec<_>>().join(", ")
                )
            })?;

        let mut stats = CleanStats {
            source_file: source_file.to_string(),
            ..CleanStats::default()
        };

        // Classify remaining columns: integer headers ≥ min_year are year
        // columns, everything else is dropped.
        let mut year_columns: Vec<(usize, i32)> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if idx == entity_idx {
                continue;
            }
            match header.trim().parse::<i32>() {
                Ok(year) if year >= self.min_year => year_columns.push((idx, year)),
                _ => stats.columns_dropped += 1,
            }
        }
        stats.year_columns_kept = year_columns.len();

        if year_columns.is_empty() {
            bail!("No year columns >= {} in {}", self.min_year, source_file);
        }

        let mut table = TimeSeriesTable::new();

        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(_) => {
                    // Bad line in the export, skip it
                    stats.rows_read += 1;
                    stats.rows_skipped += 1;
                    continue;
                }
            };
            stats.rows_read += 1;

            let entity = match record.get(entity_idx) {
                Some(name) if !name.trim().is_empty() => name,
                _ => {
                    stats.rows_skipped += 1;
                    continue;
                }
            };

            let mut row: HashMap<i32, f64> = HashMap::new();
            for &(idx, year) in &year_columns {
                let cell = record.get(idx).unwrap_or("");
                match clean_numeric_cell(cell) {
                    Some(value) => {
                        row.insert(year, value);
                    }
                    None => {
                        if !cell.trim().is_empty() {
                            stats.cells_unparseable += 1;
                        }
                    }
                }
            }

            if table.insert_row(entity, row) {
                stats.key_collisions += 1;
            }
        }

        Ok((table, stats))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> TableReader {
        TableReader::from_config(&RunConfig::default()).unwrap()
    }

    #[test]
    fn test_clean_numeric_cell_locale_formats() {
        assert_eq!(clean_numeric_cell("95"), Some(95.0));
        assert_eq!(clean_numeric_cell(" 83 "), Some(83.0));
        assert_eq!(clean_numeric_cell("1.234,56"), Some(1234.56));
        assert_eq!(clean_numeric_cell("0,5"), Some(0.5));
        assert_eq!(clean_numeric_cell("-12,7"), Some(-12.7));
        assert_eq!(clean_numeric_cell(""), None);
        assert_eq!(clean_numeric_cell("   "), None);
        assert_eq!(clean_numeric_cell("n/a"), None);
        assert_eq!(clean_numeric_cell("<1"), None);
    }

    #[test]
    fn test_parse_basic_table() {
        let csv = "Country;1999;2000;2001\nFrance;50;80;90\nSpain;10;20;30\n";
        let (table, stats) = reader().parse_bytes(csv.as_bytes(), "test.csv").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.value("france", 2000), Some(80.0));
        assert_eq!(table.value("spain", 2001), Some(30.0));
        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.rows_skipped, 0);
        assert_eq!(stats.year_columns_kept, 3);
    }

    #[test]
    fn test_year_columns_below_minimum_are_dropped() {
        let csv = "Country;1979;1980;Notes\nFrance;1;2;hello\n";
        let (table, stats) = reader().parse_bytes(csv.as_bytes(), "test.csv").unwrap();

        assert_eq!(table.value("france", 1980), Some(2.0));
        assert_eq!(table.value("france", 1979), None);
        assert_eq!(stats.year_columns_kept, 1);
        // 1979 and the free-text column
        assert_eq!(stats.columns_dropped, 2);
    }

    #[test]
    fn test_unparseable_cells_become_missing() {
        let csv = "Country;2000;2001\nFrance;abc;90\n";
        let (table, stats) = reader().parse_bytes(csv.as_bytes(), "test.csv").unwrap();

        assert_eq!(table.value("france", 2000), None);
        assert_eq!(table.value("france", 2001), Some(90.0));
        assert_eq!(stats.cells_unparseable, 1);
    }

    #[test]
    fn test_empty_entity_rows_are_skipped() {
        let csv = "Country;2000\nFrance;80\n ;99\n";
        let (table, stats) = reader().parse_bytes(csv.as_bytes(), "test.csv").unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.rows_skipped, 1);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        // Ragged row: missing trailing cells are just missing values
        let csv = "Country;2000;2001\nFrance;80\n";
        let (table, stats) = reader().parse_bytes(csv.as_bytes(), "test.csv").unwrap();

        assert_eq!(table.value("france", 2000), Some(80.0));
        assert_eq!(table.value("france", 2001), None);
        assert_eq!(stats.rows_skipped, 0);
    }

    #[test]
    fn test_key_collisions_counted_last_write_wins() {
        let csv = "Country;2000\nFrance;80\nFRANCE ;85\n";
        let (table, stats) = reader().parse_bytes(csv.as_bytes(), "test.csv").unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(stats.key_collisions, 1);
        assert_eq!(table.value("france", 2000), Some(85.0));
    }

    #[test]
    fn test_missing_entity_column_is_fatal() {
        let csv = "Region;2000\nEurope;80\n";
        let result = reader().parse_bytes(csv.as_bytes(), "test.csv");

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Country"));
    }

    #[test]
    fn test_no_year_columns_is_fatal() {
        let csv = "Country;Notes\nFrance;hello\n";
        let result = reader().parse_bytes(csv.as_bytes(), "test.csv");

        assert!(result.is_err());
    }

    #[test]
    fn test_latin1_bytes_decode() {
        // "Perú" in ISO-8859-1, ú = 0xFA
        let mut bytes = b"Country;2000\nPer".to_vec();
        bytes.push(0xFA);
        bytes.extend_from_slice(b";80\n");

        let (table, _) = reader().parse_bytes(&bytes, "test.csv").unwrap();
        assert_eq!(table.value("perú", 2000), Some(80.0));
    }

    #[test]
    fn test_read_table_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.csv");
        std::fs::write(&path, "Country;2000;2001\nFrance;80;90\n").unwrap();

        let (table, stats) = reader().read_table(&path).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(stats.source_file, "coverage.csv");
    }

    #[test]
    fn test_unreadable_file_is_fatal() {
        let result = reader().read_table(Path::new("/nonexistent/coverage.csv"));
        assert!(result.is_err());
    }
}
