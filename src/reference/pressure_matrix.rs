//! Standard depth/pressure matrix.
//!
//! Tab-delimited table with one row per standard depth and one column per
//! basin. The depth column (named `djup` in the ship's files) is the join
//! key; every other column holds the in-situ pressure at which a bottle
//! should close for that basin. Lines starting with `#` are comments.
//!
//! A blank cell means the depth is not sampled in that basin. It is kept as
//! [`Pressure::Missing`] rather than read as zero.

use std::collections::HashMap;
use std::path::Path;

use super::read_windows_1252;
use crate::logging::{self, Component};
use crate::model::{normalize_id, DepthPressureTable, LoadError, Pressure};

/// Default name of the depth column.
pub const DEPTH_COLUMN: &str = "djup";

/// Per-basin depth/pressure tables, immutable after load.
#[derive(Debug, Clone, Default)]
pub struct PressureMatrix {
    depths: Vec<u32>,
    basins: Vec<String>,
    tables: HashMap<String, DepthPressureTable>,
}

impl PressureMatrix {
    pub fn load(path: &Path, depth_column: &str) -> Result<Self, LoadError> {
        let text = read_windows_1252(path)?;
        Self::parse(&text, depth_column, &path.display().to_string())
    }

    /// Parses matrix text. `source` names the input in diagnostics.
    pub fn parse(text: &str, depth_column: &str, source: &str) -> Result<Self, LoadError> {
        let parse_err = |message: String| LoadError::Parse {
            path: source.to_string(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .flexible(true)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers().map_err(|e| parse_err(e.to_string()))?.clone();
        let depth_idx = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(depth_column))
            .ok_or_else(|| parse_err(format!("no '{}' column in header", depth_column)))?;

        // Basin name -> column index. A repeated header keeps the later column.
        let mut matrix = PressureMatrix::default();
        let mut columns: Vec<(String, usize)> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if idx == depth_idx || header.trim().is_empty() {
                continue;
            }
            let basin = normalize_id(header);
            match columns.iter_mut().find(|(name, _)| *name == basin) {
                Some(existing) => existing.1 = idx,
                None => {
                    matrix.basins.push(basin.clone());
                    columns.push((basin, idx));
                }
            }
        }
        for basin in &matrix.basins {
            matrix.tables.insert(basin.clone(), DepthPressureTable::new());
        }

        let mut skipped = 0;
        for (row_no, record) in reader.records().enumerate() {
            let record = record.map_err(|e| parse_err(e.to_string()))?;
            let depth = match record.get(depth_idx).and_then(parse_depth) {
                Some(depth) => depth,
                None => {
                    logging::warn(
                        Component::PressureMatrix,
                        None,
                        &format!("{} row {}: no usable depth, row dropped", source, row_no + 2),
                    );
                    skipped += 1;
                    continue;
                }
            };

            matrix.depths.push(depth);
            for (basin, idx) in &columns {
                let pressure = parse_pressure(record.get(*idx).unwrap_or(""));
                if let Some(table) = matrix.tables.get_mut(basin) {
                    table.insert(depth, pressure);
                }
            }
        }

        logging::log_load_summary(Component::PressureMatrix, source, matrix.depths.len(), skipped);
        if matrix.depths.is_empty() || matrix.basins.is_empty() {
            return Err(LoadError::Empty { path: source.to_string() });
        }
        Ok(matrix)
    }

    /// Every depth row in source order.
    pub fn depths(&self) -> &[u32] {
        &self.depths
    }

    /// Basin columns in header order.
    pub fn basins(&self) -> &[String] {
        &self.basins
    }

    /// Depth/pressure profile for a basin, ascending by depth.
    pub fn pressure_table_for(&self, basin: &str) -> Option<&DepthPressureTable> {
        self.tables.get(&normalize_id(basin))
    }
}

/// Depth cells may carry a fraction (`125.0`); depths are whole metres.
/// Values outside `u32` are rejected rather than saturated.
fn parse_depth(cell: &str) -> Option<u32> {
    let value: f64 = cell.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let whole = value.trunc();
    if whole > f64::from(u32::MAX) {
        return None;
    }
    Some(whole as u32)
}

fn parse_pressure(cell: &str) -> Pressure {
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Pressure::Value(value),
        _ => Pressure::Missing,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
