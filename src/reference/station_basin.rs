//! Station ↔ basin index.
//!
//! Every sampling station belongs to a hydrographic basin, and the basin
//! decides which standard depth profile is used for the auto-fire plan.
//! The list is a Windows-1252 text file with one `STATION<TAB>BASIN` row per
//! line. Lookups are case-insensitive in both directions.

use std::collections::HashMap;
use std::path::Path;

use super::read_windows_1252;
use crate::logging::{self, Component};
use crate::model::{normalize_id, LoadError};

/// Bidirectional station/basin mapping, immutable after load.
#[derive(Debug, Clone, Default)]
pub struct StationBasinIndex {
    station_to_basin: HashMap<String, String>,
    basin_to_station: HashMap<String, String>,
}

impl StationBasinIndex {
    /// Reads and parses a station list file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = read_windows_1252(path)?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parses station list text. `source` names the input in diagnostics.
    ///
    /// Rows that do not have exactly two tab-separated fields are skipped
    /// with a warning. When a station (or basin) appears more than once the
    /// last row wins.
    pub fn parse(text: &str, source: &str) -> Result<Self, LoadError> {
        let mut index = StationBasinIndex::default();
        let mut skipped = 0;

        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<String> = line.split('\t').map(normalize_id).collect();
            let [station, basin] = match <[String; 2]>::try_from(fields) {
                Ok(pair) => pair,
                Err(fields) => {
                    logging::warn(
                        Component::StationBasin,
                        None,
                        &format!("{} line {}: no station or basin found in {:?}", source, line_no + 1, fields),
                    );
                    skipped += 1;
                    continue;
                }
            };

            if let Some(previous) = index.station_to_basin.get(&station) {
                if previous != &basin {
                    logging::debug(
                        Component::StationBasin,
                        Some(&station),
                        &format!("basin {} replaced by {}", previous, basin),
                    );
                }
            }
            index.basin_to_station.insert(basin.clone(), station.clone());
            index.station_to_basin.insert(station, basin);
        }

        logging::log_load_summary(Component::StationBasin, source, index.len(), skipped);
        if index.is_empty() {
            return Err(LoadError::Empty { path: source.to_string() });
        }
        Ok(index)
    }

    /// Basin for a station, or `None` if the station is not listed.
    pub fn basin_for(&self, station: &str) -> Option<&str> {
        self.station_to_basin.get(&normalize_id(station)).map(String::as_str)
    }

    /// Last station listed for a basin, or `None` if the basin is not listed.
    pub fn station_for(&self, basin: &str) -> Option<&str> {
        self.basin_to_station.get(&normalize_id(basin)).map(String::as_str)
    }

    /// All listed stations, sorted.
    pub fn stations(&self) -> Vec<&str> {
        let mut stations: Vec<&str> = self.station_to_basin.keys().map(String::as_str).collect();
        stations.sort_unstable();
        stations
    }

    pub fn len(&self) -> usize {
        self.station_to_basin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.station_to_basin.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
