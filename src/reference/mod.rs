//! Reference tables loaded once per session.
//!
//! Submodules:
//! - `station_basin` — which basin a station belongs to.
//! - `pressure_matrix` — standard depth/pressure profile per basin.
//! - `bottle_order` — rosette firing order per bottle count.

pub mod bottle_order;
pub mod pressure_matrix;
pub mod station_basin;

use std::path::Path;

use encoding::all::WINDOWS_1252;
use encoding::{DecoderTrap, Encoding};

use crate::config::ReferenceConfig;
use crate::model::LoadError;

pub use bottle_order::BottleOrderTable;
pub use pressure_matrix::PressureMatrix;
pub use station_basin::StationBasinIndex;

/// The three reference tables, built by the composition root and shared
/// read-only with every planning request.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub stations: StationBasinIndex,
    pub pressures: PressureMatrix,
    pub bottle_orders: BottleOrderTable,
}

impl ReferenceTables {
    /// Loads all three tables. Any table that fails to load, or loads empty,
    /// fails the whole set.
    pub fn load(config: &ReferenceConfig) -> Result<Self, LoadError> {
        Ok(Self {
            stations: StationBasinIndex::load(&config.station_basin_file)?,
            pressures: PressureMatrix::load(&config.pressure_matrix_file, &config.depth_column)?,
            bottle_orders: BottleOrderTable::load(&config.bottle_order_file)?,
        })
    }
}

/// Reads a Windows-1252 encoded text file, the encoding the reference lists
/// are maintained in.
pub(crate) fn read_windows_1252(path: &Path) -> Result<String, LoadError> {
    let source = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io {
        path: source.clone(),
        message: e.to_string(),
    })?;
    WINDOWS_1252
        .decode(&bytes, DecoderTrap::Replace)
        .map_err(|e| LoadError::Parse {
            path: source,
            message: e.into_owned(),
        })
}
