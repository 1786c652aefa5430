//! Core data types for the CTD auto-fire planner.
//!
//! This module defines the shared domain model imported by all other modules:
//! station/basin identifiers, depth-to-pressure tables, bottle firing orders
//! and the fire plan handed to the acquisition software. It contains no I/O.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Number of bottle positions on the standard rosette carousel.
pub const DEFAULT_TOTAL_BOTTLES: u32 = 24;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Normalizes a station or basin identifier for lookup.
///
/// Identifiers are case-insensitive; everything is stored and compared in
/// upper case with surrounding whitespace removed.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// Pressure tables
// ---------------------------------------------------------------------------

/// Target pressure for one depth in a basin profile.
///
/// `Missing` means "not a firing depth for this basin". It is kept distinct
/// from a zero pressure, which is a legitimate (surface) target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pressure {
    Value(f64),
    Missing,
}

impl Pressure {
    pub fn value(&self) -> Option<f64> {
        match self {
            Pressure::Value(v) => Some(*v),
            Pressure::Missing => None,
        }
    }
}

/// Depth (whole metres) to target pressure for a single basin, iterated in
/// ascending depth order.
pub type DepthPressureTable = BTreeMap<u32, Pressure>;

/// A basin together with its depth/pressure profile, as resolved for a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationPressures {
    pub station: String,
    pub basin: String,
    pub pressures: DepthPressureTable,
}

// ---------------------------------------------------------------------------
// Fire plan
// ---------------------------------------------------------------------------

/// One bottle closure in a fire plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirePlanEntry {
    /// Target depth in metres this entry was derived from.
    pub depth: Option<u32>,
    pub bottle_number: u32,
    /// Pressure (dbar) at which the bottle closes.
    pub fire_at: f64,
    /// 0-based position in the firing sequence.
    pub sequence_index: usize,
}

/// Ordered bottle closures for one cast.
///
/// `sequence_index` is contiguous from 0 and matches the position of each
/// entry in `entries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirePlan {
    pub entries: Vec<FirePlanEntry>,
}

impl FirePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bottle_numbers(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.bottle_number).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FirePlanEntry> {
        self.entries.iter()
    }
}

/// A depth/bottle pair entered by the operator, with an optional pressure
/// offset applied on top of the basin's standard pressure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFireEntry {
    pub depth: u32,
    pub bottle_number: u32,
    #[serde(default)]
    pub offset: f64,
}

impl UserFireEntry {
    pub fn new(depth: u32, bottle_number: u32) -> Self {
        Self { depth, bottle_number, offset: 0.0 }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while deriving or validating a fire plan.
///
/// All variants are recoverable and carry enough context for the operator to
/// correct the input.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoFireError {
    /// The station is not in the station/basin list.
    UnknownStation { station: String },
    /// The station resolves to a basin that has no column in the pressure matrix.
    NoPressureTable { station: String, basin: String },
    /// A user-supplied depth has no target pressure for the basin.
    UndefinedDepth { station: String, basin: String, depth: u32 },
    /// A user-supplied offset does not yield a finite fire pressure.
    InvalidOffset { station: String, depth: u32, offset: f64 },
    /// No (or too short a) firing order is configured for the bottle count.
    NoBottleOrderDefined { total_bottles: u32, active_bottles: usize },
    /// The plan has more entries than the rosette has bottles.
    TooManyDepths { depths: usize, capacity: usize },
    /// A bottle number occurs more than once in the plan.
    DuplicateBottle { bottle: u32 },
}

impl std::fmt::Display for AutoFireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoFireError::UnknownStation { station } => {
                write!(f, "Unknown station: {}", station)
            }
            AutoFireError::NoPressureTable { station, basin } => {
                write!(f, "No pressure table for basin {} (station {})", basin, station)
            }
            AutoFireError::UndefinedDepth { station, basin, depth } => write!(
                f,
                "No pressure defined at {} m for basin {} (station {})",
                depth, basin, station
            ),
            AutoFireError::InvalidOffset { station, depth, offset } => write!(
                f,
                "Offset {} at {} m gives no usable fire pressure (station {})",
                offset, depth, station
            ),
            AutoFireError::NoBottleOrderDefined { total_bottles, active_bottles } => write!(
                f,
                "No bottle order defined for {} active of {} bottles",
                active_bottles, total_bottles
            ),
            AutoFireError::TooManyDepths { depths, capacity } => write!(
                f,
                "Nr of depths ({}) is more than nr of water bottles ({})",
                depths, capacity
            ),
            AutoFireError::DuplicateBottle { bottle } => {
                write!(f, "Bottle {} is used more than once", bottle)
            }
        }
    }
}

impl std::error::Error for AutoFireError {}

/// Errors that can arise when loading a reference table.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The file could not be read.
    Io { path: String, message: String },
    /// The file was read but is not in the expected format.
    Parse { path: String, message: String },
    /// Loading succeeded but produced no usable rows.
    Empty { path: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, message } => write!(f, "Cannot read {}: {}", path, message),
            LoadError::Parse { path, message } => {
                write!(f, "Parse error in {}: {}", path, message)
            }
            LoadError::Empty { path } => write!(f, "No usable rows in {}", path),
        }
    }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
