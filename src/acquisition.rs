//! Acquisition-software settings that receive the auto-fire plan.
//!
//! The deck unit software keeps the rosette size, the auto-fire switches and
//! the bottle table in its own settings file. [`AcquisitionConfig`] is the
//! seam the planner writes through; [`SettingsFile`] is a JSON-backed
//! implementation of it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::logging::{self, Component};
use crate::model::{FirePlan, FirePlanEntry, DEFAULT_TOTAL_BOTTLES};

// ---------------------------------------------------------------------------
// Settings model
// ---------------------------------------------------------------------------

/// One row of the acquisition software's auto-fire table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFireBottle {
    pub index: usize,
    pub bottle_number: u32,
    pub fire_at: f64,
}

/// Persisted acquisition settings relevant to bottle firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionSettings {
    /// Bottle positions on the rosette.
    pub nr_of_water_bottles: usize,
    #[serde(default)]
    pub auto_fire: bool,
    #[serde(default)]
    pub auto_fire_allow_manual_firing: bool,
    /// Bottles are not fired above this pressure/depth on the downcast.
    #[serde(default)]
    pub min_pressure_or_depth: f64,
    #[serde(default)]
    pub auto_fire_bottles: Vec<AutoFireBottle>,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            nr_of_water_bottles: DEFAULT_TOTAL_BOTTLES as usize,
            auto_fire: false,
            auto_fire_allow_manual_firing: false,
            min_pressure_or_depth: 0.0,
            auto_fire_bottles: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum AcquisitionError {
    Io { path: String, source: std::io::Error },
    Format { path: String, source: serde_json::Error },
}

impl std::fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquisitionError::Io { path, source } => {
                write!(f, "Acquisition settings {}: {}", path, source)
            }
            AcquisitionError::Format { path, source } => {
                write!(f, "Acquisition settings {} malformed: {}", path, source)
            }
        }
    }
}

impl std::error::Error for AcquisitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AcquisitionError::Io { source, .. } => Some(source),
            AcquisitionError::Format { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// What the planner needs from the acquisition software's configuration.
pub trait AcquisitionConfig {
    /// Rosette capacity.
    fn nr_of_water_bottles(&self) -> usize;

    /// Current auto-fire table.
    fn auto_fire_bottles(&self) -> &[AutoFireBottle];

    /// Replaces the auto-fire table. The plan must already be validated.
    fn set_auto_fire_bottles(&mut self, plan: &FirePlan);

    fn auto_fire(&self) -> bool;

    /// Switches auto-fire without touching manual firing.
    fn set_auto_fire_enabled(&mut self, enabled: bool);

    fn allow_manual_firing(&self) -> bool;

    fn set_allow_manual_firing(&mut self, allowed: bool);

    fn min_pressure_or_depth(&self) -> f64;

    fn set_min_pressure_or_depth(&mut self, value: f64);

    fn save(&self) -> Result<(), AcquisitionError>;

    /// The stored auto-fire table as a plan. Depths are not stored, so every
    /// entry's `depth` is `None`.
    fn current_plan(&self) -> FirePlan {
        FirePlan {
            entries: self
                .auto_fire_bottles()
                .iter()
                .map(|b| FirePlanEntry {
                    depth: None,
                    bottle_number: b.bottle_number,
                    fire_at: b.fire_at,
                    sequence_index: b.index,
                })
                .collect(),
        }
    }

    fn enable_auto_fire(&mut self) {
        self.set_auto_fire_enabled(true);
    }

    fn disable_auto_fire(&mut self) {
        self.set_auto_fire_enabled(false);
    }

    /// Sets auto-fire and manual firing together.
    fn set_auto_fire(&mut self, value: bool) {
        self.set_auto_fire_enabled(value);
        self.set_allow_manual_firing(value);
    }
}

// ---------------------------------------------------------------------------
// JSON settings file
// ---------------------------------------------------------------------------

/// Acquisition settings stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    settings: AcquisitionSettings,
}

impl SettingsFile {
    /// Wraps settings that will be written to `path` on `save`.
    pub fn new(path: impl Into<PathBuf>, settings: AcquisitionSettings) -> Self {
        Self { path: path.into(), settings }
    }

    pub fn load(path: &Path) -> Result<Self, AcquisitionError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| AcquisitionError::Io {
            path: display.clone(),
            source,
        })?;
        let settings = serde_json::from_str(&text).map_err(|source| AcquisitionError::Format {
            path: display,
            source,
        })?;
        Ok(Self { path: path.to_path_buf(), settings })
    }

    pub fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }
}

impl AcquisitionConfig for SettingsFile {
    fn nr_of_water_bottles(&self) -> usize {
        self.settings.nr_of_water_bottles
    }

    fn auto_fire_bottles(&self) -> &[AutoFireBottle] {
        &self.settings.auto_fire_bottles
    }

    fn set_auto_fire_bottles(&mut self, plan: &FirePlan) {
        self.settings.auto_fire_bottles = plan
            .iter()
            .map(|e| AutoFireBottle {
                index: e.sequence_index,
                bottle_number: e.bottle_number,
                fire_at: e.fire_at,
            })
            .collect();
    }

    fn auto_fire(&self) -> bool {
        self.settings.auto_fire
    }

    fn set_auto_fire_enabled(&mut self, enabled: bool) {
        self.settings.auto_fire = enabled;
    }

    fn allow_manual_firing(&self) -> bool {
        self.settings.auto_fire_allow_manual_firing
    }

    fn set_allow_manual_firing(&mut self, allowed: bool) {
        self.settings.auto_fire_allow_manual_firing = allowed;
    }

    fn min_pressure_or_depth(&self) -> f64 {
        self.settings.min_pressure_or_depth
    }

    fn set_min_pressure_or_depth(&mut self, value: f64) {
        self.settings.min_pressure_or_depth = value;
    }

    fn save(&self) -> Result<(), AcquisitionError> {
        let display = self.path.display().to_string();
        let json = serde_json::to_string_pretty(&self.settings).map_err(|source| {
            AcquisitionError::Format { path: display.clone(), source }
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AcquisitionError::Io {
                path: display.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| AcquisitionError::Io {
            path: display.clone(),
            source,
        })?;
        logging::debug(Component::Acquisition, None, &format!("saved {}", display));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
