//! Bottle-firing plan derivation.
//!
//! Two ways to build a plan for a station:
//!
//! - [`AutoFirePlanner::plan_for_station`] takes the basin's standard depths,
//!   shallowest first, and pairs them with the rosette firing order.
//! - [`AutoFirePlanner::plan_from_user_input`] takes an operator-supplied
//!   depth/bottle list, looks up each depth's standard pressure and applies
//!   the per-entry offset. Deepest target fires first.
//!
//! Planning performs no I/O and never mutates the reference tables.

use crate::logging::{self, Component};
use crate::model::{
    normalize_id, AutoFireError, DepthPressureTable, FirePlan, FirePlanEntry, StationPressures,
    UserFireEntry,
};
use crate::reference::ReferenceTables;

/// Plans bottle closures from the shared reference tables.
#[derive(Debug, Clone, Copy)]
pub struct AutoFirePlanner<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> AutoFirePlanner<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    /// Resolves station → basin → depth/pressure table.
    pub fn pressure_mapping_for_station(&self, station: &str) -> Result<StationPressures, AutoFireError> {
        let (basin, table) = self.resolve(station)?;
        Ok(StationPressures {
            station: normalize_id(station),
            basin: basin.to_string(),
            pressures: table.clone(),
        })
    }

    fn resolve(&self, station: &str) -> Result<(&'a str, &'a DepthPressureTable), AutoFireError> {
        let basin = self
            .tables
            .stations
            .basin_for(station)
            .ok_or_else(|| AutoFireError::UnknownStation { station: normalize_id(station) })?;
        let table = self
            .tables
            .pressures
            .pressure_table_for(basin)
            .ok_or_else(|| AutoFireError::NoPressureTable {
                station: normalize_id(station),
                basin: basin.to_string(),
            })?;
        Ok((basin, table))
    }

    /// Default plan for a station.
    ///
    /// When `active_bottles` is `None` every depth with a standard pressure
    /// gets a bottle. Otherwise only the first `active_bottles` such depths,
    /// shallowest first, are used.
    pub fn plan_for_station(
        &self,
        station: &str,
        total_bottles: u32,
        active_bottles: Option<usize>,
    ) -> Result<FirePlan, AutoFireError> {
        let (basin, table) = self.resolve(station)?;

        let targets: Vec<(u32, f64)> = table
            .iter()
            .filter_map(|(depth, pressure)| pressure.value().map(|p| (*depth, p)))
            .collect();
        let active = active_bottles.unwrap_or(targets.len());
        let targets = &targets[..active.min(targets.len())];

        let bottles = self.tables.bottle_orders.bottle_order(active, total_bottles);
        if active > 0 && (bottles.is_empty() || bottles.len() < targets.len()) {
            return Err(AutoFireError::NoBottleOrderDefined {
                total_bottles,
                active_bottles: active,
            });
        }

        let entries = targets
            .iter()
            .zip(bottles)
            .enumerate()
            .map(|(index, (&(depth, fire_at), bottle_number))| FirePlanEntry {
                depth: Some(depth),
                bottle_number,
                fire_at,
                sequence_index: index,
            })
            .collect::<Vec<_>>();

        logging::debug(
            Component::Planner,
            Some(&normalize_id(station)),
            &format!("default plan for basin {}: {} bottles", basin, entries.len()),
        );
        Ok(FirePlan { entries })
    }

    /// Plan from an operator-supplied depth/bottle list.
    pub fn plan_from_user_input(
        &self,
        station: &str,
        entries: &[UserFireEntry],
    ) -> Result<FirePlan, AutoFireError> {
        let (basin, table) = self.resolve(station)?;

        let mut sorted: Vec<&UserFireEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| b.depth.cmp(&a.depth));

        let mut plan = FirePlan::default();
        for (index, entry) in sorted.into_iter().enumerate() {
            let base = table
                .get(&entry.depth)
                .and_then(|p| p.value())
                .ok_or_else(|| AutoFireError::UndefinedDepth {
                    station: normalize_id(station),
                    basin: basin.to_string(),
                    depth: entry.depth,
                })?;
            let fire_at = base + entry.offset;
            if !fire_at.is_finite() {
                return Err(AutoFireError::InvalidOffset {
                    station: normalize_id(station),
                    depth: entry.depth,
                    offset: entry.offset,
                });
            }
            plan.entries.push(FirePlanEntry {
                depth: Some(entry.depth),
                bottle_number: entry.bottle_number,
                fire_at,
                sequence_index: index,
            });
        }
        Ok(plan)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
