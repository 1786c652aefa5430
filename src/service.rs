//! Composition root for auto-fire planning.
//!
//! [`AutoFireService`] owns the reference tables loaded at start-up and the
//! acquisition settings the plans are written into. Every plan goes through
//! [`validate`] before it reaches the settings; a rejected plan leaves the
//! settings untouched.

use crate::acquisition::{AcquisitionConfig, AcquisitionError};
use crate::autofire::{validate, AutoFirePlanner};
use crate::logging::{self, Component};
use crate::model::{normalize_id, AutoFireError, FirePlan, LoadError, StationPressures, UserFireEntry};
use crate::reference::ReferenceTables;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ServiceError {
    AutoFire(AutoFireError),
    Load(LoadError),
    Acquisition(AcquisitionError),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::AutoFire(e) => write!(f, "{}", e),
            ServiceError::Load(e) => write!(f, "{}", e),
            ServiceError::Acquisition(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<AutoFireError> for ServiceError {
    fn from(e: AutoFireError) -> Self {
        ServiceError::AutoFire(e)
    }
}

impl From<LoadError> for ServiceError {
    fn from(e: LoadError) -> Self {
        ServiceError::Load(e)
    }
}

impl From<AcquisitionError> for ServiceError {
    fn from(e: AcquisitionError) -> Self {
        ServiceError::Acquisition(e)
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct AutoFireService<C: AcquisitionConfig> {
    tables: ReferenceTables,
    acquisition: C,
    default_total_bottles: u32,
}

impl<C: AcquisitionConfig> AutoFireService<C> {
    pub fn new(tables: ReferenceTables, acquisition: C, default_total_bottles: u32) -> Self {
        Self { tables, acquisition, default_total_bottles }
    }

    pub fn planner(&self) -> AutoFirePlanner<'_> {
        AutoFirePlanner::new(&self.tables)
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn acquisition(&self) -> &C {
        &self.acquisition
    }

    pub fn basin_for(&self, station: &str) -> Result<&str, AutoFireError> {
        self.tables
            .stations
            .basin_for(station)
            .ok_or_else(|| AutoFireError::UnknownStation { station: normalize_id(station) })
    }

    pub fn pressure_mapping_for_station(&self, station: &str) -> Result<StationPressures, AutoFireError> {
        self.planner().pressure_mapping_for_station(station)
    }

    /// Default plan for `station` without committing it.
    pub fn auto_fire_info_for_station(
        &self,
        station: &str,
        total_bottles: Option<u32>,
        active_bottles: Option<usize>,
    ) -> Result<FirePlan, AutoFireError> {
        self.planner().plan_for_station(
            station,
            total_bottles.unwrap_or(self.default_total_bottles),
            active_bottles,
        )
    }

    /// Plans the station's default bottles and writes them to the settings.
    pub fn apply_default_plan(&mut self, station: &str) -> Result<FirePlan, ServiceError> {
        let plan = self.auto_fire_info_for_station(station, None, None)?;
        self.commit(station, &plan)?;
        Ok(plan)
    }

    /// Plans operator-entered bottles and writes them to the settings.
    pub fn apply_user_plan(&mut self, station: &str, entries: &[UserFireEntry]) -> Result<FirePlan, ServiceError> {
        let plan = self.planner().plan_from_user_input(station, entries)?;
        self.commit(station, &plan)?;
        Ok(plan)
    }

    /// Validates against the rosette and writes the plan into the settings.
    pub fn commit(&mut self, station: &str, plan: &FirePlan) -> Result<(), ServiceError> {
        if let Err(e) = validate(plan, self.acquisition.nr_of_water_bottles()) {
            logging::warn(Component::Planner, Some(station), &format!("plan rejected: {}", e));
            return Err(e.into());
        }
        let previous = self.acquisition.current_plan();
        self.acquisition.set_auto_fire_bottles(plan);
        if let Err(e) = self.acquisition.save() {
            self.acquisition.set_auto_fire_bottles(&previous);
            logging::error(Component::Acquisition, Some(station), &format!("plan not saved: {}", e));
            return Err(e.into());
        }
        logging::info(
            Component::Planner,
            Some(station),
            &format!("auto-fire plan with {} bottles written", plan.len()),
        );
        Ok(())
    }

    /// Switches auto-fire and manual firing together and saves.
    ///
    /// On a failed save both switches keep their previous values.
    pub fn set_auto_fire(&mut self, value: bool) -> Result<(), ServiceError> {
        let (auto_fire, manual) = (self.acquisition.auto_fire(), self.acquisition.allow_manual_firing());
        self.acquisition.set_auto_fire(value);
        if let Err(e) = self.acquisition.save() {
            self.acquisition.set_auto_fire_enabled(auto_fire);
            self.acquisition.set_allow_manual_firing(manual);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn set_min_pressure_or_depth(&mut self, value: f64) -> Result<(), ServiceError> {
        let previous = self.acquisition.min_pressure_or_depth();
        self.acquisition.set_min_pressure_or_depth(value);
        if let Err(e) = self.acquisition.save() {
            self.acquisition.set_min_pressure_or_depth(previous);
            return Err(e.into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{AcquisitionSettings, AutoFireBottle};
    use crate::reference::pressure_matrix::DEPTH_COLUMN;
    use crate::reference::{BottleOrderTable, PressureMatrix, StationBasinIndex};

    #[derive(Default)]
    struct MemoryConfig {
        settings: AcquisitionSettings,
        read_only: bool,
    }

    impl AcquisitionConfig for MemoryConfig {
        fn nr_of_water_bottles(&self) -> usize {
            self.settings.nr_of_water_bottles
        }
        fn auto_fire_bottles(&self) -> &[AutoFireBottle] {
            &self.settings.auto_fire_bottles
        }
        fn set_auto_fire_bottles(&mut self, plan: &FirePlan) {
            self.settings.auto_fire_bottles = plan
                .iter()
                .map(|e| AutoFireBottle { index: e.sequence_index, bottle_number: e.bottle_number, fire_at: e.fire_at })
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
            if self.read_only {
                return Err(AcquisitionError::Io {
                    path: "memory".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            Ok(())
        }
    }

    fn service(capacity: usize) -> AutoFireService<MemoryConfig> {
        let tables = ReferenceTables {
            stations: StationBasinIndex::parse("BY31\tLandsortsdjupet\n", "s").expect("stations"),
            pressures: PressureMatrix::parse(
                "djup\tLandsortsdjupet\n5\t5.1\n10\t10.3\n20\t\n50\t50.5\n",
                DEPTH_COLUMN,
                "m",
            )
            .expect("matrix"),
            bottle_orders: BottleOrderTable::parse("24: [1, 2, 3, 4, 5, 6]\n", "o").expect("orders"),
        };
        let config = MemoryConfig {
            settings: AcquisitionSettings { nr_of_water_bottles: capacity, ..Default::default() },
            read_only: false,
        };
        AutoFireService::new(tables, config, 24)
    }

    #[test]
    fn test_apply_default_plan_writes_bottles() {
        let mut svc = service(24);
        let plan = svc.apply_default_plan("by31").expect("default plan should apply");
        assert_eq!(plan.bottle_numbers(), vec![3, 2, 1]);
        let written: Vec<u32> = svc.acquisition().auto_fire_bottles().iter().map(|b| b.bottle_number).collect();
        assert_eq!(written, vec![3, 2, 1]);
    }

    #[test]
    fn test_rejected_plan_leaves_settings_untouched() {
        let mut svc = service(2);
        let result = svc.apply_default_plan("BY31");
        assert!(
            matches!(result, Err(ServiceError::AutoFire(AutoFireError::TooManyDepths { depths: 3, capacity: 2 }))),
            "got {:?}",
            result
        );
        assert!(svc.acquisition().auto_fire_bottles().is_empty());
    }

    #[test]
    fn test_duplicate_user_bottles_rejected() {
        let mut svc = service(24);
        let result = svc.apply_user_plan("BY31", &[UserFireEntry::new(5, 4), UserFireEntry::new(10, 4)]);
        assert!(
            matches!(result, Err(ServiceError::AutoFire(AutoFireError::DuplicateBottle { bottle: 4 }))),
            "got {:?}",
            result
        );
        assert!(svc.acquisition().auto_fire_bottles().is_empty());
    }

    #[test]
    fn test_apply_user_plan_orders_deepest_first() {
        let mut svc = service(24);
        svc.apply_user_plan("BY31", &[UserFireEntry::new(5, 1), UserFireEntry::new(50, 6).with_offset(1.0)])
            .expect("user plan should apply");
        let bottles = svc.acquisition().auto_fire_bottles();
        assert_eq!(bottles[0], AutoFireBottle { index: 0, bottle_number: 6, fire_at: 51.5 });
        assert_eq!(bottles[1], AutoFireBottle { index: 1, bottle_number: 1, fire_at: 5.1 });
    }

    #[test]
    fn test_unknown_station_reported() {
        let svc = service(24);
        assert_eq!(
            svc.basin_for("zzzz"),
            Err(AutoFireError::UnknownStation { station: "ZZZZ".to_string() })
        );
    }

    #[test]
    fn test_set_auto_fire() {
        let mut svc = service(24);
        svc.set_auto_fire(true).expect("should save");
        assert!(svc.acquisition().auto_fire());
        assert!(svc.acquisition().settings.auto_fire_allow_manual_firing);
    }

    #[test]
    fn test_failed_save_keeps_previous_plan() {
        let mut svc = service(24);
        svc.apply_default_plan("BY31").expect("first plan should apply");
        let before = svc.acquisition().auto_fire_bottles().to_vec();

        svc.acquisition.read_only = true;
        let result = svc.apply_user_plan("BY31", &[UserFireEntry::new(10, 6)]);
        assert!(matches!(result, Err(ServiceError::Acquisition(_))), "got {:?}", result);
        assert_eq!(svc.acquisition().auto_fire_bottles(), before.as_slice());
    }

    #[test]
    fn test_failed_save_keeps_switches() {
        let mut svc = service(24);
        svc.acquisition.read_only = true;
        assert!(svc.set_auto_fire(true).is_err());
        assert!(!svc.acquisition().auto_fire());
        assert!(!svc.acquisition().allow_manual_firing());

        assert!(svc.set_min_pressure_or_depth(4.0).is_err());
        assert_eq!(svc.acquisition().min_pressure_or_depth(), 0.0);
    }
}
