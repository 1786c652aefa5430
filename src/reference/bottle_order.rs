//! Rosette firing order per bottle count.
//!
//! The carousel closes bottles in a fixed physical sequence that depends on
//! how many positions the rosette has. The sequences are kept in a YAML
//! mapping from bottle count to bottle numbers:
//!
//! ```yaml
//! 24: [1, 2, 3, 4, ...]
//! 12: [1, 3, 5, 7, ...]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::logging::{self, Component};
use crate::model::LoadError;

#[derive(Debug, Clone, Default)]
pub struct BottleOrderTable {
    orders: BTreeMap<u32, Vec<u32>>,
}

impl BottleOrderTable {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let source = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: source.clone(),
            message: e.to_string(),
        })?;
        Self::parse(&text, &source)
    }

    pub fn parse(text: &str, source: &str) -> Result<Self, LoadError> {
        let orders: Option<BTreeMap<u32, Vec<u32>>> =
            serde_yaml::from_str(text).map_err(|e| LoadError::Parse {
                path: source.to_string(),
                message: e.to_string(),
            })?;
        let orders = orders.unwrap_or_default();

        logging::log_load_summary(Component::BottleOrder, source, orders.len(), 0);
        if orders.is_empty() {
            return Err(LoadError::Empty { path: source.to_string() });
        }
        Ok(Self { orders })
    }

    /// Firing order for a rosette with `total_bottles` positions.
    ///
    /// Empty when no order is configured for that count.
    pub fn firing_order_for(&self, total_bottles: u32) -> &[u32] {
        self.orders.get(&total_bottles).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first `active` positions of the firing order, reversed so they line
    /// up with targets listed shallowest first.
    pub fn bottle_order(&self, active: usize, total_bottles: u32) -> Vec<u32> {
        let order = self.firing_order_for(total_bottles);
        order[..active.min(order.len())].iter().rev().copied().collect()
    }

    /// Bottle counts with a configured order.
    pub fn bottle_counts(&self) -> Vec<u32> {
        self.orders.keys().copied().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
