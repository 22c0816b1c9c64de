//! Per-controller settings and default/override resolution.
//!
//! Each controller block owns one [`ControllerSettings`]: the enabled
//! flag, a default priority list that applies to every managed block, a
//! map of per-block override lists, and a set of ignored blocks that are
//! excluded from automation entirely. Resolution for a managed block is
//! strictly two-tier: ignored wins, then an override if one exists, then
//! the default list.
//!
//! An entity id is never in both the override map and the ignore set —
//! adding one side clears the other.
//!
//! ```
//! use oreflow_logic::settings::{ControllerSettings, Resolution};
//!
//! let mut settings = ControllerSettings::default();
//! settings.default_priority.add("Iron");
//! settings.add_override(42).priority.add("Gold");
//! settings.ignore(42); // drops the override
//! assert!(matches!(settings.resolve(42), Resolution::Ignored));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::priority::OrePriorityList;
use crate::triggers::{StockTarget, TriggerRule};

/// Block entity identifier assigned by the host engine.
pub type EntityId = u64;

/// Idle power draw of an enabled controller, in MW.
pub const BASE_POWER_MW: f32 = 0.1;

/// Additional draw per managed block carrying an override, in MW.
pub const OVERRIDE_POWER_MW: f32 = 0.05;

/// A per-block priority list superseding the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityOverride {
    pub entity_id: EntityId,
    pub priority: OrePriorityList,
}

/// Which list (if any) governs a managed block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// Block is excluded from automation entirely.
    Ignored,
    /// Block has its own priority list.
    Override(&'a OrePriorityList),
    /// Block inherits the controller default.
    Default(&'a OrePriorityList),
}

/// Everything a single controller block persists and syncs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSettings {
    pub enabled: bool,
    /// Current draw in MW, recomputed on every mutation that affects it.
    pub power_consumption: f32,
    pub default_priority: OrePriorityList,
    overrides: BTreeMap<EntityId, PriorityOverride>,
    ignored: BTreeSet<EntityId>,
    pub triggers: Vec<TriggerRule>,
    pub stock: Vec<StockTarget>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            power_consumption: BASE_POWER_MW,
            default_priority: OrePriorityList::default(),
            overrides: BTreeMap::new(),
            ignored: BTreeSet::new(),
            triggers: Vec::new(),
            stock: Vec::new(),
        }
    }
}

impl ControllerSettings {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.update_power();
    }

    /// Add (or fetch) an override list for `id`. Clears any ignore flag
    /// for `id` so the block is managed again.
    pub fn add_override(&mut self, id: EntityId) -> &mut PriorityOverride {
        self.ignored.remove(&id);
        if !self.overrides.contains_key(&id) {
            self.overrides.insert(
                id,
                PriorityOverride {
                    entity_id: id,
                    priority: OrePriorityList::default(),
                },
            );
            self.update_power();
        }
        self.overrides.entry(id).or_insert_with(|| PriorityOverride {
            entity_id: id,
            priority: OrePriorityList::default(),
        })
    }

    /// Drop the override for `id`, if any. The block falls back to the
    /// default list.
    pub fn remove_override(&mut self, id: EntityId) {
        self.overrides.remove(&id);
        self.update_power();
    }

    pub fn override_for(&self, id: EntityId) -> Option<&PriorityOverride> {
        self.overrides.get(&id)
    }

    pub fn override_for_mut(&mut self, id: EntityId) -> Option<&mut PriorityOverride> {
        self.overrides.get_mut(&id)
    }

    pub fn overrides(&self) -> impl Iterator<Item = &PriorityOverride> {
        self.overrides.values()
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Exclude `id` from automation. Clears any override for `id`.
    pub fn ignore(&mut self, id: EntityId) {
        self.overrides.remove(&id);
        self.ignored.insert(id);
        self.update_power();
    }

    /// Re-include `id`. No-op if it was not ignored.
    pub fn unignore(&mut self, id: EntityId) {
        self.ignored.remove(&id);
    }

    pub fn is_ignored(&self, id: EntityId) -> bool {
        self.ignored.contains(&id)
    }

    pub fn ignored(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ignored.iter().copied()
    }

    /// Two-tier resolution: ignore set, then override, then default.
    pub fn resolve(&self, id: EntityId) -> Resolution<'_> {
        if self.ignored.contains(&id) {
            Resolution::Ignored
        } else if let Some(ovr) = self.overrides.get(&id) {
            Resolution::Override(&ovr.priority)
        } else {
            Resolution::Default(&self.default_priority)
        }
    }

    /// The effective list for `id`, or `None` if the block is ignored.
    pub fn priority_for(&self, id: EntityId) -> Option<&OrePriorityList> {
        match self.resolve(id) {
            Resolution::Ignored => None,
            Resolution::Override(list) | Resolution::Default(list) => Some(list),
        }
    }

    fn update_power(&mut self) {
        self.power_consumption = if self.enabled {
            BASE_POWER_MW + OVERRIDE_POWER_MW * self.overrides.len() as f32
        } else {
            0.0
        };
    }
}
