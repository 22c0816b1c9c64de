//! Item identifiers and the refining catalog.
//!
//! Priority-list keys are not free-form: a key is only offered to the
//! player if the ore actually has a refining path on the grid's machines.
//! The catalog holds the game's item, blueprint, and refinery definitions
//! and derives the set of orderable ores from them. An ore qualifies when
//! some blueprint consumes exactly that ore (and nothing else), produces
//! at least one ingot, and is accepted by at least one known refinery's
//! blueprint classes.

use serde::{Deserialize, Serialize};

/// Broad item category, mirroring the game's object-builder types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Ore,
    Ingot,
    Component,
}

/// Fully-qualified item identifier: category plus subtype name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId {
    pub kind: ItemKind,
    pub subtype: String,
}

impl ItemId {
    pub fn ore(subtype: &str) -> Self {
        Self {
            kind: ItemKind::Ore,
            subtype: subtype.to_string(),
        }
    }

    pub fn ingot(subtype: &str) -> Self {
        Self {
            kind: ItemKind::Ingot,
            subtype: subtype.to_string(),
        }
    }

    pub fn component(subtype: &str) -> Self {
        Self {
            kind: ItemKind::Component,
            subtype: subtype.to_string(),
        }
    }

    /// Canonical `Kind/Subtype` form, e.g. `Ore/Iron`.
    pub fn display(&self) -> String {
        let kind = match self.kind {
            ItemKind::Ore => "Ore",
            ItemKind::Ingot => "Ingot",
            ItemKind::Component => "Component",
        };
        format!("{}/{}", kind, self.subtype)
    }
}

/// An item with an amount, as it appears in blueprint recipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub amount: f64,
}

/// A refining/assembly recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    /// Blueprint class, matched against refinery class lists.
    pub class: String,
    pub prerequisites: Vec<ItemStack>,
    pub results: Vec<ItemStack>,
}

/// A refinery block type and the blueprint classes it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineryDef {
    pub subtype: String,
    pub display_name: String,
    pub classes: Vec<String>,
}

/// Display metadata for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub display_name: String,
}

/// The full definition set the controllers work against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<ItemDef>,
    pub blueprints: Vec<Blueprint>,
    pub refineries: Vec<RefineryDef>,
}

impl ItemCatalog {
    /// Human-readable name for `id`, falling back to the subtype.
    pub fn display_name<'a>(&'a self, id: &'a ItemId) -> &'a str {
        self.items
            .iter()
            .find(|def| def.id == *id)
            .map(|def| def.display_name.as_str())
            .unwrap_or(&id.subtype)
    }

    /// Whether some known refinery accepts blueprints of `class`.
    fn class_accepted(&self, class: &str) -> bool {
        self.refineries
            .iter()
            .any(|r| r.classes.iter().any(|c| c == class))
    }

    /// Whether `ore` can be turned into an ingot by a known refinery:
    /// a blueprint exists with `ore` as its single prerequisite, at least
    /// one ingot result, and a class some refinery accepts.
    pub fn has_refining_path(&self, ore: &ItemId) -> bool {
        self.blueprints.iter().any(|bp| {
            bp.prerequisites.len() == 1
                && bp.prerequisites[0].item == *ore
                && bp.results.iter().any(|r| r.item.kind == ItemKind::Ingot)
                && self.class_accepted(&bp.class)
        })
    }

    /// All ores with a refining path, sorted by display name. This is the
    /// legal key set for ore priority lists.
    pub fn refinable_ores(&self) -> Vec<ItemId> {
        let mut ores: Vec<ItemId> = self
            .items
            .iter()
            .filter(|def| def.id.kind == ItemKind::Ore && self.has_refining_path(&def.id))
            .map(|def| def.id.clone())
            .collect();
        ores.sort_by(|a, b| self.display_name(a).cmp(self.display_name(b)));
        ores
    }
}
