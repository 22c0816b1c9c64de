//! Settings-sync protocol.
//!
//! UI actions on the owning client mutate local settings and emit a
//! [`SyncRequest`] — `(category, op, value, context)` — for the server to
//! replay. The wire stays stringly because the host engine owns transport
//! and framing; this module owns what the strings mean. Applying the same
//! request stream to two replicas must leave them equal, which is why
//! [`apply`] is total: malformed values and unknown categories are
//! rejected up front, and recognized requests reduce to the idempotent
//! list/settings operations.
//!
//! Trigger rules and other structured state do not ride this protocol;
//! they travel in full snapshots (see `oreflow-host::registry`).

use serde::{Deserialize, Serialize};

use crate::priority::OrePriorityList;
use crate::settings::{ControllerSettings, EntityId};
use crate::triggers::StockTarget;

/// Mutation verb. Wire strings are uppercase (`"SET"`, `"ADD"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncOp {
    Set,
    Add,
    Del,
    Up,
    Down,
}

impl SyncOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOp::Set => "SET",
            SyncOp::Add => "ADD",
            SyncOp::Del => "DEL",
            SyncOp::Up => "UP",
            SyncOp::Down => "DOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SET" => Some(SyncOp::Set),
            "ADD" => Some(SyncOp::Add),
            "DEL" => Some(SyncOp::Del),
            "UP" => Some(SyncOp::Up),
            "DOWN" => Some(SyncOp::Down),
            _ => None,
        }
    }
}

/// Request categories. Each names one addressable piece of
/// [`ControllerSettings`].
pub mod categories {
    /// `SET true|false` — the controller enabled flag.
    pub const ENABLED: &str = "Enabled";
    /// `ADD/DEL/UP/DOWN key` — the default priority list.
    pub const DEFAULT_PRIORITY: &str = "DefaultPriority";
    /// `ADD/DEL entity-id` — the per-block override map.
    pub const OVERRIDES: &str = "Overrides";
    /// `ADD/DEL entity-id` — the ignore set.
    pub const IGNORED: &str = "Ignored";
    /// `ADD/DEL/UP/DOWN key`, context = entity id — one override's list.
    pub const OVERRIDE_PRIORITY: &str = "OverridePriority";
    /// `SET item:amount` / `DEL item` — stock targets.
    pub const STOCK: &str = "Stock";
}

/// One settings mutation as it crosses the client/server boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub category: String,
    pub op: SyncOp,
    pub value: String,
    /// Secondary key, e.g. the entity id owning an override list.
    pub context: Option<String>,
}

impl SyncRequest {
    fn new(category: &str, op: SyncOp, value: String, context: Option<String>) -> Self {
        Self {
            category: category.to_string(),
            op,
            value,
            context,
        }
    }
}

/// Apply `req` to `settings`. Returns `true` when the request was
/// recognized and well-formed — including when it reduced to an
/// idempotent no-op — and `false` for unknown categories, invalid ops,
/// or unparseable values. Never panics, never partially applies.
pub fn apply(settings: &mut ControllerSettings, req: &SyncRequest) -> bool {
    match req.category.as_str() {
        categories::ENABLED => match (req.op, parse_bool(&req.value)) {
            (SyncOp::Set, Some(enabled)) => {
                settings.set_enabled(enabled);
                true
            }
            _ => false,
        },
        categories::DEFAULT_PRIORITY => apply_list_op(&mut settings.default_priority, req.op, &req.value),
        categories::OVERRIDES => match (req.op, parse_entity(&req.value)) {
            (SyncOp::Add, Some(id)) => {
                settings.add_override(id);
                true
            }
            (SyncOp::Del, Some(id)) => {
                settings.remove_override(id);
                true
            }
            _ => false,
        },
        categories::IGNORED => match (req.op, parse_entity(&req.value)) {
            (SyncOp::Add, Some(id)) => {
                settings.ignore(id);
                true
            }
            (SyncOp::Del, Some(id)) => {
                settings.unignore(id);
                true
            }
            _ => false,
        },
        categories::OVERRIDE_PRIORITY => {
            let id = match req.context.as_deref().and_then(parse_entity) {
                Some(id) => id,
                None => return false,
            };
            match settings.override_for_mut(id) {
                // No override for this block: recognized, nothing to do.
                None => true,
                Some(ovr) => apply_list_op(&mut ovr.priority, req.op, &req.value),
            }
        }
        categories::STOCK => match req.op {
            SyncOp::Set => match parse_stock(&req.value) {
                Some(target) => {
                    match settings.stock.iter_mut().find(|t| t.item == target.item) {
                        Some(existing) => existing.amount = target.amount,
                        None => settings.stock.push(target),
                    }
                    true
                }
                None => false,
            },
            SyncOp::Del => {
                settings.stock.retain(|t| t.item != req.value);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

fn apply_list_op(list: &mut OrePriorityList, op: SyncOp, key: &str) -> bool {
    match op {
        SyncOp::Add => list.add(key),
        SyncOp::Del => list.remove(key),
        SyncOp::Up => list.move_up(key),
        SyncOp::Down => list.move_down(key),
        SyncOp::Set => return false,
    }
    true
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_entity(value: &str) -> Option<EntityId> {
    value.parse().ok()
}

fn parse_stock(value: &str) -> Option<StockTarget> {
    let (item, amount) = value.split_once(':')?;
    if item.is_empty() {
        return None;
    }
    let amount: f64 = amount.parse().ok()?;
    (amount >= 0.0).then(|| StockTarget {
        item: item.to_string(),
        amount,
    })
}

/// Builders pairing each UI action with the request it sends, so local
/// mutation and the wire request cannot drift apart.
pub mod requests {
    use super::*;

    pub fn set_enabled(enabled: bool) -> SyncRequest {
        SyncRequest::new(categories::ENABLED, SyncOp::Set, enabled.to_string(), None)
    }

    pub fn default_priority(op: SyncOp, key: &str) -> SyncRequest {
        SyncRequest::new(categories::DEFAULT_PRIORITY, op, key.to_string(), None)
    }

    pub fn add_override(id: EntityId) -> SyncRequest {
        SyncRequest::new(categories::OVERRIDES, SyncOp::Add, id.to_string(), None)
    }

    pub fn remove_override(id: EntityId) -> SyncRequest {
        SyncRequest::new(categories::OVERRIDES, SyncOp::Del, id.to_string(), None)
    }

    pub fn ignore(id: EntityId) -> SyncRequest {
        SyncRequest::new(categories::IGNORED, SyncOp::Add, id.to_string(), None)
    }

    pub fn unignore(id: EntityId) -> SyncRequest {
        SyncRequest::new(categories::IGNORED, SyncOp::Del, id.to_string(), None)
    }

    pub fn override_priority(id: EntityId, op: SyncOp, key: &str) -> SyncRequest {
        SyncRequest::new(
            categories::OVERRIDE_PRIORITY,
            op,
            key.to_string(),
            Some(id.to_string()),
        )
    }

    pub fn set_stock(item: &str, amount: f64) -> SyncRequest {
        SyncRequest::new(
            categories::STOCK,
            SyncOp::Set,
            format!("{}:{}", item, amount),
            None,
        )
    }

    pub fn remove_stock(item: &str) -> SyncRequest {
        SyncRequest::new(categories::STOCK, SyncOp::Del, item.to_string(), None)
    }
}
