//! Trait seams toward the host game engine.
//!
//! The engine owns transport, the terminal UI toolkit, and the game
//! world; this crate only ever reaches them through these traits. Tests
//! plug in plain in-memory implementations.

use oreflow_logic::settings::EntityId;
use oreflow_logic::sync::SyncRequest;

use crate::terminal::{ActionDescriptor, ControlDescriptor};

/// The host's settings-sync transport. Wire format and delivery are the
/// engine's business; both payload types here are already serialized.
pub trait SyncChannel {
    /// Client → server: replay one settings mutation.
    fn send_to_server(&mut self, block: EntityId, request: SyncRequest);

    /// Server → all clients: full bincode settings snapshot for `block`.
    fn broadcast_snapshot(&mut self, block: EntityId, snapshot: Vec<u8>);
}

/// The host's terminal-control registry. Descriptors are handed over
/// once per controller kind; the engine turns them into real widgets.
pub trait ControlRegistry {
    fn add_control(&mut self, control: ControlDescriptor);
    fn add_action(&mut self, action: ActionDescriptor);
}

/// A block on the same grid that a controller could manage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedBlock {
    pub entity_id: EntityId,
    pub display_name: String,
}

/// Read-only view of the game world: which manageable blocks share a
/// grid with a given controller.
pub trait GridIndex {
    fn managed_blocks(&self, controller: EntityId) -> Vec<ManagedBlock>;
}
