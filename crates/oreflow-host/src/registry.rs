//! Controller lifecycle and settings-sync dispatch.
//!
//! One [`ControllerRegistry`] lives on the server and one on every
//! client, each keyed by controller-block entity id. Controllers are
//! created on block placement or world load and removed with the block.
//!
//! Mutations flow one way: the owning client applies a [`SyncRequest`]
//! locally and forwards it ([`ControllerRegistry::send`]); the server
//! replays it ([`ControllerRegistry::handle_request`]) and answers with a
//! full bincode snapshot that every client installs
//! ([`ControllerRegistry::apply_snapshot`]). The snapshot path doubles as
//! desync recovery: a client can ask for one at any time with
//! [`ControllerRegistry::request_settings`].

use std::collections::BTreeMap;

use oreflow_logic::settings::{ControllerSettings, EntityId};
use oreflow_logic::sync::{self, SyncOp, SyncRequest};

use crate::bridge::SyncChannel;

/// Out-of-band category asking the server to re-send a full snapshot.
/// Not a settings mutation; intercepted before [`sync::apply`].
pub const REQUEST_SETTINGS: &str = "RequestSettings";

/// Which flavor of logic block a controller is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ControllerKind {
    Refinery,
    Assembler,
}

impl ControllerKind {
    /// Block subtype the controller piggybacks on; used to decide which
    /// terminal blocks get the custom controls.
    pub fn block_subtype(&self) -> &'static str {
        match self {
            ControllerKind::Refinery => "OreflowRefineryController",
            ControllerKind::Assembler => "OreflowAssemblerController",
        }
    }
}

/// Transient per-controller UI selection state. Never synced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Index into the orderable-item combobox.
    pub catalog_index: usize,
    /// Key highlighted in the default priority listbox.
    pub selected_default_key: Option<String>,
    /// Managed block highlighted in the grid listbox.
    pub selected_block: Option<EntityId>,
    /// Key highlighted in the selected block's override listbox.
    pub selected_override_key: Option<String>,
}

/// A live controller block: its synced settings plus local view state.
#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    pub kind: ControllerKind,
    pub settings: ControllerSettings,
    pub view: ViewState,
}

/// All controllers known to this side of the connection.
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    controllers: BTreeMap<EntityId, Controller>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller block. Idempotent: re-creating an existing
    /// id (world reload) keeps its settings.
    pub fn create(&mut self, id: EntityId, kind: ControllerKind) {
        if self.controllers.contains_key(&id) {
            return;
        }
        log::info!("controller {} created ({:?})", id, kind);
        self.controllers.insert(
            id,
            Controller {
                kind,
                settings: ControllerSettings::default(),
                view: ViewState::default(),
            },
        );
    }

    /// Drop a controller when its block is removed.
    pub fn remove(&mut self, id: EntityId) {
        if self.controllers.remove(&id).is_some() {
            log::info!("controller {} removed", id);
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Controller> {
        self.controllers.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Controller> {
        self.controllers.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.controllers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.controllers.keys().copied()
    }

    /// Client side: apply a mutation locally, then forward it so the
    /// server replays the identical request.
    pub fn send(
        &mut self,
        block: EntityId,
        request: SyncRequest,
        channel: &mut dyn SyncChannel,
    ) -> bool {
        let Some(controller) = self.controllers.get_mut(&block) else {
            log::warn!("send for unknown controller {}", block);
            return false;
        };
        if !sync::apply(&mut controller.settings, &request) {
            log::warn!(
                "rejected local request for {}: {} {}",
                block,
                request.category,
                request.op.as_str()
            );
            return false;
        }
        channel.send_to_server(block, request);
        true
    }

    /// Client side: ask the server for a fresh snapshot of `block`.
    pub fn request_settings(&self, block: EntityId, channel: &mut dyn SyncChannel) {
        channel.send_to_server(
            block,
            SyncRequest {
                category: REQUEST_SETTINGS.to_string(),
                op: SyncOp::Set,
                value: String::new(),
                context: None,
            },
        );
    }

    /// Server side: replay a client request and broadcast the resulting
    /// snapshot. Unknown controllers and unrecognized requests are
    /// logged and dropped.
    pub fn handle_request(
        &mut self,
        block: EntityId,
        request: &SyncRequest,
        channel: &mut dyn SyncChannel,
    ) -> bool {
        let Some(controller) = self.controllers.get_mut(&block) else {
            log::warn!("request for unknown controller {}", block);
            return false;
        };
        if request.category == REQUEST_SETTINGS {
            Self::broadcast(block, &controller.settings, channel);
            return true;
        }
        if !sync::apply(&mut controller.settings, request) {
            log::warn!(
                "unrecognized request for {}: {} {} {:?}",
                block,
                request.category,
                request.op.as_str(),
                request.value
            );
            return false;
        }
        Self::broadcast(block, &controller.settings, channel);
        true
    }

    /// Client side: install a snapshot received from the server. Decode
    /// failures are logged and the current settings kept.
    pub fn apply_snapshot(&mut self, block: EntityId, snapshot: &[u8]) -> bool {
        let Some(controller) = self.controllers.get_mut(&block) else {
            log::warn!("snapshot for unknown controller {}", block);
            return false;
        };
        match bincode::deserialize::<ControllerSettings>(snapshot) {
            Ok(settings) => {
                controller.settings = settings;
                true
            }
            Err(err) => {
                log::warn!("discarding bad snapshot for {}: {}", block, err);
                false
            }
        }
    }

    fn broadcast(block: EntityId, settings: &ControllerSettings, channel: &mut dyn SyncChannel) {
        match bincode::serialize(settings) {
            Ok(bytes) => channel.broadcast_snapshot(block, bytes),
            Err(err) => log::error!("failed to encode snapshot for {}: {}", block, err),
        }
    }
}
