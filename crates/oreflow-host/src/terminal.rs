//! Terminal-control descriptors and their one-time registration.
//!
//! The host engine owns the actual widget toolkit; what it accepts from
//! us is a flat list of typed descriptors whose behavior lives in
//! closures. Each closure receives a [`TerminalContext`] — the controller
//! registry, the sync channel, and the grid view — at invocation time, so
//! descriptors themselves hold no shared state.
//!
//! Registration happens once per controller kind, guarded by a mutex
//! around a flag: the terminal can be opened from several places during
//! world load and only the first call may register. Failures inside
//! registration are logged and swallowed; a broken terminal must never
//! take the session down with it.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use oreflow_logic::items::ItemCatalog;
use oreflow_logic::priority::OrePriorityList;
use oreflow_logic::settings::{ControllerSettings, EntityId};
use oreflow_logic::sync::{requests, SyncOp, SyncRequest};

use crate::bridge::{ControlRegistry, GridIndex, SyncChannel};
use crate::registry::{ControllerKind, ControllerRegistry, ViewState};

/// Everything a control closure may touch, threaded in by the host at
/// invocation time.
pub struct TerminalContext<'a> {
    pub controllers: &'a mut ControllerRegistry,
    pub channel: &'a mut dyn SyncChannel,
    pub grid: &'a dyn GridIndex,
}

impl<'a> TerminalContext<'a> {
    /// Apply a mutation locally and forward it to the server.
    pub fn send(&mut self, block: EntityId, request: SyncRequest) -> bool {
        self.controllers.send(block, request, &mut *self.channel)
    }

    pub fn request_settings(&mut self, block: EntityId) {
        self.controllers.request_settings(block, &mut *self.channel);
    }

    pub fn settings(&self, block: EntityId) -> Option<&ControllerSettings> {
        self.controllers.get(block).map(|c| &c.settings)
    }

    pub fn view(&self, block: EntityId) -> Option<&ViewState> {
        self.controllers.get(block).map(|c| &c.view)
    }

    pub fn view_mut(&mut self, block: EntityId) -> Option<&mut ViewState> {
        self.controllers.get_mut(block).map(|c| &mut c.view)
    }
}

pub type Predicate = Box<dyn Fn(&TerminalContext, EntityId) -> bool>;

pub struct Label {
    pub id: String,
    pub text: String,
}

pub struct Separator {
    pub id: String,
}

pub struct Checkbox {
    pub id: String,
    pub title: String,
    pub tooltip: Option<String>,
    pub enabled: Predicate,
    pub getter: Box<dyn Fn(&TerminalContext, EntityId) -> bool>,
    pub setter: Box<dyn Fn(&mut TerminalContext, EntityId, bool)>,
    pub supports_multiple: bool,
}

pub struct Button {
    pub id: String,
    pub title: String,
    pub tooltip: Option<String>,
    pub enabled: Predicate,
    pub action: Box<dyn Fn(&mut TerminalContext, EntityId)>,
}

pub struct Combobox {
    pub id: String,
    pub title: String,
    pub tooltip: Option<String>,
    pub enabled: Predicate,
    pub options: Vec<String>,
    pub getter: Box<dyn Fn(&TerminalContext, EntityId) -> usize>,
    pub setter: Box<dyn Fn(&mut TerminalContext, EntityId, usize)>,
}

/// One listbox row: a stable key, what to display, and whether the row
/// is currently highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

pub struct Listbox {
    pub id: String,
    pub title: String,
    pub tooltip: Option<String>,
    pub enabled: Predicate,
    pub rows: Box<dyn Fn(&TerminalContext, EntityId) -> Vec<ListRow>>,
    pub on_select: Box<dyn Fn(&mut TerminalContext, EntityId, &str)>,
    pub visible_rows: usize,
}

/// A typed widget descriptor handed to the host's control registry.
pub enum ControlDescriptor {
    Label(Label),
    Separator(Separator),
    Checkbox(Checkbox),
    Button(Button),
    Combobox(Combobox),
    Listbox(Listbox),
}

impl ControlDescriptor {
    pub fn id(&self) -> &str {
        match self {
            ControlDescriptor::Label(c) => &c.id,
            ControlDescriptor::Separator(c) => &c.id,
            ControlDescriptor::Checkbox(c) => &c.id,
            ControlDescriptor::Button(c) => &c.id,
            ControlDescriptor::Combobox(c) => &c.id,
            ControlDescriptor::Listbox(c) => &c.id,
        }
    }
}

/// A named, hotbar-assignable command derived from a control.
pub struct ActionDescriptor {
    pub id: String,
    pub name: String,
    pub invoke: Box<dyn Fn(&mut TerminalContext, EntityId)>,
}

/// Registration can fail before any descriptor is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// The catalog yields no orderable items; a priority terminal with
    /// zero legal keys would be unusable.
    NoOrderableItems,
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::NoOrderableItems => {
                write!(f, "item catalog yields no orderable items")
            }
        }
    }
}

impl std::error::Error for RegisterError {}

/// Builds and registers the control set for one controller kind.
pub struct TerminalController {
    kind: ControllerKind,
    is_server: bool,
    /// Priority-list keys the player may add, catalog order.
    keys: Vec<String>,
    /// Display labels parallel to `keys`.
    labels: Vec<String>,
    init: Mutex<bool>,
}

impl TerminalController {
    pub fn new(kind: ControllerKind, catalog: &ItemCatalog, is_server: bool) -> Self {
        let ores = catalog.refinable_ores();
        let labels = ores
            .iter()
            .map(|id| catalog.display_name(id).to_string())
            .collect();
        let keys = ores.into_iter().map(|id| id.subtype).collect();
        Self {
            kind,
            is_server,
            keys,
            labels,
            init: Mutex::new(false),
        }
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    /// Whether a terminal block should show this controller's controls.
    pub fn can_add_controls(&self, block_subtype: &str) -> bool {
        block_subtype == self.kind.block_subtype()
    }

    /// Register the control set exactly once. Safe to call from every
    /// terminal-open path; later calls return immediately. Errors are
    /// logged, never propagated.
    pub fn initialize_controls(&self, registry: &mut dyn ControlRegistry) {
        let mut done = self
            .init
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *done {
            return;
        }
        *done = true;
        if let Err(err) = self.register_controls(registry) {
            log::error!(
                "control registration failed for {:?}: {}",
                self.kind,
                err
            );
        }
    }

    fn register_controls(&self, registry: &mut dyn ControlRegistry) -> Result<(), RegisterError> {
        if self.keys.is_empty() {
            return Err(RegisterError::NoOrderableItems);
        }

        if !self.is_server {
            registry.add_control(label("ClientConfig", "Client Configuration"));
            registry.add_control(ControlDescriptor::Button(Button {
                id: "RequestSettings".to_string(),
                title: "Request Settings".to_string(),
                tooltip: Some(
                    "Resync this controller from the server if the terminal \
                     looks stale."
                        .to_string(),
                ),
                enabled: Box::new(known),
                action: Box::new(|ctx, block| ctx.request_settings(block)),
            }));
        }

        registry.add_control(label("ControllerConfig", "Controller"));
        self.register_enabled_switch(registry);

        registry.add_control(label("DefaultPriorityLabel", "Default Ore Priority"));
        self.register_default_priority(registry);

        registry.add_control(ControlDescriptor::Separator(Separator {
            id: "OverrideSeparator".to_string(),
        }));
        registry.add_control(label("OverrideLabel", "Per-Block Ore Priority"));
        self.register_override_section(registry);

        log::info!("registered terminal controls for {:?}", self.kind);
        Ok(())
    }

    fn register_enabled_switch(&self, registry: &mut dyn ControlRegistry) {
        registry.add_control(ControlDescriptor::Checkbox(Checkbox {
            id: "Enabled".to_string(),
            title: "Enabled".to_string(),
            tooltip: Some("Whether this controller manages its blocks.".to_string()),
            enabled: Box::new(known),
            getter: Box::new(|ctx, block| {
                ctx.settings(block).map(|s| s.enabled).unwrap_or(false)
            }),
            setter: Box::new(|ctx, block, value| {
                ctx.send(block, requests::set_enabled(value));
            }),
            supports_multiple: true,
        }));

        registry.add_action(ActionDescriptor {
            id: "Enabled_On".to_string(),
            name: "Controller On".to_string(),
            invoke: Box::new(|ctx, block| {
                ctx.send(block, requests::set_enabled(true));
            }),
        });
        registry.add_action(ActionDescriptor {
            id: "Enabled_Off".to_string(),
            name: "Controller Off".to_string(),
            invoke: Box::new(|ctx, block| {
                ctx.send(block, requests::set_enabled(false));
            }),
        });
        registry.add_action(ActionDescriptor {
            id: "Enabled_Toggle".to_string(),
            name: "Controller On/Off".to_string(),
            invoke: Box::new(|ctx, block| {
                let current = ctx.settings(block).map(|s| s.enabled).unwrap_or(false);
                ctx.send(block, requests::set_enabled(!current));
            }),
        });
    }

    fn register_default_priority(&self, registry: &mut dyn ControlRegistry) {
        registry.add_control(self.item_combobox("DefaultItemFilter"));

        let keys = self.keys.clone();
        registry.add_control(ControlDescriptor::Button(Button {
            id: "AddDefaultPriority".to_string(),
            title: "Add Selected Ore".to_string(),
            tooltip: None,
            enabled: Box::new(controller_enabled),
            action: Box::new(move |ctx, block| {
                let Some(key) = selected_catalog_key(ctx, block, &keys) else {
                    return;
                };
                let already = ctx
                    .settings(block)
                    .map(|s| s.default_priority.contains(&key))
                    .unwrap_or(true);
                if !already {
                    ctx.send(block, requests::default_priority(SyncOp::Add, &key));
                }
            }),
        }));

        registry.add_control(ControlDescriptor::Listbox(Listbox {
            id: "DefaultPriority".to_string(),
            title: "Ore Priority".to_string(),
            tooltip: Some("Refining order for every block without an override.".to_string()),
            enabled: Box::new(controller_enabled),
            rows: Box::new(|ctx, block| {
                let Some(settings) = ctx.settings(block) else {
                    return Vec::new();
                };
                let selected = ctx.view(block).and_then(|v| v.selected_default_key.clone());
                priority_rows(&settings.default_priority, selected.as_deref())
            }),
            on_select: Box::new(|ctx, block, key| {
                if let Some(view) = ctx.view_mut(block) {
                    view.selected_default_key = Some(key.to_string());
                }
            }),
            visible_rows: 5,
        }));

        for (id, title, op) in [
            ("MoveUpDefaultPriority", "Move Up Selected Ore", SyncOp::Up),
            ("MoveDownDefaultPriority", "Move Down Selected Ore", SyncOp::Down),
            ("RemoveDefaultPriority", "Remove Selected Ore", SyncOp::Del),
        ] {
            registry.add_control(ControlDescriptor::Button(Button {
                id: id.to_string(),
                title: title.to_string(),
                tooltip: None,
                enabled: Box::new(default_key_selected),
                action: Box::new(move |ctx, block| {
                    let Some(key) = ctx
                        .view(block)
                        .and_then(|v| v.selected_default_key.clone())
                    else {
                        return;
                    };
                    let present = ctx
                        .settings(block)
                        .map(|s| s.default_priority.contains(&key))
                        .unwrap_or(false);
                    if present {
                        ctx.send(block, requests::default_priority(op, &key));
                    }
                }),
            }));
        }
    }

    fn register_override_section(&self, registry: &mut dyn ControlRegistry) {
        registry.add_control(ControlDescriptor::Listbox(Listbox {
            id: "GridBlocks".to_string(),
            title: "Managed Blocks".to_string(),
            tooltip: Some("Blocks on this grid the controller can manage.".to_string()),
            enabled: Box::new(controller_enabled),
            rows: Box::new(|ctx, block| {
                let Some(settings) = ctx.settings(block) else {
                    return Vec::new();
                };
                let selected = ctx.view(block).and_then(|v| v.selected_block);
                ctx.grid
                    .managed_blocks(block)
                    .into_iter()
                    .map(|managed| {
                        let marker = if settings.override_for(managed.entity_id).is_some() {
                            "X"
                        } else if settings.is_ignored(managed.entity_id) {
                            "-"
                        } else {
                            " "
                        };
                        ListRow {
                            key: managed.entity_id.to_string(),
                            label: format!("[{}] {}", marker, managed.display_name),
                            selected: selected == Some(managed.entity_id),
                        }
                    })
                    .collect()
            }),
            on_select: Box::new(|ctx, block, key| {
                let id = key.parse().ok();
                if let (Some(view), Some(id)) = (ctx.view_mut(block), id) {
                    view.selected_block = Some(id);
                    view.selected_override_key = None;
                }
            }),
            visible_rows: 5,
        }));

        registry.add_control(ControlDescriptor::Checkbox(Checkbox {
            id: "CustomPriority".to_string(),
            title: "Custom priority".to_string(),
            tooltip: Some(
                "Give the selected block its own ore priority instead of \
                 the default list."
                    .to_string(),
            ),
            enabled: Box::new(block_selected),
            getter: Box::new(|ctx, block| {
                selected_block(ctx, block)
                    .and_then(|id| ctx.settings(block).map(|s| s.override_for(id).is_some()))
                    .unwrap_or(false)
            }),
            setter: Box::new(|ctx, block, value| {
                let Some(id) = selected_block(ctx, block) else {
                    return;
                };
                let has = ctx
                    .settings(block)
                    .map(|s| s.override_for(id).is_some())
                    .unwrap_or(false);
                if value && !has {
                    ctx.send(block, requests::add_override(id));
                } else if !value && has {
                    ctx.send(block, requests::remove_override(id));
                }
            }),
            supports_multiple: false,
        }));

        registry.add_control(ControlDescriptor::Checkbox(Checkbox {
            id: "IgnoreBlock".to_string(),
            title: "Ignore block".to_string(),
            tooltip: Some("Exclude the selected block from automation entirely.".to_string()),
            enabled: Box::new(block_selected),
            getter: Box::new(|ctx, block| {
                selected_block(ctx, block)
                    .and_then(|id| ctx.settings(block).map(|s| s.is_ignored(id)))
                    .unwrap_or(false)
            }),
            setter: Box::new(|ctx, block, value| {
                let Some(id) = selected_block(ctx, block) else {
                    return;
                };
                let ignored = ctx
                    .settings(block)
                    .map(|s| s.is_ignored(id))
                    .unwrap_or(false);
                if value && !ignored {
                    ctx.send(block, requests::ignore(id));
                } else if !value && ignored {
                    ctx.send(block, requests::unignore(id));
                }
            }),
            supports_multiple: false,
        }));

        registry.add_control(label("OverridePriorityLabel", "Selected Block Priority"));

        let keys = self.keys.clone();
        registry.add_control(ControlDescriptor::Button(Button {
            id: "AddOverridePriority".to_string(),
            title: "Add Selected Ore".to_string(),
            tooltip: None,
            enabled: Box::new(block_has_override),
            action: Box::new(move |ctx, block| {
                let (Some(id), Some(key)) = (
                    selected_block(ctx, block),
                    selected_catalog_key(ctx, block, &keys),
                ) else {
                    return;
                };
                let already = ctx
                    .settings(block)
                    .and_then(|s| s.override_for(id))
                    .map(|o| o.priority.contains(&key))
                    .unwrap_or(true);
                if !already {
                    ctx.send(block, requests::override_priority(id, SyncOp::Add, &key));
                }
            }),
        }));

        registry.add_control(ControlDescriptor::Listbox(Listbox {
            id: "OverridePriority".to_string(),
            title: "Block Ore Priority".to_string(),
            tooltip: Some("Refining order for the selected block only.".to_string()),
            enabled: Box::new(block_has_override),
            rows: Box::new(|ctx, block| {
                let Some(list) = selected_block(ctx, block)
                    .and_then(|id| ctx.settings(block).and_then(|s| s.override_for(id)))
                    .map(|o| &o.priority)
                else {
                    return Vec::new();
                };
                let selected = ctx
                    .view(block)
                    .and_then(|v| v.selected_override_key.clone());
                priority_rows(list, selected.as_deref())
            }),
            on_select: Box::new(|ctx, block, key| {
                if let Some(view) = ctx.view_mut(block) {
                    view.selected_override_key = Some(key.to_string());
                }
            }),
            visible_rows: 5,
        }));

        for (id, title, op) in [
            ("MoveUpOverridePriority", "Move Up Selected Ore", SyncOp::Up),
            ("MoveDownOverridePriority", "Move Down Selected Ore", SyncOp::Down),
            ("RemoveOverridePriority", "Remove Selected Ore", SyncOp::Del),
        ] {
            registry.add_control(ControlDescriptor::Button(Button {
                id: id.to_string(),
                title: title.to_string(),
                tooltip: None,
                enabled: Box::new(override_key_selected),
                action: Box::new(move |ctx, block| {
                    let (Some(target), Some(key)) = (
                        selected_block(ctx, block),
                        ctx.view(block)
                            .and_then(|v| v.selected_override_key.clone()),
                    ) else {
                        return;
                    };
                    let present = ctx
                        .settings(block)
                        .and_then(|s| s.override_for(target))
                        .map(|o| o.priority.contains(&key))
                        .unwrap_or(false);
                    if present {
                        ctx.send(block, requests::override_priority(target, op, &key));
                    }
                }),
            }));
        }
    }

    fn item_combobox(&self, id: &str) -> ControlDescriptor {
        let option_count = self.keys.len();
        ControlDescriptor::Combobox(Combobox {
            id: id.to_string(),
            title: "Filter Ore".to_string(),
            tooltip: Some("Ore to add to a priority list.".to_string()),
            enabled: Box::new(controller_enabled),
            options: self.labels.clone(),
            getter: Box::new(move |ctx, block| {
                ctx.view(block)
                    .map(|v| v.catalog_index.min(option_count.saturating_sub(1)))
                    .unwrap_or(0)
            }),
            setter: Box::new(move |ctx, block, index| {
                if index < option_count {
                    if let Some(view) = ctx.view_mut(block) {
                        view.catalog_index = index;
                    }
                }
            }),
        })
    }
}

fn label(id: &str, text: &str) -> ControlDescriptor {
    ControlDescriptor::Label(Label {
        id: id.to_string(),
        text: text.to_string(),
    })
}

fn priority_rows(list: &OrePriorityList, selected: Option<&str>) -> Vec<ListRow> {
    list.items()
        .iter()
        .map(|key| ListRow {
            key: key.clone(),
            label: key.clone(),
            selected: selected == Some(key.as_str()),
        })
        .collect()
}

fn known(ctx: &TerminalContext, block: EntityId) -> bool {
    ctx.controllers.contains(block)
}

fn controller_enabled(ctx: &TerminalContext, block: EntityId) -> bool {
    ctx.settings(block).map(|s| s.enabled).unwrap_or(false)
}

fn default_key_selected(ctx: &TerminalContext, block: EntityId) -> bool {
    controller_enabled(ctx, block)
        && match (ctx.settings(block), ctx.view(block)) {
            (Some(settings), Some(view)) => view
                .selected_default_key
                .as_deref()
                .map(|key| settings.default_priority.contains(key))
                .unwrap_or(false),
            _ => false,
        }
}

fn selected_block(ctx: &TerminalContext, block: EntityId) -> Option<EntityId> {
    ctx.view(block).and_then(|v| v.selected_block)
}

fn block_selected(ctx: &TerminalContext, block: EntityId) -> bool {
    controller_enabled(ctx, block) && selected_block(ctx, block).is_some()
}

fn block_has_override(ctx: &TerminalContext, block: EntityId) -> bool {
    controller_enabled(ctx, block)
        && selected_block(ctx, block)
            .and_then(|id| ctx.settings(block).map(|s| s.override_for(id).is_some()))
            .unwrap_or(false)
}

fn override_key_selected(ctx: &TerminalContext, block: EntityId) -> bool {
    block_has_override(ctx, block)
        && match (selected_block(ctx, block), ctx.view(block)) {
            (Some(id), Some(view)) => view
                .selected_override_key
                .as_deref()
                .and_then(|key| {
                    ctx.settings(block)
                        .and_then(|s| s.override_for(id))
                        .map(|o| o.priority.contains(key))
                })
                .unwrap_or(false),
            _ => false,
        }
}

fn selected_catalog_key(ctx: &TerminalContext, block: EntityId, keys: &[String]) -> Option<String> {
    let index = ctx.view(block).map(|v| v.catalog_index)?;
    keys.get(index).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ManagedBlock;
    use oreflow_logic::items::{Blueprint, ItemCatalog, ItemDef, ItemId, ItemStack, RefineryDef};

    const BLOCK: EntityId = 1;
    const REFINERY_A: EntityId = 100;
    const REFINERY_B: EntityId = 101;

    #[derive(Default)]
    struct MockRegistry {
        controls: Vec<ControlDescriptor>,
        actions: Vec<ActionDescriptor>,
    }

    impl ControlRegistry for MockRegistry {
        fn add_control(&mut self, control: ControlDescriptor) {
            self.controls.push(control);
        }

        fn add_action(&mut self, action: ActionDescriptor) {
            self.actions.push(action);
        }
    }

    impl MockRegistry {
        fn checkbox(&self, id: &str) -> &Checkbox {
            self.controls
                .iter()
                .find_map(|c| match c {
                    ControlDescriptor::Checkbox(cb) if cb.id == id => Some(cb),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("no checkbox {}", id))
        }

        fn button(&self, id: &str) -> &Button {
            self.controls
                .iter()
                .find_map(|c| match c {
                    ControlDescriptor::Button(b) if b.id == id => Some(b),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("no button {}", id))
        }

        fn listbox(&self, id: &str) -> &Listbox {
            self.controls
                .iter()
                .find_map(|c| match c {
                    ControlDescriptor::Listbox(lb) if lb.id == id => Some(lb),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("no listbox {}", id))
        }

        fn combobox(&self, id: &str) -> &Combobox {
            self.controls
                .iter()
                .find_map(|c| match c {
                    ControlDescriptor::Combobox(cb) if cb.id == id => Some(cb),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("no combobox {}", id))
        }

        fn has_control(&self, id: &str) -> bool {
            self.controls.iter().any(|c| c.id() == id)
        }
    }

    #[derive(Default)]
    struct MockChannel {
        sent: Vec<(EntityId, SyncRequest)>,
    }

    impl SyncChannel for MockChannel {
        fn send_to_server(&mut self, block: EntityId, request: SyncRequest) {
            self.sent.push((block, request));
        }

        fn broadcast_snapshot(&mut self, _block: EntityId, _snapshot: Vec<u8>) {}
    }

    struct StaticGrid(Vec<ManagedBlock>);

    impl GridIndex for StaticGrid {
        fn managed_blocks(&self, _controller: EntityId) -> Vec<ManagedBlock> {
            self.0.clone()
        }
    }

    fn catalog() -> ItemCatalog {
        let ore_names = ["Iron", "Nickel", "Cobalt"];
        ItemCatalog {
            items: ore_names
                .iter()
                .map(|name| ItemDef {
                    id: ItemId::ore(name),
                    display_name: format!("{} Ore", name),
                })
                .collect(),
            blueprints: ore_names
                .iter()
                .map(|name| Blueprint {
                    name: format!("{}OreToIngot", name),
                    class: "Ingots".to_string(),
                    prerequisites: vec![ItemStack {
                        item: ItemId::ore(name),
                        amount: 1.0,
                    }],
                    results: vec![ItemStack {
                        item: ItemId::ingot(name),
                        amount: 0.7,
                    }],
                })
                .collect(),
            refineries: vec![RefineryDef {
                subtype: "LargeRefinery".to_string(),
                display_name: "Refinery".to_string(),
                classes: vec!["Ingots".to_string()],
            }],
        }
    }

    struct Fixture {
        registry: MockRegistry,
        controllers: ControllerRegistry,
        channel: MockChannel,
        grid: StaticGrid,
    }

    impl Fixture {
        fn new() -> Self {
            let terminal = TerminalController::new(ControllerKind::Refinery, &catalog(), false);
            let mut registry = MockRegistry::default();
            terminal.initialize_controls(&mut registry);

            let mut controllers = ControllerRegistry::new();
            controllers.create(BLOCK, ControllerKind::Refinery);

            Self {
                registry,
                controllers,
                channel: MockChannel::default(),
                grid: StaticGrid(vec![
                    ManagedBlock {
                        entity_id: REFINERY_A,
                        display_name: "Refinery A".to_string(),
                    },
                    ManagedBlock {
                        entity_id: REFINERY_B,
                        display_name: "Refinery B".to_string(),
                    },
                ]),
            }
        }

        fn ctx(&mut self) -> TerminalContext<'_> {
            TerminalContext {
                controllers: &mut self.controllers,
                channel: &mut self.channel,
                grid: &self.grid,
            }
        }
    }

    #[test]
    fn initialize_is_idempotent() {
        let terminal = TerminalController::new(ControllerKind::Refinery, &catalog(), true);
        let mut registry = MockRegistry::default();
        terminal.initialize_controls(&mut registry);
        let first = registry.controls.len();
        assert!(first > 0);
        terminal.initialize_controls(&mut registry);
        assert_eq!(registry.controls.len(), first);
    }

    #[test]
    fn empty_catalog_registers_nothing() {
        let terminal =
            TerminalController::new(ControllerKind::Refinery, &ItemCatalog::default(), true);
        let mut registry = MockRegistry::default();
        terminal.initialize_controls(&mut registry);
        assert!(registry.controls.is_empty());
        assert!(registry.actions.is_empty());
    }

    #[test]
    fn request_settings_button_is_client_only() {
        let server = TerminalController::new(ControllerKind::Refinery, &catalog(), true);
        let mut server_registry = MockRegistry::default();
        server.initialize_controls(&mut server_registry);
        assert!(!server_registry.has_control("RequestSettings"));

        let client = TerminalController::new(ControllerKind::Refinery, &catalog(), false);
        let mut client_registry = MockRegistry::default();
        client.initialize_controls(&mut client_registry);
        assert!(client_registry.has_control("RequestSettings"));
    }

    #[test]
    fn can_add_controls_checks_subtype() {
        let terminal = TerminalController::new(ControllerKind::Refinery, &catalog(), true);
        assert!(terminal.can_add_controls("OreflowRefineryController"));
        assert!(!terminal.can_add_controls("OreflowAssemblerController"));
        assert!(!terminal.can_add_controls("OreDetector"));
    }

    #[test]
    fn enabled_checkbox_mutates_and_syncs() {
        let mut fx = Fixture::new();
        {
            let registry = std::mem::take(&mut fx.registry);
            let checkbox = registry.checkbox("Enabled");
            let mut ctx = fx.ctx();
            assert!((checkbox.getter)(&ctx, BLOCK));
            (checkbox.setter)(&mut ctx, BLOCK, false);
            assert!(!(checkbox.getter)(&ctx, BLOCK));
        }
        assert_eq!(fx.channel.sent.len(), 1);
        assert_eq!(fx.channel.sent[0].1, requests::set_enabled(false));
    }

    #[test]
    fn toggle_action_flips_state() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let toggle = registry
            .actions
            .iter()
            .find(|a| a.id == "Enabled_Toggle")
            .expect("toggle action");
        let mut ctx = fx.ctx();
        (toggle.invoke)(&mut ctx, BLOCK);
        assert!(!ctx.settings(BLOCK).map(|s| s.enabled).unwrap_or(true));
        (toggle.invoke)(&mut ctx, BLOCK);
        assert!(ctx.settings(BLOCK).map(|s| s.enabled).unwrap_or(false));
    }

    #[test]
    fn add_button_uses_combobox_selection() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let combobox = registry.combobox("DefaultItemFilter");
        let add = registry.button("AddDefaultPriority");
        // Options are display-name sorted: Cobalt, Iron, Nickel.
        assert_eq!(combobox.options, ["Cobalt Ore", "Iron Ore", "Nickel Ore"]);

        let mut ctx = fx.ctx();
        (combobox.setter)(&mut ctx, BLOCK, 1);
        (add.action)(&mut ctx, BLOCK);
        // Adding the same ore twice sends only once.
        (add.action)(&mut ctx, BLOCK);
        assert_eq!(
            ctx.settings(BLOCK)
                .map(|s| s.default_priority.items().to_vec()),
            Some(vec!["Iron".to_string()])
        );
        drop(ctx);
        assert_eq!(fx.channel.sent.len(), 1);
    }

    #[test]
    fn default_priority_buttons_reorder_and_remove() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let listbox = registry.listbox("DefaultPriority");
        let up = registry.button("MoveUpDefaultPriority");
        let down = registry.button("MoveDownDefaultPriority");
        let remove = registry.button("RemoveDefaultPriority");

        let mut ctx = fx.ctx();
        for key in ["A", "B", "C"] {
            ctx.send(BLOCK, requests::default_priority(SyncOp::Add, key));
        }

        (listbox.on_select)(&mut ctx, BLOCK, "B");
        assert!((up.enabled)(&ctx, BLOCK));
        (up.action)(&mut ctx, BLOCK);

        (listbox.on_select)(&mut ctx, BLOCK, "A");
        (down.action)(&mut ctx, BLOCK);

        (listbox.on_select)(&mut ctx, BLOCK, "B");
        (remove.action)(&mut ctx, BLOCK);

        assert_eq!(
            ctx.settings(BLOCK)
                .map(|s| s.default_priority.items().to_vec()),
            Some(vec!["C".to_string(), "A".to_string()])
        );

        let rows = (listbox.rows)(&ctx, BLOCK);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "C");
    }

    #[test]
    fn reorder_buttons_disabled_without_selection() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let up = registry.button("MoveUpDefaultPriority");
        let ctx = fx.ctx();
        assert!(!(up.enabled)(&ctx, BLOCK));
    }

    #[test]
    fn grid_listbox_marks_overrides_and_ignores() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let grid_list = registry.listbox("GridBlocks");

        let mut ctx = fx.ctx();
        ctx.send(BLOCK, requests::add_override(REFINERY_A));
        ctx.send(BLOCK, requests::ignore(REFINERY_B));

        let rows = (grid_list.rows)(&ctx, BLOCK);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "[X] Refinery A");
        assert_eq!(rows[1].label, "[-] Refinery B");
    }

    #[test]
    fn custom_priority_checkbox_round_trip() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let grid_list = registry.listbox("GridBlocks");
        let custom = registry.checkbox("CustomPriority");
        let ignore = registry.checkbox("IgnoreBlock");

        let mut ctx = fx.ctx();
        (grid_list.on_select)(&mut ctx, BLOCK, &REFINERY_A.to_string());
        assert!((custom.enabled)(&ctx, BLOCK));
        assert!(!(custom.getter)(&ctx, BLOCK));

        (custom.setter)(&mut ctx, BLOCK, true);
        assert!((custom.getter)(&ctx, BLOCK));

        // Ignoring the block clears the override, and vice versa.
        (ignore.setter)(&mut ctx, BLOCK, true);
        assert!((ignore.getter)(&ctx, BLOCK));
        assert!(!(custom.getter)(&ctx, BLOCK));

        (custom.setter)(&mut ctx, BLOCK, true);
        assert!(!(ignore.getter)(&ctx, BLOCK));

        (custom.setter)(&mut ctx, BLOCK, false);
        assert!(!(custom.getter)(&ctx, BLOCK));
    }

    #[test]
    fn override_priority_flow() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let grid_list = registry.listbox("GridBlocks");
        let custom = registry.checkbox("CustomPriority");
        let combobox = registry.combobox("DefaultItemFilter");
        let add = registry.button("AddOverridePriority");
        let override_list = registry.listbox("OverridePriority");
        let up = registry.button("MoveUpOverridePriority");

        let mut ctx = fx.ctx();
        assert!(!(add.enabled)(&ctx, BLOCK));

        (grid_list.on_select)(&mut ctx, BLOCK, &REFINERY_A.to_string());
        (custom.setter)(&mut ctx, BLOCK, true);
        assert!((add.enabled)(&ctx, BLOCK));

        (combobox.setter)(&mut ctx, BLOCK, 0); // Cobalt
        (add.action)(&mut ctx, BLOCK);
        (combobox.setter)(&mut ctx, BLOCK, 1); // Iron
        (add.action)(&mut ctx, BLOCK);

        (override_list.on_select)(&mut ctx, BLOCK, "Iron");
        assert!((up.enabled)(&ctx, BLOCK));
        (up.action)(&mut ctx, BLOCK);

        let rows = (override_list.rows)(&ctx, BLOCK);
        assert_eq!(
            rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
            ["Iron", "Cobalt"]
        );
        // The default list is untouched.
        assert!(ctx
            .settings(BLOCK)
            .map(|s| s.default_priority.is_empty())
            .unwrap_or(false));
    }

    #[test]
    fn selecting_another_block_clears_override_key() {
        let mut fx = Fixture::new();
        let registry = std::mem::take(&mut fx.registry);
        let grid_list = registry.listbox("GridBlocks");

        let mut ctx = fx.ctx();
        (grid_list.on_select)(&mut ctx, BLOCK, &REFINERY_A.to_string());
        if let Some(view) = ctx.view_mut(BLOCK) {
            view.selected_override_key = Some("Iron".to_string());
        }
        (grid_list.on_select)(&mut ctx, BLOCK, &REFINERY_B.to_string());
        assert_eq!(
            ctx.view(BLOCK).and_then(|v| v.selected_override_key.clone()),
            None
        );
    }
}
