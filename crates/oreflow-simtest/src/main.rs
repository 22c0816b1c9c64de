//! Oreflow Headless Validation Harness
//!
//! Exercises the controller logic and the host glue without a game
//! engine — no networking, no rendering, no terminal toolkit. Runs the
//! randomized sweeps that are too slow or too cross-module for unit
//! tests.
//!
//! Usage:
//!   cargo run -p oreflow-simtest
//!   cargo run -p oreflow-simtest -- --verbose

use oreflow_host::bridge::SyncChannel;
use oreflow_host::registry::{ControllerKind, ControllerRegistry};
use oreflow_logic::items::{ItemCatalog, ItemId};
use oreflow_logic::priority::OrePriorityList;
use oreflow_logic::settings::{ControllerSettings, EntityId, Resolution};
use oreflow_logic::sync::{self, requests, SyncOp, SyncRequest};
use oreflow_logic::triggers::{
    due_orders, Comparison, Inventory, QueueOrder, TriggerCondition, TriggerRule,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Ore catalog (same JSON a host would ship) ───────────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/ore_catalog.json");

const KEY_POOL: [&str; 8] = [
    "Iron", "Nickel", "Cobalt", "Silicon", "Silver", "Gold", "Platinum", "Uranium",
];

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Oreflow Validation Harness ===\n");

    let mut results = Vec::new();

    // 1. Ore catalog and refinable-ore derivation
    results.extend(validate_catalog(verbose));

    // 2. Randomized priority-list op sweep
    results.extend(validate_priority_ops(verbose));

    // 3. Override/ignore resolution
    results.extend(validate_resolution(verbose));

    // 4. Sync protocol convergence under random streams
    results.extend(validate_sync_convergence(verbose));

    // 5. Client/server registry round trip
    results.extend(validate_registry_round_trip(verbose));

    // 6. Trigger rules and stock targets
    results.extend(validate_triggers(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Ore catalog ──────────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Ore Catalog ---");
    let mut results = Vec::new();

    let catalog: ItemCatalog = match serde_json::from_str(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    let ores = catalog.refinable_ores();
    results.push(TestResult {
        name: "catalog_refinable_count".into(),
        passed: ores.len() == 11,
        detail: format!("{} refinable ores (expected 11)", ores.len()),
    });

    // Ice and Organic have no ingot blueprint and must not be orderable.
    for excluded in ["Ice", "Organic"] {
        results.push(TestResult {
            name: format!("catalog_excludes_{}", excluded.to_lowercase()),
            passed: !ores.contains(&ItemId::ore(excluded)),
            detail: format!("{} is not a priority key", excluded),
        });
    }

    // Stone refines through its multi-result blueprint.
    results.push(TestResult {
        name: "catalog_includes_stone".into(),
        passed: ores.contains(&ItemId::ore("Stone")),
        detail: "stone crushing yields ingots".into(),
    });

    // Display-name ordering.
    let names: Vec<&str> = ores.iter().map(|id| catalog.display_name(id)).collect();
    let mut sorted = names.clone();
    sorted.sort();
    results.push(TestResult {
        name: "catalog_sorted_by_display_name".into(),
        passed: names == sorted,
        detail: "refinable ores sorted for the combobox".into(),
    });

    // Every key the sweeps use below must be legal.
    let missing: Vec<&str> = KEY_POOL
        .iter()
        .filter(|key| !ores.contains(&ItemId::ore(key)))
        .copied()
        .collect();
    results.push(TestResult {
        name: "catalog_covers_key_pool".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            "all sweep keys are refinable".into()
        } else {
            format!("missing from catalog: {}", missing.join(", "))
        },
    });

    if verbose {
        for id in &ores {
            println!("    {} ({})", id.display(), catalog.display_name(id));
        }
    }

    results
}

// ── 2. Priority-list sweep ──────────────────────────────────────────────

fn validate_priority_ops(_verbose: bool) -> Vec<TestResult> {
    println!("--- Priority List Ops ---");
    let mut results = Vec::new();

    let mut rng = StdRng::seed_from_u64(0x0990);
    let mut list = OrePriorityList::default();
    let mut duplicate_seen = false;
    let mut overflow_seen = false;

    for _ in 0..5000 {
        let key = KEY_POOL[rng.gen_range(0..KEY_POOL.len())];
        match rng.gen_range(0..4) {
            0 => list.add(key),
            1 => list.remove(key),
            2 => list.move_up(key),
            _ => list.move_down(key),
        }

        let items = list.items();
        for (i, a) in items.iter().enumerate() {
            if items[i + 1..].contains(a) {
                duplicate_seen = true;
            }
        }
        if items.len() > KEY_POOL.len() {
            overflow_seen = true;
        }
    }

    results.push(TestResult {
        name: "priority_no_duplicates".into(),
        passed: !duplicate_seen,
        detail: "5000 random ops, uniqueness held throughout".into(),
    });
    results.push(TestResult {
        name: "priority_bounded_by_key_pool".into(),
        passed: !overflow_seen,
        detail: format!("final length {}", list.len()),
    });

    // Boundary moves are no-ops.
    let mut list = OrePriorityList::from_keys(["Iron", "Gold"]);
    list.move_up("Iron");
    list.move_down("Gold");
    results.push(TestResult {
        name: "priority_boundary_moves_noop".into(),
        passed: list.items() == ["Iron", "Gold"],
        detail: "move-up on first and move-down on last left order alone".into(),
    });

    results
}

// ── 3. Resolution ───────────────────────────────────────────────────────

fn validate_resolution(_verbose: bool) -> Vec<TestResult> {
    println!("--- Override/Ignore Resolution ---");
    let mut results = Vec::new();

    let mut rng = StdRng::seed_from_u64(0x51e7);
    let mut settings = ControllerSettings::default();
    settings.default_priority.add("Iron");

    let blocks: Vec<EntityId> = (100..140).collect();
    let mut exclusive = true;
    for _ in 0..2000 {
        let id = blocks[rng.gen_range(0..blocks.len())];
        match rng.gen_range(0..4) {
            0 => {
                settings.add_override(id);
            }
            1 => settings.remove_override(id),
            2 => settings.ignore(id),
            _ => settings.unignore(id),
        }
        for &b in &blocks {
            if settings.is_ignored(b) && settings.override_for(b).is_some() {
                exclusive = false;
            }
        }
    }
    results.push(TestResult {
        name: "resolution_override_ignore_exclusive".into(),
        passed: exclusive,
        detail: "2000 random ops, no block ever in both sets".into(),
    });

    // Resolution matches membership after the sweep.
    let mut consistent = true;
    for &b in &blocks {
        let expected_ignored = settings.is_ignored(b);
        let expected_override = settings.override_for(b).is_some();
        match settings.resolve(b) {
            Resolution::Ignored => {
                if !expected_ignored {
                    consistent = false;
                }
            }
            Resolution::Override(_) => {
                if !expected_override || expected_ignored {
                    consistent = false;
                }
            }
            Resolution::Default(list) => {
                if expected_ignored || expected_override || !list.contains("Iron") {
                    consistent = false;
                }
            }
        }
    }
    results.push(TestResult {
        name: "resolution_matches_membership".into(),
        passed: consistent,
        detail: format!(
            "{} overrides, {} ignored after sweep",
            settings.override_count(),
            settings.ignored().count()
        ),
    });

    results
}

// ── 4. Sync convergence ─────────────────────────────────────────────────

fn random_request(rng: &mut StdRng) -> SyncRequest {
    let key = KEY_POOL[rng.gen_range(0..KEY_POOL.len())];
    let block: EntityId = rng.gen_range(100..110);
    match rng.gen_range(0..10) {
        0 => requests::set_enabled(rng.gen_bool(0.5)),
        1 => requests::default_priority(SyncOp::Add, key),
        2 => requests::default_priority(SyncOp::Del, key),
        3 => requests::default_priority(SyncOp::Up, key),
        4 => requests::default_priority(SyncOp::Down, key),
        5 => requests::add_override(block),
        6 => requests::remove_override(block),
        7 => requests::ignore(block),
        8 => requests::override_priority(block, SyncOp::Add, key),
        _ => SyncRequest {
            // Garbage a hostile or outdated client might send.
            category: "Bogus".to_string(),
            op: SyncOp::Set,
            value: "???".to_string(),
            context: Some("not-a-number".to_string()),
        },
    }
}

fn validate_sync_convergence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Sync Convergence ---");
    let mut results = Vec::new();

    let mut rng = StdRng::seed_from_u64(0xc0de);
    let mut diverged = false;
    let mut applied = 0usize;
    let mut rejected = 0usize;

    for _ in 0..20 {
        let mut server = ControllerSettings::default();
        let mut client = ControllerSettings::default();
        for _ in 0..500 {
            let request = random_request(&mut rng);
            let a = sync::apply(&mut server, &request);
            let b = sync::apply(&mut client, &request);
            if a != b || server != client {
                diverged = true;
            }
            if a {
                applied += 1;
            } else {
                rejected += 1;
            }
        }
    }

    results.push(TestResult {
        name: "sync_replicas_converge".into(),
        passed: !diverged,
        detail: format!(
            "20 streams x 500 requests ({} applied, {} rejected), replicas equal",
            applied, rejected
        ),
    });
    results.push(TestResult {
        name: "sync_rejects_garbage".into(),
        passed: rejected > 0,
        detail: "malformed requests were refused on both sides".into(),
    });

    results
}

// ── 5. Registry round trip ──────────────────────────────────────────────

#[derive(Default)]
struct QueueChannel {
    to_server: Vec<(EntityId, SyncRequest)>,
    snapshots: Vec<(EntityId, Vec<u8>)>,
}

impl SyncChannel for QueueChannel {
    fn send_to_server(&mut self, block: EntityId, request: SyncRequest) {
        self.to_server.push((block, request));
    }

    fn broadcast_snapshot(&mut self, block: EntityId, snapshot: Vec<u8>) {
        self.snapshots.push((block, snapshot));
    }
}

fn validate_registry_round_trip(_verbose: bool) -> Vec<TestResult> {
    println!("--- Registry Round Trip ---");
    let mut results = Vec::new();

    const BLOCK: EntityId = 7;
    let mut rng = StdRng::seed_from_u64(0xfeed);
    let mut server = ControllerRegistry::new();
    let mut owner = ControllerRegistry::new();
    let mut observer = ControllerRegistry::new();
    for registry in [&mut server, &mut owner, &mut observer] {
        registry.create(BLOCK, ControllerKind::Refinery);
    }

    let mut channel = QueueChannel::default();
    for _ in 0..300 {
        let request = random_request(&mut rng);
        owner.send(BLOCK, request, &mut channel);
    }

    // Ship everything to the server, then fan the snapshots out to both
    // clients (the owner installs them too — server state wins).
    for (block, request) in channel.to_server.drain(..).collect::<Vec<_>>() {
        server.handle_request(block, &request, &mut channel);
    }
    let mut observer_ok = true;
    for (block, snapshot) in channel.snapshots.drain(..).collect::<Vec<_>>() {
        observer_ok &= observer.apply_snapshot(block, &snapshot);
        owner.apply_snapshot(block, &snapshot);
    }

    let server_settings = server.get(BLOCK).map(|c| c.settings.clone());
    let all_equal = server_settings == owner.get(BLOCK).map(|c| c.settings.clone())
        && server_settings == observer.get(BLOCK).map(|c| c.settings.clone());

    results.push(TestResult {
        name: "registry_snapshots_decode".into(),
        passed: observer_ok,
        detail: "every broadcast snapshot decoded on the observer".into(),
    });
    results.push(TestResult {
        name: "registry_three_way_convergence".into(),
        passed: all_equal,
        detail: "server, owner, and observer settings equal after fan-out".into(),
    });

    // Desync recovery: wipe the observer and re-request.
    observer.remove(BLOCK);
    observer.create(BLOCK, ControllerKind::Refinery);
    observer.request_settings(BLOCK, &mut channel);
    let requests_to_replay: Vec<_> = channel.to_server.drain(..).collect();
    for (block, request) in requests_to_replay {
        server.handle_request(block, &request, &mut channel);
    }
    let snapshots: Vec<_> = channel.snapshots.drain(..).collect();
    for (block, snapshot) in snapshots {
        observer.apply_snapshot(block, &snapshot);
    }
    results.push(TestResult {
        name: "registry_desync_recovery".into(),
        passed: server_settings == observer.get(BLOCK).map(|c| c.settings.clone()),
        detail: "request-settings round trip restored a wiped client".into(),
    });

    results
}

// ── 6. Triggers & stock ─────────────────────────────────────────────────

fn validate_triggers(_verbose: bool) -> Vec<TestResult> {
    println!("--- Triggers & Stock ---");
    let mut results = Vec::new();

    let rules = vec![
        TriggerRule {
            id: 1,
            name: "Restock steel".into(),
            enabled: true,
            conditions: vec![TriggerCondition {
                item: "SteelPlate".into(),
                comparison: Comparison::Below,
                amount: 200.0,
            }],
            orders: vec![QueueOrder {
                blueprint: "SteelPlate".into(),
                amount: 100,
            }],
        },
        TriggerRule {
            id: 2,
            name: "Spend surplus iron".into(),
            enabled: true,
            conditions: vec![
                TriggerCondition {
                    item: "IronIngot".into(),
                    comparison: Comparison::AtLeast,
                    amount: 1000.0,
                },
                TriggerCondition {
                    item: "InteriorPlate".into(),
                    comparison: Comparison::Below,
                    amount: 500.0,
                },
            ],
            orders: vec![QueueOrder {
                blueprint: "InteriorPlate".into(),
                amount: 250,
            }],
        },
    ];

    let empty = Inventory::new();
    let orders = due_orders(&rules, &empty);
    results.push(TestResult {
        name: "triggers_empty_inventory".into(),
        passed: orders.len() == 1 && orders[0].blueprint == "SteelPlate",
        detail: "only the low-stock rule fires with nothing on hand".into(),
    });

    let mut rich = Inventory::new();
    rich.insert("SteelPlate".into(), 5000.0);
    rich.insert("IronIngot".into(), 4000.0);
    rich.insert("InteriorPlate".into(), 10.0);
    let orders = due_orders(&rules, &rich);
    results.push(TestResult {
        name: "triggers_surplus_inventory".into(),
        passed: orders.len() == 1 && orders[0].blueprint == "InteriorPlate",
        detail: "surplus rule fires once steel is stocked".into(),
    });

    // Stock targets ride the sync protocol.
    let mut settings = ControllerSettings::default();
    sync::apply(&mut settings, &requests::set_stock("SteelPlate", 300.0));
    sync::apply(&mut settings, &requests::set_stock("Motor", 50.0));
    sync::apply(&mut settings, &requests::remove_stock("Motor"));
    let mut inventory = Inventory::new();
    inventory.insert("SteelPlate".into(), 120.0);
    let deficits = oreflow_logic::triggers::stock_deficits(&settings.stock, &inventory);
    results.push(TestResult {
        name: "stock_deficit_via_sync".into(),
        passed: deficits == vec![("SteelPlate".to_string(), 180.0)],
        detail: "synced stock target reports the shortfall".into(),
    });

    results
}
