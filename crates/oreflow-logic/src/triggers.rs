//! Trigger rules and stock targets for assembler-style controllers.
//!
//! A trigger rule watches an inventory snapshot and, when every condition
//! holds, emits production orders for the host to queue. Stock targets are
//! the simpler standing form: keep at least N of an item, report the
//! shortfall. Evaluation is pure — the host decides when to sample
//! inventory and what to do with the orders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregated inventory snapshot, item key → total amount on the grid.
pub type Inventory = BTreeMap<String, f64>;

/// How a condition compares the observed amount to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// Observed amount strictly below the threshold.
    Below,
    /// Observed amount at or above the threshold.
    AtLeast,
}

/// A single inventory condition. Items missing from the snapshot count
/// as amount 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCondition {
    pub item: String,
    pub comparison: Comparison,
    pub amount: f64,
}

impl TriggerCondition {
    pub fn holds(&self, inventory: &Inventory) -> bool {
        let observed = inventory.get(&self.item).copied().unwrap_or(0.0);
        match self.comparison {
            Comparison::Below => observed < self.amount,
            Comparison::AtLeast => observed >= self.amount,
        }
    }
}

/// A production order emitted by a fired rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueOrder {
    /// Blueprint to queue on the managed block.
    pub blueprint: String,
    pub amount: u32,
}

/// A named rule: when all conditions hold, queue all orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRule {
    pub id: u64,
    pub name: String,
    pub enabled: bool,
    /// All conditions must hold. An empty list never fires.
    pub conditions: Vec<TriggerCondition>,
    pub orders: Vec<QueueOrder>,
}

impl TriggerRule {
    pub fn fires(&self, inventory: &Inventory) -> bool {
        self.enabled
            && !self.conditions.is_empty()
            && self.conditions.iter().all(|c| c.holds(inventory))
    }
}

/// Orders due from `rules` against `inventory`, in rule order.
pub fn due_orders(rules: &[TriggerRule], inventory: &Inventory) -> Vec<QueueOrder> {
    rules
        .iter()
        .filter(|rule| rule.fires(inventory))
        .flat_map(|rule| rule.orders.iter().cloned())
        .collect()
}

/// Standing minimum-stock requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTarget {
    pub item: String,
    pub amount: f64,
}

/// Positive shortfalls against `targets`, in target order.
pub fn stock_deficits(targets: &[StockTarget], inventory: &Inventory) -> Vec<(String, f64)> {
    targets
        .iter()
        .filter_map(|target| {
            let observed = inventory.get(&target.item).copied().unwrap_or(0.0);
            let deficit = target.amount - observed;
            (deficit > 0.0).then(|| (target.item.clone(), deficit))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(entries: &[(&str, f64)]) -> Inventory {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    fn low_steel_rule() -> TriggerRule {
        TriggerRule {
            id: 1,
            name: "Restock steel plate".to_string(),
            enabled: true,
            conditions: vec![TriggerCondition {
                item: "SteelPlate".to_string(),
                comparison: Comparison::Below,
                amount: 100.0,
            }],
            orders: vec![QueueOrder {
                blueprint: "SteelPlate".to_string(),
                amount: 50,
            }],
        }
    }

    #[test]
    fn rule_fires_when_stock_low() {
        let rule = low_steel_rule();
        assert!(rule.fires(&inventory(&[("SteelPlate", 20.0)])));
        assert!(!rule.fires(&inventory(&[("SteelPlate", 100.0)])));
    }

    #[test]
    fn missing_item_counts_as_zero() {
        let rule = low_steel_rule();
        assert!(rule.fires(&inventory(&[])));
    }

    #[test]
    fn disabled_rule_never_fires() {
        let mut rule = low_steel_rule();
        rule.enabled = false;
        assert!(!rule.fires(&inventory(&[])));
    }

    #[test]
    fn empty_conditions_never_fire() {
        let mut rule = low_steel_rule();
        rule.conditions.clear();
        assert!(!rule.fires(&inventory(&[])));
    }

    #[test]
    fn all_conditions_must_hold() {
        let mut rule = low_steel_rule();
        rule.conditions.push(TriggerCondition {
            item: "IronIngot".to_string(),
            comparison: Comparison::AtLeast,
            amount: 500.0,
        });
        // Steel is low but there is no iron to build with.
        assert!(!rule.fires(&inventory(&[("SteelPlate", 20.0)])));
        assert!(rule.fires(&inventory(&[
            ("SteelPlate", 20.0),
            ("IronIngot", 800.0)
        ])));
    }

    #[test]
    fn due_orders_in_rule_order() {
        let mut second = low_steel_rule();
        second.id = 2;
        second.orders = vec![QueueOrder {
            blueprint: "InteriorPlate".to_string(),
            amount: 25,
        }];
        let rules = vec![low_steel_rule(), second];
        let orders = due_orders(&rules, &inventory(&[]));
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].blueprint, "SteelPlate");
        assert_eq!(orders[1].blueprint, "InteriorPlate");
    }

    #[test]
    fn stock_deficits_only_positive() {
        let targets = vec![
            StockTarget {
                item: "SteelPlate".to_string(),
                amount: 100.0,
            },
            StockTarget {
                item: "IronIngot".to_string(),
                amount: 50.0,
            },
        ];
        let deficits = stock_deficits(&targets, &inventory(&[("SteelPlate", 30.0), ("IronIngot", 80.0)]));
        assert_eq!(deficits, vec![("SteelPlate".to_string(), 70.0)]);
    }

    #[test]
    fn satisfied_targets_report_nothing() {
        let targets = vec![StockTarget {
            item: "SteelPlate".to_string(),
            amount: 10.0,
        }];
        assert!(stock_deficits(&targets, &inventory(&[("SteelPlate", 10.0)])).is_empty());
    }
}
