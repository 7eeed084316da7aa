//! Property-based tests for the DOR board.
//!
//! - An item is never both available and inside a group.
//! - An item appears in at most one group.
//! - A group's total is the sum of its items.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::{DorBoard, GroupId};
use crate::aggregate::ItemMap;
use crate::model::{Gnd, LineItem, NatureCode};

#[derive(Debug, Clone)]
enum Op {
    Create,
    Move { item: usize, group: usize },
    Return { item: usize, group: usize },
    Delete { group: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        (0usize..8, 0usize..4).prop_map(|(item, group)| Op::Move { item, group }),
        (0usize..8, 0usize..4).prop_map(|(item, group)| Op::Return { item, group }),
        (0usize..4).prop_map(|group| Op::Delete { group }),
    ]
}

fn item_map(values: &[i64]) -> ItemMap {
    values
        .iter()
        .enumerate()
        .map(|(i, cents)| {
            let id = format!("item-{i}");
            (
                id.clone(),
                LineItem {
                    id: id.clone(),
                    description: id,
                    value: Decimal::new(*cents, 2),
                    gnd: Gnd::Custeio,
                    nature: NatureCode::Nd30,
                    source_table: "t".into(),
                    organization_unit: "OM".into(),
                    subitem: None,
                    source_records: vec![],
                },
            )
        })
        .collect()
}

fn run_ops(board: &mut DorBoard, ops: &[Op], item_count: usize) {
    let mut created: Vec<GroupId> = Vec::new();
    let mut counter = 0;
    for op in ops {
        match op {
            Op::Create => {
                counter += 1;
                if let Ok(id) = board.create_group(&format!("g{counter}")) {
                    created.push(id);
                }
            }
            Op::Move { item, group } => {
                if let Some(g) = created.get(*group) {
                    let _ = board.move_item(&format!("item-{}", item % item_count), *g);
                }
            }
            Op::Return { item, group } => {
                if let Some(g) = created.get(*group) {
                    let _ = board.return_item(*g, &format!("item-{}", item % item_count));
                }
            }
            Op::Delete { group } => {
                if let Some(g) = created.get(*group) {
                    let _ = board.delete_group(*g);
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_groups_and_available_partition_items(
        values in prop::collection::vec(1i64..10_000_000, 1..8),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let items = item_map(&values);
        let mut board = DorBoard::new(items.clone());
        run_ops(&mut board, &ops, values.len());

        let mut seen = HashSet::new();
        for g in board.groups() {
            let sum: Decimal = g.items.iter().map(|i| i.value).sum();
            prop_assert_eq!(g.total, sum);
            for i in &g.items {
                prop_assert!(seen.insert(i.id.clone()), "item {} in two groups", i.id);
            }
        }
        for i in board.available() {
            prop_assert!(!seen.contains(&i.id), "item {} grouped and available", i.id);
            seen.insert(i.id.clone());
        }
        prop_assert_eq!(seen.len(), items.len());
    }

    #[test]
    fn prop_grouped_plus_available_conserves_value(
        values in prop::collection::vec(1i64..10_000_000, 1..8),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let items = item_map(&values);
        let expected: Decimal = items.values().map(|i| i.value).sum();
        let mut board = DorBoard::new(items);
        run_ops(&mut board, &ops, values.len());

        let grouped: Decimal = board.groups().iter().map(|g| g.total).sum();
        prop_assert_eq!(grouped + board.available_total(), expected);
    }
}
