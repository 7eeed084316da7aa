//! Property-based tests for aggregation.
//!
//! - Aggregation conserves the total of positive raw values per table.
//! - Combined-value records count both value fields.
//! - Nested item lists count quantity x unit value of every positive entry.
//! - Every aggregated item has a positive value.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use super::{aggregate_table, ItemMap};
use crate::catalog::builtin;
use crate::model::RawRecord;

const DESCRIPTIONS: &[&str] = &["Pneus", "Baterias", "Filtros", "Óleo lubrificante"];
const CATEGORIES: &[&str] = &["LIMPEZA", "OUTROS", "MANUTENÇÃO"];

/// Strategy for values between -1,000.00 and 1,000,000.00, zero included.
fn value() -> impl Strategy<Value = i64> {
    -100_000i64..100_000_000i64
}

fn records() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec(
        (0..DESCRIPTIONS.len(), 0..CATEGORIES.len(), value()),
        0..30,
    )
}

fn build(rows: &[(usize, usize, i64)], value_field: &str) -> Vec<RawRecord> {
    rows.iter()
        .enumerate()
        .map(|(i, (d, c, cents))| {
            RawRecord::new(
                format!("r{i}"),
                json!({
                    "descricao": DESCRIPTIONS[*d],
                    "categoria": CATEGORIES[*c],
                    value_field: Decimal::new(*cents, 2).to_string(),
                }),
            )
        })
        .collect()
}

fn positive_sum(rows: &[(usize, usize, i64)]) -> Decimal {
    rows.iter()
        .map(|(_, _, cents)| Decimal::new(*cents, 2))
        .filter(|v| *v > Decimal::ZERO)
        .sum()
}

fn amount() -> impl Strategy<Value = i64> {
    0i64..10_000_000i64
}

fn verba_records() -> impl Strategy<Value = Vec<(usize, i64, i64)>> {
    prop::collection::vec((0..DESCRIPTIONS.len(), amount(), amount()), 0..30)
}

fn nested_records() -> impl Strategy<Value = Vec<Vec<(usize, u32, i64)>>> {
    prop::collection::vec(
        prop::collection::vec((0..DESCRIPTIONS.len(), 0u32..20, amount()), 0..6),
        0..10,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_merge_conserves_total(rows in records()) {
        let catalog = builtin::tables().unwrap();
        let def = catalog.table("classe_ix_registros").unwrap();
        let mut items = ItemMap::new();
        aggregate_table(def, &build(&rows, "valor_nd_30"), &mut items).unwrap();

        let total: Decimal = items.values().map(|i| i.value).sum();
        prop_assert_eq!(total, positive_sum(&rows));
        prop_assert!(items.len() <= DESCRIPTIONS.len());
        prop_assert!(items.values().all(|i| i.value > Decimal::ZERO));
    }

    #[test]
    fn prop_distinct_records_conserve_total(rows in records()) {
        let catalog = builtin::tables().unwrap();
        let def = catalog.table("servicos_terceiros_registros").unwrap();
        let mut items = ItemMap::new();
        aggregate_table(def, &build(&rows, "valor_nd_39"), &mut items).unwrap();

        let total: Decimal = items.values().map(|i| i.value).sum();
        prop_assert_eq!(total, positive_sum(&rows));

        let source_count: usize = items.values().map(|i| i.source_records.len()).sum();
        let positive_rows = rows.iter().filter(|(_, _, c)| *c > 0).count();
        prop_assert_eq!(source_count, positive_rows);
    }

    #[test]
    fn prop_combined_value_conserves_both_fields(rows in verba_records()) {
        let catalog = builtin::tables().unwrap();
        let def = catalog.table("verba_operacional_registros").unwrap();
        let records: Vec<RawRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, (d, verba, suprimento))| {
                RawRecord::new(
                    format!("v{i}"),
                    json!({
                        "finalidade": DESCRIPTIONS[*d],
                        "valor_verba": Decimal::new(*verba, 2).to_string(),
                        "valor_suprimento": Decimal::new(*suprimento, 2).to_string(),
                    }),
                )
            })
            .collect();
        let mut items = ItemMap::new();
        aggregate_table(def, &records, &mut items).unwrap();

        let expected: Decimal = rows
            .iter()
            .map(|(_, verba, suprimento)| Decimal::new(verba + suprimento, 2))
            .sum();
        let total: Decimal = items.values().map(|i| i.value).sum();
        prop_assert_eq!(total, expected);
        prop_assert!(items.values().all(|i| i.value > Decimal::ZERO));
    }

    #[test]
    fn prop_nested_items_conserve_quantity_times_unit(rows in nested_records()) {
        let catalog = builtin::tables().unwrap();
        let def = catalog.table("material_permanente_registros").unwrap();
        let records: Vec<RawRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, entries)| {
                let itens: Vec<_> = entries
                    .iter()
                    .map(|(d, qty, cents)| {
                        json!({
                            "descricao": DESCRIPTIONS[*d],
                            "quantidade": qty.to_string(),
                            "valor_unitario": Decimal::new(*cents, 2).to_string(),
                        })
                    })
                    .collect();
                RawRecord::new(format!("p{i}"), json!({ "itens": itens }))
            })
            .collect();
        let mut items = ItemMap::new();
        aggregate_table(def, &records, &mut items).unwrap();

        let expected: Decimal = rows
            .iter()
            .flatten()
            .map(|(_, qty, cents)| Decimal::from(*qty) * Decimal::new(*cents, 2))
            .sum();
        let total: Decimal = items.values().map(|i| i.value).sum();
        prop_assert_eq!(total, expected);

        let positive = rows.iter().flatten().filter(|(_, q, c)| *q > 0 && *c > 0).count();
        prop_assert_eq!(items.len(), positive);
    }
}
