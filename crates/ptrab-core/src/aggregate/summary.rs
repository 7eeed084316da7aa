use super::ItemMap;
use crate::model::{Gnd, LineItem, NatureCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total of all line items under one GND/ND pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatureSummary {
    pub gnd: Gnd,
    pub nature: NatureCode,
    pub total: Decimal,
    pub item_count: usize,
}

/// Total of one category (source table) for one organizational unit.
///
/// This is the amount the ND 30/39 split is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub source_table: String,
    pub organization_unit: String,
    pub total: Decimal,
}

/// Per-nature totals, ordered by GND then ND.
pub fn summarize(items: &ItemMap) -> Vec<NatureSummary> {
    let mut acc: BTreeMap<(Gnd, NatureCode), (Decimal, usize)> = BTreeMap::new();
    for item in items.values() {
        let entry = acc.entry((item.gnd, item.nature)).or_default();
        entry.0 += item.value;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|((gnd, nature), (total, item_count))| NatureSummary {
            gnd,
            nature,
            total,
            item_count,
        })
        .collect()
}

/// Totals per source table and organizational unit.
///
/// Only costing (GND 3) ND 30/39 items count, since those are the ones split
/// between material and services.
pub fn category_totals(items: &ItemMap) -> Vec<CategoryTotal> {
    let mut acc: BTreeMap<(&str, &str), Decimal> = BTreeMap::new();
    for item in items.values().filter(|i| is_splittable(i)) {
        *acc.entry((item.source_table.as_str(), item.organization_unit.as_str()))
            .or_default() += item.value;
    }
    acc.into_iter()
        .map(|((table, org), total)| CategoryTotal {
            source_table: table.to_string(),
            organization_unit: org.to_string(),
            total,
        })
        .collect()
}

fn is_splittable(item: &LineItem) -> bool {
    item.gnd == Gnd::Custeio && matches!(item.nature, NatureCode::Nd30 | NatureCode::Nd39)
}
