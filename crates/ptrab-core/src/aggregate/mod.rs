#[cfg(test)]
mod props;
pub mod summary;

use crate::catalog::schema::{FieldMatch, SourceTableDef, SpecialHandling};
use crate::error::PtrabError;
use crate::model::{value_to_decimal, value_to_text, Gnd, LineItem, RawRecord};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

pub use summary::{category_totals, summarize, CategoryTotal, NatureSummary};

/// Aggregated line items keyed by aggregation key.
pub type ItemMap = BTreeMap<String, LineItem>;

/// A table descriptor together with the records fetched for it.
#[derive(Debug, Clone)]
pub struct TableBatch<'a> {
    pub table: &'a SourceTableDef,
    pub records: Vec<RawRecord>,
}

/// One would-be line item produced from a single raw record.
struct Candidate {
    key: String,
    description: String,
    value: Decimal,
    subitem: Option<String>,
}

/// Aggregate every batch into a single item map.
pub fn aggregate(batches: &[TableBatch<'_>]) -> Result<ItemMap, PtrabError> {
    let mut items = ItemMap::new();
    for batch in batches {
        aggregate_table(batch.table, &batch.records, &mut items)?;
    }
    Ok(items)
}

/// Aggregate the records of one table into `items`.
///
/// Records of the same table, organizational unit and description are
/// merged by summing their values, except investment (GND 4) tables and records
/// matching the table's `distinct_when` rule, which stay one item per
/// record. Candidates with a zero or negative value are dropped.
pub fn aggregate_table(
    table: &SourceTableDef,
    records: &[RawRecord],
    items: &mut ItemMap,
) -> Result<(), PtrabError> {
    for record in records {
        let org_unit = record.text(&table.org_unit_field).unwrap_or_default();

        for candidate in expand_record(table, record, &org_unit)? {
            if candidate.value <= Decimal::ZERO {
                debug!(
                    table = %table.table,
                    record = %record.id,
                    value = %candidate.value,
                    "discarding non-positive record"
                );
                continue;
            }

            match items.get_mut(&candidate.key) {
                Some(existing) => {
                    existing.value = existing
                        .value
                        .checked_add(candidate.value)
                        .ok_or_else(|| {
                            PtrabError::overflow(format!("total of '{}'", existing.id))
                        })?;
                    if !existing.source_records.iter().any(|r| r.id == record.id) {
                        existing.source_records.push(record.clone());
                    }
                }
                None => {
                    items.insert(
                        candidate.key.clone(),
                        LineItem {
                            id: candidate.key,
                            description: candidate.description,
                            value: candidate.value,
                            gnd: table.gnd,
                            nature: table.nature,
                            source_table: table.table.clone(),
                            organization_unit: org_unit.clone(),
                            subitem: candidate.subitem,
                            source_records: vec![record.clone()],
                        },
                    );
                }
            }
        }
    }
    Ok(())
}

fn is_per_record(table: &SourceTableDef, record: &RawRecord) -> bool {
    table.gnd == Gnd::Investimento
        || table
            .distinct_when
            .as_ref()
            .is_some_and(|m| field_matches(record, m))
}

fn field_matches(record: &RawRecord, m: &FieldMatch) -> bool {
    record
        .text(&m.field)
        .is_some_and(|v| v.to_uppercase() == m.equals.trim().to_uppercase())
}

fn shared_key(table: &str, org_unit: &str, description: &str) -> String {
    format!("{table}:{org_unit}:{description}")
}

fn record_key(table: &str, record_id: &str) -> String {
    format!("{table}#{record_id}")
}

fn key_for(
    table: &SourceTableDef,
    record: &RawRecord,
    org_unit: &str,
    description: &str,
) -> String {
    if is_per_record(table, record) {
        record_key(&table.table, &record.id)
    } else {
        shared_key(&table.table, org_unit, description)
    }
}

fn base_description(table: &SourceTableDef, record: &RawRecord) -> String {
    table
        .description_field
        .as_ref()
        .and_then(|f| record.text(f))
        .unwrap_or_else(|| table.label.clone())
}

fn expand_record(
    table: &SourceTableDef,
    record: &RawRecord,
    org_unit: &str,
) -> Result<Vec<Candidate>, PtrabError> {
    let description = base_description(table, record);
    let overflow = || {
        PtrabError::overflow(format!(
            "value of record '{}' in '{}'",
            record.id, table.table
        ))
    };

    match &table.special {
        None => {
            let value = record.decimal_or_zero(&table.value_field)?;
            Ok(vec![Candidate {
                key: key_for(table, record, org_unit, &description),
                description,
                value,
                subitem: None,
            }])
        }
        Some(SpecialHandling::CombinedValue { extra_value_field }) => {
            let value = record
                .decimal_or_zero(&table.value_field)?
                .checked_add(record.decimal_or_zero(extra_value_field)?)
                .ok_or_else(overflow)?;
            Ok(vec![Candidate {
                key: key_for(table, record, org_unit, &description),
                description,
                value,
                subitem: None,
            }])
        }
        Some(SpecialHandling::Subsistence {
            qs_quantity_field,
            qr_quantity_field,
            qs_value_field,
            qr_value_field,
        }) => {
            let qs_qty = record.decimal_or_zero(qs_quantity_field)?;
            let qr_qty = record.decimal_or_zero(qr_quantity_field)?;
            let qs_value = record.decimal_or_zero(qs_value_field)?;
            let qr_value = record.decimal_or_zero(qr_value_field)?;

            let ration = |suffix: &str, value: Decimal| {
                let desc = format!("{description} ({suffix})");
                Candidate {
                    key: key_for(table, record, org_unit, &desc),
                    description: desc,
                    value,
                    subitem: None,
                }
            };

            let has_qs = qs_qty > Decimal::ZERO;
            let has_qr = qr_qty > Decimal::ZERO;
            if has_qs && has_qr {
                return Ok(vec![ration("QS", qs_value), ration("QR", qr_value)]);
            }

            let total = match record.decimal(&table.value_field)? {
                Some(total) => total,
                None => qs_value.checked_add(qr_value).ok_or_else(overflow)?,
            };
            Ok(vec![match (has_qs, has_qr) {
                (true, _) => ration("QS", total),
                (_, true) => ration("QR", total),
                _ => Candidate {
                    key: key_for(table, record, org_unit, &description),
                    description: description.clone(),
                    value: total,
                    subitem: None,
                },
            }])
        }
        Some(SpecialHandling::NestedItems {
            items_field,
            description_field,
            quantity_field,
            unit_value_field,
            subitem_field,
        }) => {
            let Some(entries) = record.array(items_field) else {
                debug!(table = %table.table, record = %record.id, "record has no nested items");
                return Ok(Vec::new());
            };

            let mut out = Vec::with_capacity(entries.len());
            for (i, entry) in entries.iter().enumerate() {
                let obj = entry.as_object().ok_or_else(|| {
                    PtrabError::Validation(format!(
                        "record '{}' in '{}': item {} of '{}' is not an object",
                        record.id,
                        table.table,
                        i + 1,
                        items_field
                    ))
                })?;
                let desc = obj
                    .get(description_field)
                    .and_then(value_to_text)
                    .unwrap_or_else(|| table.label.clone());
                let quantity = match obj.get(quantity_field) {
                    Some(v) => value_to_decimal(v, quantity_field)?.unwrap_or(Decimal::ZERO),
                    None => Decimal::ZERO,
                };
                let unit_value = match obj.get(unit_value_field) {
                    Some(v) => value_to_decimal(v, unit_value_field)?.unwrap_or(Decimal::ZERO),
                    None => Decimal::ZERO,
                };
                let subitem = subitem_field
                    .as_ref()
                    .and_then(|f| obj.get(f))
                    .and_then(value_to_text);

                out.push(Candidate {
                    key: format!("{}/{}", record_key(&table.table, &record.id), i + 1),
                    description: desc,
                    value: quantity.checked_mul(unit_value).ok_or_else(overflow)?,
                    subitem,
                });
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;
    use crate::catalog::schema::TableCatalog;
    use crate::model::NatureCode;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn catalog() -> TableCatalog {
        builtin::tables().unwrap()
    }

    fn run(table: &str, records: Vec<RawRecord>) -> ItemMap {
        let c = catalog();
        let def = c.table(table).unwrap();
        let mut items = ItemMap::new();
        aggregate_table(def, &records, &mut items).unwrap();
        items
    }

    #[test]
    fn test_same_description_merges() {
        let items = run(
            "classe_ix_registros",
            vec![
                RawRecord::new("a", json!({ "descricao": "Pneus", "valor_nd_30": 100, "organizacao": "1º BIS" })),
                RawRecord::new("b", json!({ "descricao": "Pneus", "valor_nd_30": "250,50", "organizacao": "1º BIS" })),
                RawRecord::new("c", json!({ "descricao": "Baterias", "valor_nd_30": 80 })),
            ],
        );
        assert_eq!(items.len(), 2);
        let pneus = &items["classe_ix_registros:1º BIS:Pneus"];
        assert_eq!(pneus.value, dec!(350.50));
        assert_eq!(pneus.source_records.len(), 2);
        assert_eq!(pneus.organization_unit, "1º BIS");
        assert_eq!(pneus.nature, NatureCode::Nd30);
        assert_eq!(pneus.gnd, Gnd::Custeio);
    }

    #[test]
    fn test_org_units_do_not_merge() {
        let items = run(
            "classe_ix_registros",
            vec![
                RawRecord::new("a", json!({ "descricao": "Pneus", "valor_nd_30": 100, "organizacao": "1º BIS" })),
                RawRecord::new("b", json!({ "descricao": "Pneus", "valor_nd_30": 900, "organizacao": "2º BEC" })),
            ],
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items["classe_ix_registros:1º BIS:Pneus"].value, dec!(100));
        let bec = &items["classe_ix_registros:2º BEC:Pneus"];
        assert_eq!(bec.value, dec!(900));
        assert_eq!(bec.organization_unit, "2º BEC");

        let totals = summary::category_totals(&items);
        assert_eq!(totals.len(), 2);
        assert!(totals
            .iter()
            .any(|t| t.organization_unit == "2º BEC" && t.total == dec!(900)));
    }

    #[test]
    fn test_outros_records_stay_distinct() {
        let items = run(
            "servicos_terceiros_registros",
            vec![
                RawRecord::new("a", json!({ "descricao": "Lavanderia", "categoria": "OUTROS", "valor_nd_39": 100 })),
                RawRecord::new("b", json!({ "descricao": "Lavanderia", "categoria": "outros", "valor_nd_39": 200 })),
                RawRecord::new("c", json!({ "descricao": "Lavanderia", "categoria": "LIMPEZA", "valor_nd_39": 300 })),
                RawRecord::new("d", json!({ "descricao": "Lavanderia", "categoria": "LIMPEZA", "valor_nd_39": 50 })),
            ],
        );
        assert_eq!(items.len(), 3);
        assert_eq!(items["servicos_terceiros_registros#a"].value, dec!(100));
        assert_eq!(items["servicos_terceiros_registros#b"].value, dec!(200));
        assert_eq!(items["servicos_terceiros_registros::Lavanderia"].value, dec!(350));
    }

    #[test]
    fn test_non_positive_values_discarded() {
        let items = run(
            "classe_ix_registros",
            vec![
                RawRecord::new("a", json!({ "descricao": "Pneus", "valor_nd_30": 0 })),
                RawRecord::new("b", json!({ "descricao": "Filtros", "valor_nd_30": -10 })),
                RawRecord::new("c", json!({ "descricao": "Óleo" })),
            ],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_subsistence_splits_by_ration() {
        let items = run(
            "classe_i_registros",
            vec![RawRecord::new(
                "a",
                json!({
                    "descricao": "Etapa de alimentação",
                    "quantidade_qs": 120, "quantidade_qr": 80,
                    "valor_qs": "1200.00", "valor_qr": "960.00", "valor_total": "2160.00"
                }),
            )],
        );
        assert_eq!(items.len(), 2);
        assert_eq!(
            items["classe_i_registros::Etapa de alimentação (QS)"].value,
            dec!(1200.00)
        );
        assert_eq!(
            items["classe_i_registros::Etapa de alimentação (QR)"].value,
            dec!(960.00)
        );
    }

    #[test]
    fn test_subsistence_single_ration_uses_total() {
        let items = run(
            "classe_i_registros",
            vec![RawRecord::new(
                "a",
                json!({
                    "descricao": "Etapa",
                    "quantidade_qs": 0, "quantidade_qr": 40,
                    "valor_qr": "400", "valor_total": "400"
                }),
            )],
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items["classe_i_registros::Etapa (QR)"].value, dec!(400));
    }

    #[test]
    fn test_verba_operacional_combines_values() {
        let items = run(
            "verba_operacional_registros",
            vec![RawRecord::new(
                "a",
                json!({ "finalidade": "Apoio logístico", "valor_verba": "1000", "valor_suprimento": "500" }),
            )],
        );
        assert_eq!(
            items["verba_operacional_registros::Apoio logístico"].value,
            dec!(1500)
        );
    }

    #[test]
    fn test_permanent_material_expands_nested_items() {
        let items = run(
            "material_permanente_registros",
            vec![RawRecord::new(
                "p1",
                json!({
                    "organizacao": "2º BEC",
                    "itens": [
                        { "descricao": "Notebook", "quantidade": 2, "valor_unitario": "4500.00", "subitem": "35" },
                        { "descricao": "Impressora", "quantidade": 1, "valor_unitario": "1800.00", "subitem": "35" },
                        { "descricao": "Sem valor", "quantidade": 1, "valor_unitario": 0 }
                    ]
                }),
            )],
        );
        assert_eq!(items.len(), 2);
        let notebook = &items["material_permanente_registros#p1/1"];
        assert_eq!(notebook.description, "Notebook");
        assert_eq!(notebook.value, dec!(9000.00));
        assert_eq!(notebook.subitem.as_deref(), Some("35"));
        assert_eq!(notebook.gnd, Gnd::Investimento);
        assert_eq!(notebook.organization_unit, "2º BEC");
    }

    #[test]
    fn test_malformed_nested_item_is_error() {
        let c = catalog();
        let def = c.table("material_permanente_registros").unwrap();
        let mut items = ItemMap::new();
        let records = vec![RawRecord::new("p1", json!({ "itens": ["Notebook"] }))];
        assert!(aggregate_table(def, &records, &mut items).is_err());
    }

    #[test]
    fn test_nested_item_overflow_is_error() {
        let c = catalog();
        let def = c.table("material_permanente_registros").unwrap();
        let mut items = ItemMap::new();
        let records = vec![RawRecord::new(
            "p1",
            json!({ "itens": [{ "descricao": "Notebook", "quantidade": "1e20", "valor_unitario": "1e20" }] }),
        )];
        let err = aggregate_table(def, &records, &mut items).unwrap_err();
        assert!(matches!(err, PtrabError::Validation(_)));
        assert!(items.is_empty());
    }

    #[test]
    fn test_merge_overflow_is_error() {
        let c = catalog();
        let def = c.table("classe_ix_registros").unwrap();
        let mut items = ItemMap::new();
        let records = vec![
            RawRecord::new("a", json!({ "descricao": "Pneus", "valor_nd_30": "70000000000000000000000000000" })),
            RawRecord::new("b", json!({ "descricao": "Pneus", "valor_nd_30": "70000000000000000000000000000" })),
        ];
        let err = aggregate_table(def, &records, &mut items).unwrap_err();
        assert!(matches!(err, PtrabError::Validation(_)));
    }

    #[test]
    fn test_combined_value_overflow_is_error() {
        let c = catalog();
        let def = c.table("verba_operacional_registros").unwrap();
        let mut items = ItemMap::new();
        let records = vec![RawRecord::new(
            "a",
            json!({
                "finalidade": "Apoio",
                "valor_verba": "70000000000000000000000000000",
                "valor_suprimento": "70000000000000000000000000000"
            }),
        )];
        assert!(aggregate_table(def, &records, &mut items).is_err());
    }

    #[test]
    fn test_missing_description_falls_back_to_label() {
        let items = run(
            "classe_ix_registros",
            vec![RawRecord::new("a", json!({ "valor_nd_30": 10 }))],
        );
        let item = items.values().next().unwrap();
        assert_eq!(item.description, "Classe IX - Manutenção de Viaturas (Material)");
    }
}
