//! Classe III fuel consumption: per-item formulas, consolidation by fuel
//! type with the fixed operational margin, costing against a price
//! reference and the calculation memo printed on the plan.

pub mod formula;
pub mod memo;

use crate::catalog::schema::{EquipmentCatalog, EquipmentClass, PriceScope};
use crate::error::PtrabError;
use crate::model::FuelType;
use crate::numbers::round_money;
use crate::source::PriceReference;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub use formula::liters_for;

/// Fixed 30% operational safety margin.
pub const FUEL_MARGIN: Decimal = Decimal::from_parts(13, 0, 0, false, 1); // 1.3

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Usage {
    Stationary {
        hours_per_day: Decimal,
        consumption_l_per_hour: Decimal,
        operation_days: Decimal,
    },
    Vehicle {
        distance_km: Decimal,
        trips: Decimal,
        consumption_km_per_liter: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionItem {
    pub equipment_type: String,
    pub quantity: Decimal,
    pub fuel_type: FuelType,
    pub usage: Usage,
}

/// A consumption line as entered on the form, naming catalog equipment.
///
/// Stationary equipment needs `hours_per_day` and `operation_days`;
/// vehicles need `distance_km` and `trips`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionRequest {
    pub equipment: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub hours_per_day: Option<Decimal>,
    #[serde(default)]
    pub operation_days: Option<Decimal>,
    #[serde(default)]
    pub distance_km: Option<Decimal>,
    #[serde(default)]
    pub trips: Option<Decimal>,
}

impl ConsumptionRequest {
    /// Look the equipment up in the directive catalog and build the item.
    pub fn resolve(&self, catalog: &EquipmentCatalog) -> Result<ConsumptionItem, PtrabError> {
        let directive = catalog
            .consumption_rate(&self.equipment)
            .ok_or_else(|| PtrabError::UnknownEquipment(self.equipment.clone()))?;

        let missing = |field: &str| {
            PtrabError::Validation(format!("{}: {} is required", directive.name, field))
        };

        let usage = match directive.class {
            EquipmentClass::Stationary => Usage::Stationary {
                hours_per_day: self.hours_per_day.ok_or_else(|| missing("hours_per_day"))?,
                consumption_l_per_hour: directive.rate,
                operation_days: self.operation_days.ok_or_else(|| missing("operation_days"))?,
            },
            EquipmentClass::Vehicle => Usage::Vehicle {
                distance_km: self.distance_km.ok_or_else(|| missing("distance_km"))?,
                trips: self.trips.ok_or_else(|| missing("trips"))?,
                consumption_km_per_liter: directive.rate,
            },
        };

        Ok(ConsumptionItem {
            equipment_type: directive.name.clone(),
            quantity: self.quantity,
            fuel_type: directive.fuel_type,
            usage,
        })
    }
}

/// Which price to use: the plan period and national or local scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub scope: PriceScope,
}

/// A price found by a [`PriceReference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub fuel_type: FuelType,
    pub price: Decimal,
    pub scope: PriceScope,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemConsumption {
    pub item: ConsumptionItem,
    pub liters: Decimal,
}

/// Liters of one fuel type, before costing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelTotals {
    pub fuel_type: FuelType,
    pub items: Vec<ItemConsumption>,
    pub total_liters_raw: Decimal,
    pub total_liters_with_margin: Decimal,
}

/// Costed consumption of one fuel type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelConsolidation {
    #[serde(flatten)]
    pub totals: FuelTotals,
    pub price: PriceQuote,
    pub total_cost: Decimal,
    pub memo: String,
}

/// Sum liters per fuel type and apply the operational margin.
///
/// The margin is applied to the raw total rounded to centiliters, the
/// figure printed on the memo.
pub fn total_liters(items: &[ConsumptionItem]) -> Result<Vec<FuelTotals>, PtrabError> {
    if items.is_empty() {
        return Err(PtrabError::Validation(
            "at least one consumption item is required".into(),
        ));
    }

    let mut by_fuel: BTreeMap<FuelType, Vec<ItemConsumption>> = BTreeMap::new();
    for item in items {
        let liters = liters_for(item)?;
        debug!(equipment = %item.equipment_type, fuel = %item.fuel_type, %liters, "item consumption");
        by_fuel.entry(item.fuel_type).or_default().push(ItemConsumption {
            item: item.clone(),
            liters,
        });
    }

    by_fuel
        .into_iter()
        .map(|(fuel_type, items)| {
            let overflow = || PtrabError::overflow(format!("{} consumption", fuel_type));
            let total_liters_raw = items
                .iter()
                .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.liters))
                .ok_or_else(overflow)?;
            let total_liters_with_margin = round_money(total_liters_raw, 2)
                .checked_mul(FUEL_MARGIN)
                .ok_or_else(overflow)?;
            Ok(FuelTotals {
                fuel_type,
                items,
                total_liters_raw,
                total_liters_with_margin,
            })
        })
        .collect()
}

/// Cost one fuel's totals. Fails when no price reference applies.
pub fn price_totals(
    totals: FuelTotals,
    prices: &dyn PriceReference,
    request: &PriceRequest,
) -> Result<FuelConsolidation, PtrabError> {
    let price = prices
        .fuel_price(totals.fuel_type, request)
        .ok_or_else(|| PtrabError::MissingFuelPrice {
            fuel: totals.fuel_type,
            scope: request.scope.to_string(),
        })?;
    if price.price <= Decimal::ZERO {
        return Err(PtrabError::MissingFuelPrice {
            fuel: totals.fuel_type,
            scope: request.scope.to_string(),
        });
    }

    let billed_liters = round_money(totals.total_liters_with_margin, 2);
    let total_cost = billed_liters
        .checked_mul(price.price)
        .map(|cost| round_money(cost, 2))
        .ok_or_else(|| PtrabError::overflow(format!("{} cost", totals.fuel_type)))?;
    let memo = memo::render(&totals, &price, total_cost);

    info!(
        fuel = %totals.fuel_type,
        liters = %billed_liters,
        cost = %total_cost,
        "fuel consolidated"
    );

    Ok(FuelConsolidation {
        totals,
        price,
        total_cost,
        memo,
    })
}

/// Consolidate consumption items per fuel type and cost them.
pub fn consolidate(
    items: &[ConsumptionItem],
    prices: &dyn PriceReference,
    request: &PriceRequest,
) -> Result<Vec<FuelConsolidation>, PtrabError> {
    total_liters(items)?
        .into_iter()
        .map(|t| price_totals(t, prices, request))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;
    use crate::catalog::schema::PriceCatalog;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn july() -> PriceRequest {
        PriceRequest {
            from: date(2026, 7, 1),
            to: date(2026, 7, 31),
            scope: PriceScope::Nacional,
        }
    }

    fn items() -> Vec<ConsumptionItem> {
        let catalog = builtin::equipment().unwrap();
        vec![
            ConsumptionRequest {
                equipment: "Gerador 15 KVA".into(),
                quantity: dec!(2),
                hours_per_day: Some(dec!(8)),
                operation_days: Some(dec!(10)),
                distance_km: None,
                trips: None,
            }
            .resolve(&catalog)
            .unwrap(),
            ConsumptionRequest {
                equipment: "viatura 5 t".into(),
                quantity: dec!(3),
                hours_per_day: None,
                operation_days: None,
                distance_km: Some(dec!(150)),
                trips: Some(dec!(5)),
            }
            .resolve(&catalog)
            .unwrap(),
        ]
    }

    #[test]
    fn test_stationary_margin() {
        let totals = total_liters(&items()[..1]).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total_liters_raw, dec!(640));
        assert_eq!(totals[0].total_liters_with_margin, dec!(832));
    }

    #[test]
    fn test_vehicle_margin() {
        let totals = total_liters(&items()[1..]).unwrap();
        assert_eq!(round_money(totals[0].total_liters_raw, 2), dec!(321.43));
        assert_eq!(round_money(totals[0].total_liters_with_margin, 2), dec!(417.86));
    }

    #[test]
    fn test_consolidate_by_fuel_type() {
        let prices = builtin::prices().unwrap();
        let mut all = items();
        all.push(ConsumptionItem {
            equipment_type: "Motosserra".into(),
            quantity: dec!(1),
            fuel_type: FuelType::Gasolina,
            usage: Usage::Stationary {
                hours_per_day: dec!(2),
                consumption_l_per_hour: dec!(1.2),
                operation_days: dec!(5),
            },
        });

        let result = consolidate(&all, &prices, &july()).unwrap();
        assert_eq!(result.len(), 2);

        let diesel = result
            .iter()
            .find(|c| c.totals.fuel_type == FuelType::Diesel)
            .unwrap();
        assert_eq!(diesel.totals.items.len(), 2);
        assert_eq!(diesel.price.price, dec!(6.15));
        // 961.43 L raw, 1249.86 L with margin, x 6.15
        assert_eq!(diesel.total_cost, dec!(7686.64));

        let gas = result
            .iter()
            .find(|c| c.totals.fuel_type == FuelType::Gasolina)
            .unwrap();
        assert_eq!(gas.totals.total_liters_with_margin, dec!(15.6));
        assert_eq!(gas.total_cost, dec!(99.68));
    }

    #[test]
    fn test_total_overflow_is_error() {
        let huge = ConsumptionItem {
            equipment_type: "Gerador 60 KVA".into(),
            quantity: dec!(50000000000000000000000000000),
            fuel_type: FuelType::Diesel,
            usage: Usage::Stationary {
                hours_per_day: dec!(1),
                consumption_l_per_hour: dec!(1),
                operation_days: dec!(1),
            },
        };
        let err = total_liters(&[huge.clone(), huge]).unwrap_err();
        assert!(matches!(err, PtrabError::Validation(_)));
    }

    #[test]
    fn test_margin_applies_to_rounded_total() {
        let item = ConsumptionItem {
            equipment_type: "Motosserra".into(),
            quantity: dec!(1),
            fuel_type: FuelType::Gasolina,
            usage: Usage::Stationary {
                hours_per_day: dec!(0.5),
                consumption_l_per_hour: dec!(0.25),
                operation_days: dec!(1),
            },
        };
        let totals = total_liters(&[item]).unwrap();
        assert_eq!(totals[0].total_liters_raw, dec!(0.125));
        assert_eq!(totals[0].total_liters_with_margin, dec!(0.169));
    }

    #[test]
    fn test_missing_price_blocks_costing() {
        let prices = PriceCatalog {
            name: "empty".into(),
            description: None,
            version: "1".into(),
            prices: vec![],
        };
        let err = consolidate(&items(), &prices, &july()).unwrap_err();
        assert!(matches!(err, PtrabError::MissingFuelPrice { .. }));
    }

    #[test]
    fn test_no_items_rejected() {
        let prices = builtin::prices().unwrap();
        assert!(matches!(
            consolidate(&[], &prices, &july()),
            Err(PtrabError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_equipment() {
        let catalog = builtin::equipment().unwrap();
        let req = ConsumptionRequest {
            equipment: "Helicóptero".into(),
            quantity: dec!(1),
            hours_per_day: None,
            operation_days: None,
            distance_km: None,
            trips: None,
        };
        assert!(matches!(
            req.resolve(&catalog),
            Err(PtrabError::UnknownEquipment(_))
        ));
    }

    #[test]
    fn test_missing_usage_field() {
        let catalog = builtin::equipment().unwrap();
        let req = ConsumptionRequest {
            equipment: "Gerador 15 KVA".into(),
            quantity: dec!(1),
            hours_per_day: Some(dec!(8)),
            operation_days: None,
            distance_km: None,
            trips: None,
        };
        let err = req.resolve(&catalog).unwrap_err();
        assert!(err.to_string().contains("operation_days"));
    }
}
