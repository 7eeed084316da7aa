use crate::model::{FuelType, Gnd, NatureCode};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Describes the record tables of a plan and how each one becomes line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCatalog {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub tables: Vec<SourceTableDef>,
}

/// One record table and the fields the aggregator reads from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTableDef {
    /// Table name in the record store.
    pub table: String,
    /// Human-readable category name, also the fallback description.
    pub label: String,
    pub gnd: Gnd,
    pub nature: NatureCode,
    /// Field holding the value for `nature`.
    pub value_field: String,
    #[serde(default)]
    pub description_field: Option<String>,
    #[serde(default = "default_org_unit_field")]
    pub org_unit_field: String,
    /// Records matching this are never merged with others ("OUTROS").
    #[serde(default)]
    pub distinct_when: Option<FieldMatch>,
    #[serde(default)]
    pub special: Option<SpecialHandling>,
}

fn default_org_unit_field() -> String {
    "organizacao".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    /// Compared case-insensitively after trimming.
    pub equals: String,
}

/// Tables whose records do not map one-to-one onto line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialHandling {
    /// Subsistence: a record with both QS and QR quantities yields two items.
    Subsistence {
        qs_quantity_field: String,
        qr_quantity_field: String,
        qs_value_field: String,
        qr_value_field: String,
    },
    /// Verba operacional: `value_field + extra_value_field` is the record value.
    CombinedValue { extra_value_field: String },
    /// Permanent material: each entry of a nested list is its own item.
    NestedItems {
        items_field: String,
        description_field: String,
        quantity_field: String,
        unit_value_field: String,
        #[serde(default)]
        subitem_field: Option<String>,
    },
}

/// Equipment consumption directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentCatalog {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub equipment: Vec<EquipmentDirective>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentDirective {
    pub name: String,
    pub class: EquipmentClass,
    pub rate: Decimal,
    pub unit: RateUnit,
    pub fuel_type: FuelType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentClass {
    /// Generators, engineering machines: consumption per hour.
    Stationary,
    /// Vehicles and motorized equipment: distance per liter.
    Vehicle,
}

impl EquipmentClass {
    pub fn expected_unit(self) -> RateUnit {
        match self {
            EquipmentClass::Stationary => RateUnit::LitersPerHour,
            EquipmentClass::Vehicle => RateUnit::KmPerLiter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateUnit {
    #[serde(rename = "L/h")]
    LitersPerHour,
    #[serde(rename = "km/L")]
    KmPerLiter,
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateUnit::LitersPerHour => write!(f, "L/h"),
            RateUnit::KmPerLiter => write!(f, "km/L"),
        }
    }
}

/// Fuel price references with validity windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCatalog {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub prices: Vec<FuelPriceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelPriceEntry {
    pub fuel_type: FuelType,
    pub price: Decimal,
    pub scope: PriceScope,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    /// Where the price comes from (e.g. "ANP").
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceScope {
    Nacional,
    Local(String),
}

impl PriceScope {
    pub fn matches(&self, other: &PriceScope) -> bool {
        match (self, other) {
            (PriceScope::Nacional, PriceScope::Nacional) => true,
            (PriceScope::Local(a), PriceScope::Local(b)) => {
                a.trim().to_lowercase() == b.trim().to_lowercase()
            }
            _ => false,
        }
    }
}

impl fmt::Display for PriceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceScope::Nacional => write!(f, "âmbito nacional"),
            PriceScope::Local(locality) => write!(f, "âmbito local: {locality}"),
        }
    }
}
