use crate::error::PtrabError;
use crate::numbers::parse_decimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Budget expenditure group (GND).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gnd {
    /// GND 3, costing/expense.
    Custeio,
    /// GND 4, investment.
    Investimento,
}

impl Gnd {
    pub fn number(self) -> u8 {
        match self {
            Gnd::Custeio => 3,
            Gnd::Investimento => 4,
        }
    }
}

impl TryFrom<u8> for Gnd {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            3 => Ok(Gnd::Custeio),
            4 => Ok(Gnd::Investimento),
            other => Err(format!("invalid GND {other} (expected 3 or 4)")),
        }
    }
}

impl From<Gnd> for u8 {
    fn from(g: Gnd) -> u8 {
        g.number()
    }
}

impl fmt::Display for Gnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GND {}", self.number())
    }
}

/// Expenditure nature code (ND).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NatureCode {
    #[serde(rename = "30")]
    Nd30,
    #[serde(rename = "39")]
    Nd39,
    #[serde(rename = "52")]
    Nd52,
}

impl NatureCode {
    pub fn label(self) -> &'static str {
        match self {
            NatureCode::Nd30 => "Material de Consumo",
            NatureCode::Nd39 => "Outros Serviços de Terceiros - PJ",
            NatureCode::Nd52 => "Equipamentos e Material Permanente",
        }
    }
}

impl fmt::Display for NatureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NatureCode::Nd30 => write!(f, "ND 30"),
            NatureCode::Nd39 => write!(f, "ND 39"),
            NatureCode::Nd52 => write!(f, "ND 52"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FuelType {
    Gasolina,
    Diesel,
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelType::Gasolina => write!(f, "GASOLINA"),
            FuelType::Diesel => write!(f, "DIESEL"),
        }
    }
}

/// A row fetched from one of the plan's record tables.
///
/// Only `id` is fixed; every other column is kept as raw JSON and read
/// through the field accessors, since each table has its own shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, fields: Value) -> RawRecord {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        RawRecord {
            id: id.into(),
            fields,
        }
    }

    /// Trimmed text value of a field. Numbers are rendered as text; blanks are `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        value_to_text(self.fields.get(field)?)
    }

    /// Decimal value of a field, accepting JSON numbers or Brazilian-formatted strings.
    pub fn decimal(&self, field: &str) -> Result<Option<Decimal>, PtrabError> {
        match self.fields.get(field) {
            Some(v) => value_to_decimal(v, field),
            None => Ok(None),
        }
    }

    /// Like [`RawRecord::decimal`], with missing values read as zero.
    pub fn decimal_or_zero(&self, field: &str) -> Result<Decimal, PtrabError> {
        Ok(self.decimal(field)?.unwrap_or(Decimal::ZERO))
    }

    pub fn array(&self, field: &str) -> Option<&Vec<Value>> {
        self.fields.get(field)?.as_array()
    }
}

pub(crate) fn value_to_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn value_to_decimal(v: &Value, field: &str) -> Result<Option<Decimal>, PtrabError> {
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => parse_decimal(&n.to_string()).map(Some),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_decimal(s).map(Some),
        other => Err(PtrabError::Validation(format!(
            "field '{}' is not numeric: {}",
            field, other
        ))),
    }
}

/// A consolidated budget line, built from one or more raw records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Aggregation key; unique within one aggregation run.
    pub id: String,
    pub description: String,
    pub value: Decimal,
    pub gnd: Gnd,
    pub nature: NatureCode,
    pub source_table: String,
    pub organization_unit: String,
    /// Sub-budget-item code, when the source carries one (acquisitions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subitem: Option<String>,
    pub source_records: Vec<RawRecord>,
}
