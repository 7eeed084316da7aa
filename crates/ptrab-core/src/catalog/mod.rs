pub mod builtin;
pub mod schema;

use crate::error::PtrabError;
use crate::model::FuelType;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schema::{
    EquipmentCatalog, EquipmentDirective, FuelPriceEntry, PriceCatalog, PriceScope,
    SpecialHandling, TableCatalog,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Tables,
    Equipment,
    Prices,
}

impl FromStr for CatalogKind {
    type Err = PtrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tables" | "tabelas" => Ok(CatalogKind::Tables),
            "equipment" | "equipamentos" => Ok(CatalogKind::Equipment),
            "prices" | "precos" | "preços" => Ok(CatalogKind::Prices),
            other => Err(PtrabError::CatalogInvalid(format!(
                "unknown catalog kind '{}'. Available: tables, equipment, prices",
                other
            ))),
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Tables => write!(f, "tables"),
            CatalogKind::Equipment => write!(f, "equipment"),
            CatalogKind::Prices => write!(f, "prices"),
        }
    }
}

/// A catalog of any kind, for commands that handle them generically.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Catalog {
    Tables(TableCatalog),
    Equipment(EquipmentCatalog),
    Prices(PriceCatalog),
}

impl Catalog {
    pub fn kind(&self) -> CatalogKind {
        match self {
            Catalog::Tables(_) => CatalogKind::Tables,
            Catalog::Equipment(_) => CatalogKind::Equipment,
            Catalog::Prices(_) => CatalogKind::Prices,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Catalog::Tables(c) => &c.name,
            Catalog::Equipment(c) => &c.name,
            Catalog::Prices(c) => &c.name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Catalog::Tables(c) => &c.version,
            Catalog::Equipment(c) => &c.version,
            Catalog::Prices(c) => &c.version,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Catalog::Tables(c) => c.description.as_deref(),
            Catalog::Equipment(c) => c.description.as_deref(),
            Catalog::Prices(c) => c.description.as_deref(),
        }
    }

    pub fn validate(&self) -> Result<(), PtrabError> {
        match self {
            Catalog::Tables(c) => validate_tables(c),
            Catalog::Equipment(c) => validate_equipment(c),
            Catalog::Prices(c) => validate_prices(c),
        }
    }
}

/// Load and validate a catalog of the given kind from a JSON file.
pub fn load_catalog(kind: CatalogKind, path: &Path) -> Result<Catalog, PtrabError> {
    Ok(match kind {
        CatalogKind::Tables => Catalog::Tables(load_tables(path)?),
        CatalogKind::Equipment => Catalog::Equipment(load_equipment(path)?),
        CatalogKind::Prices => Catalog::Prices(load_prices(path)?),
    })
}

fn load_file<T: DeserializeOwned>(
    path: &Path,
    validate: fn(&T) -> Result<(), PtrabError>,
) -> Result<T, PtrabError> {
    let content = std::fs::read_to_string(path).map_err(|e| PtrabError::CatalogLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let catalog: T = serde_json::from_str(&content).map_err(|e| PtrabError::CatalogLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate(&catalog)?;
    Ok(catalog)
}

pub fn load_tables(path: &Path) -> Result<TableCatalog, PtrabError> {
    load_file(path, validate_tables)
}

pub fn load_equipment(path: &Path) -> Result<EquipmentCatalog, PtrabError> {
    load_file(path, validate_equipment)
}

pub fn load_prices(path: &Path) -> Result<PriceCatalog, PtrabError> {
    load_file(path, validate_prices)
}

pub fn parse_tables_str(json: &str) -> Result<TableCatalog, PtrabError> {
    let catalog: TableCatalog = serde_json::from_str(json)?;
    validate_tables(&catalog)?;
    Ok(catalog)
}

pub fn parse_equipment_str(json: &str) -> Result<EquipmentCatalog, PtrabError> {
    let catalog: EquipmentCatalog = serde_json::from_str(json)?;
    validate_equipment(&catalog)?;
    Ok(catalog)
}

pub fn parse_prices_str(json: &str) -> Result<PriceCatalog, PtrabError> {
    let catalog: PriceCatalog = serde_json::from_str(json)?;
    validate_prices(&catalog)?;
    Ok(catalog)
}

fn require_field(owner: &str, what: &str, value: &str) -> Result<(), PtrabError> {
    if value.trim().is_empty() {
        return Err(PtrabError::CatalogInvalid(format!(
            "{} has an empty {}",
            owner, what
        )));
    }
    Ok(())
}

/// Validate that a table catalog is well-formed.
pub fn validate_tables(catalog: &TableCatalog) -> Result<(), PtrabError> {
    if catalog.tables.is_empty() {
        return Err(PtrabError::CatalogInvalid("tables must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for def in &catalog.tables {
        if def.table.trim().is_empty() {
            return Err(PtrabError::CatalogInvalid(
                "table name must not be empty".into(),
            ));
        }
        if !seen.insert(def.table.as_str()) {
            return Err(PtrabError::CatalogInvalid(format!(
                "table '{}' is listed twice",
                def.table
            )));
        }
        let owner = format!("table '{}'", def.table);
        require_field(&owner, "label", &def.label)?;
        require_field(&owner, "value_field", &def.value_field)?;
        require_field(&owner, "org_unit_field", &def.org_unit_field)?;
        if let Some(ref field) = def.description_field {
            require_field(&owner, "description_field", field)?;
        }
        if let Some(ref m) = def.distinct_when {
            require_field(&owner, "distinct_when.field", &m.field)?;
            require_field(&owner, "distinct_when.equals", &m.equals)?;
        }

        match &def.special {
            Some(SpecialHandling::Subsistence {
                qs_quantity_field,
                qr_quantity_field,
                qs_value_field,
                qr_value_field,
            }) => {
                if def.gnd != crate::model::Gnd::Custeio {
                    return Err(PtrabError::CatalogInvalid(format!(
                        "table '{}': subsistence records must be GND 3",
                        def.table
                    )));
                }
                for f in [
                    qs_quantity_field,
                    qr_quantity_field,
                    qs_value_field,
                    qr_value_field,
                ] {
                    require_field(&owner, "subsistence field", f)?;
                }
            }
            Some(SpecialHandling::CombinedValue { extra_value_field }) => {
                require_field(&owner, "extra_value_field", extra_value_field)?;
            }
            Some(SpecialHandling::NestedItems {
                items_field,
                description_field,
                quantity_field,
                unit_value_field,
                subitem_field,
            }) => {
                for f in [items_field, description_field, quantity_field, unit_value_field] {
                    require_field(&owner, "nested item field", f)?;
                }
                if let Some(f) = subitem_field {
                    require_field(&owner, "subitem_field", f)?;
                }
            }
            None => {}
        }
    }

    Ok(())
}

/// Validate that an equipment catalog is well-formed.
pub fn validate_equipment(catalog: &EquipmentCatalog) -> Result<(), PtrabError> {
    if catalog.equipment.is_empty() {
        return Err(PtrabError::CatalogInvalid(
            "equipment must not be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for eq in &catalog.equipment {
        if eq.name.trim().is_empty() {
            return Err(PtrabError::CatalogInvalid(
                "equipment name must not be empty".into(),
            ));
        }
        if !seen.insert(normalize_name(&eq.name)) {
            return Err(PtrabError::CatalogInvalid(format!(
                "equipment '{}' is listed twice",
                eq.name
            )));
        }
        if eq.rate <= Decimal::ZERO {
            return Err(PtrabError::CatalogInvalid(format!(
                "equipment '{}' has a non-positive rate {}",
                eq.name, eq.rate
            )));
        }
        if eq.unit != eq.class.expected_unit() {
            return Err(PtrabError::CatalogInvalid(format!(
                "equipment '{}' uses {} but its class requires {}",
                eq.name,
                eq.unit,
                eq.class.expected_unit()
            )));
        }
    }

    Ok(())
}

/// Validate that a price catalog is well-formed.
pub fn validate_prices(catalog: &PriceCatalog) -> Result<(), PtrabError> {
    if catalog.prices.is_empty() {
        return Err(PtrabError::CatalogInvalid("prices must not be empty".into()));
    }

    for entry in &catalog.prices {
        if entry.price <= Decimal::ZERO {
            return Err(PtrabError::CatalogInvalid(format!(
                "{} price must be positive, got {}",
                entry.fuel_type, entry.price
            )));
        }
        if entry.valid_from > entry.valid_to {
            return Err(PtrabError::CatalogInvalid(format!(
                "{} price valid from {} is after valid to {}",
                entry.fuel_type, entry.valid_from, entry.valid_to
            )));
        }
        if let PriceScope::Local(ref locality) = entry.scope {
            if locality.trim().is_empty() {
                return Err(PtrabError::CatalogInvalid(format!(
                    "{} local price has no locality",
                    entry.fuel_type
                )));
            }
        }
        require_field("price entry", "source", &entry.source)?;
    }

    Ok(())
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl TableCatalog {
    pub fn table(&self, name: &str) -> Option<&schema::SourceTableDef> {
        self.tables.iter().find(|t| t.table == name)
    }
}

impl EquipmentCatalog {
    /// Consumption directive for an equipment, ignoring case and extra spaces.
    pub fn consumption_rate(&self, equipment_name: &str) -> Option<&EquipmentDirective> {
        let wanted = normalize_name(equipment_name);
        self.equipment
            .iter()
            .find(|e| normalize_name(&e.name) == wanted)
    }
}

impl PriceCatalog {
    /// Price entry for `fuel` in `scope` whose validity covers `from..=to`.
    ///
    /// When several entries qualify the one that started most recently wins.
    pub fn lookup(
        &self,
        fuel: FuelType,
        from: NaiveDate,
        to: NaiveDate,
        scope: &PriceScope,
    ) -> Option<&FuelPriceEntry> {
        self.prices
            .iter()
            .filter(|p| p.fuel_type == fuel && p.scope.matches(scope))
            .filter(|p| p.valid_from <= from && to <= p.valid_to)
            .max_by_key(|p| p.valid_from)
    }
}
