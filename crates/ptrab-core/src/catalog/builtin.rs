use crate::catalog::schema::{EquipmentCatalog, PriceCatalog, TableCatalog};
use crate::catalog::{
    parse_equipment_str, parse_prices_str, parse_tables_str, Catalog, CatalogKind,
};
use crate::error::PtrabError;

const TABLES_JSON: &str = include_str!("../../../../catalogs/tabelas-registros.json");
const EQUIPMENT_JSON: &str = include_str!("../../../../catalogs/equipamentos.json");
const PRICES_JSON: &str = include_str!("../../../../catalogs/precos-combustivel.json");

/// Available predefined catalogs.
pub const PRESETS: &[&str] = &["tabelas", "equipamentos", "precos"];

pub fn tables() -> Result<TableCatalog, PtrabError> {
    parse_tables_str(TABLES_JSON)
}

pub fn equipment() -> Result<EquipmentCatalog, PtrabError> {
    parse_equipment_str(EQUIPMENT_JSON)
}

pub fn prices() -> Result<PriceCatalog, PtrabError> {
    parse_prices_str(PRICES_JSON)
}

/// Load a predefined catalog by preset name or kind name.
pub fn load_preset(name: &str) -> Result<Catalog, PtrabError> {
    let kind: CatalogKind = name.parse().map_err(|_| {
        PtrabError::CatalogInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))
    })?;
    Ok(match kind {
        CatalogKind::Tables => Catalog::Tables(tables()?),
        CatalogKind::Equipment => Catalog::Equipment(equipment()?),
        CatalogKind::Prices => Catalog::Prices(prices()?),
    })
}
