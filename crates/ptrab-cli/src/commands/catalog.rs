use ptrab_core::catalog::builtin;
use ptrab_core::catalog::{self as core_catalog, Catalog, CatalogKind};
use ptrab_core::error::PtrabError;
use ptrab_core::numbers::{format_br, format_brl, format_date_br};
use std::path::Path;

pub fn list() -> Result<(), PtrabError> {
    println!("Available predefined catalogs:\n");
    for name in builtin::PRESETS {
        let c = builtin::load_preset(name)?;
        println!("  {:<14} {} (v{}) [{}]", name, c.name(), c.version(), c.kind());
        if let Some(desc) = c.description() {
            println!("                 {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), PtrabError> {
    let catalog = builtin::load_preset(preset)?;
    println!("{} (version {})\n", catalog.name(), catalog.version());

    match catalog {
        Catalog::Tables(c) => {
            let width = c.tables.iter().map(|t| t.table.len()).max().unwrap_or(10);
            for t in &c.tables {
                let special = match t.special {
                    Some(ref s) => format!("  [{}]", special_name(s)),
                    None => String::new(),
                };
                println!(
                    "  {:<width$}  {}  {}  {}{}",
                    t.table,
                    t.gnd,
                    t.nature,
                    t.label,
                    special,
                    width = width
                );
            }
        }
        Catalog::Equipment(c) => {
            let width = c.equipment.iter().map(|e| e.name.len()).max().unwrap_or(10);
            for e in &c.equipment {
                println!(
                    "  {:<width$}  {:>6} {:<5} {}",
                    e.name,
                    format_br(e.rate, 1),
                    e.unit.to_string(),
                    e.fuel_type,
                    width = width
                );
            }
        }
        Catalog::Prices(c) => {
            for p in &c.prices {
                println!(
                    "  {:<9} {:>10}/L  {}  {} a {}  ({})",
                    p.fuel_type.to_string(),
                    format_brl(p.price),
                    p.scope,
                    format_date_br(p.valid_from),
                    format_date_br(p.valid_to),
                    p.source
                );
            }
        }
    }
    Ok(())
}

fn special_name(s: &ptrab_core::catalog::schema::SpecialHandling) -> &'static str {
    use ptrab_core::catalog::schema::SpecialHandling;
    match s {
        SpecialHandling::Subsistence { .. } => "QS/QR split",
        SpecialHandling::CombinedValue { .. } => "combined value",
        SpecialHandling::NestedItems { .. } => "nested items",
    }
}

pub fn validate(kind: &str, file: &Path) -> Result<(), PtrabError> {
    let kind: CatalogKind = kind.parse()?;
    let catalog = core_catalog::load_catalog(kind, file)?;
    let entries = match catalog {
        Catalog::Tables(ref c) => c.tables.len(),
        Catalog::Equipment(ref c) => c.equipment.len(),
        Catalog::Prices(ref c) => c.prices.len(),
    };
    println!(
        "Valid {} catalog: {} (v{}), {} entries",
        kind,
        catalog.name(),
        catalog.version(),
        entries
    );
    Ok(())
}
