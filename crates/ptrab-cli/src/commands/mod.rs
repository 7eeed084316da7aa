pub mod catalog;
pub mod dor;
pub mod fuel;
pub mod items;
pub mod split;

use ptrab_core::catalog::schema::TableCatalog;
use ptrab_core::catalog::{self as core_catalog, builtin};
use ptrab_core::error::PtrabError;
use std::path::Path;

/// The table catalog from `path`, or the built-in one.
fn table_catalog(path: Option<&Path>) -> Result<TableCatalog, PtrabError> {
    match path {
        Some(p) => core_catalog::load_tables(p),
        None => builtin::tables(),
    }
}
