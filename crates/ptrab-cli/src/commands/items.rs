use ptrab_core::aggregate::{category_totals, summarize, CategoryTotal, ItemMap, NatureSummary};
use ptrab_core::error::PtrabError;
use ptrab_core::model::LineItem;
use ptrab_core::source::SnapshotSource;
use serde::Serialize;
use std::path::Path;

use crate::output;

#[derive(Serialize)]
struct ItemsReport<'a> {
    ptrab_id: &'a str,
    items: Vec<&'a LineItem>,
    summary: Vec<NatureSummary>,
    category_totals: Vec<CategoryTotal>,
}

pub fn run(
    snapshot: &Path,
    ptrab_id: &str,
    catalog: Option<&Path>,
    output_format: &str,
) -> Result<(), PtrabError> {
    let tables = super::table_catalog(catalog)?;
    let source = SnapshotSource::from_file(snapshot)?;
    let items: ItemMap = ptrab_core::load_line_items(&source, &tables, ptrab_id)?;

    let report = ItemsReport {
        ptrab_id,
        items: items.values().collect(),
        summary: summarize(&items),
        category_totals: category_totals(&items),
    };

    match output_format {
        "json" => output::json::print(&report)?,
        _ => {
            output::table::print_items(&report.items);
            println!();
            output::table::print_summary(&report.summary);
        }
    }
    Ok(())
}
