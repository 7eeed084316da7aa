pub mod aggregate;
pub mod allocation;
pub mod catalog;
pub mod dor;
pub mod error;
pub mod fuel;
pub mod model;
pub mod numbers;
pub mod source;

use aggregate::{ItemMap, TableBatch};
use catalog::schema::TableCatalog;
use dor::{DorBoard, DorGroup};
use error::PtrabError;
use source::{PersistenceSink, RecordSource};
use tracing::{info, warn};

/// Main API entry point: fetch every table of a plan and aggregate its line items.
///
/// A failed fetch aborts the whole load; nothing is retried.
pub fn load_line_items(
    source: &dyn RecordSource,
    tables: &TableCatalog,
    ptrab_id: &str,
) -> Result<ItemMap, PtrabError> {
    if ptrab_id.trim().is_empty() {
        return Err(PtrabError::Validation("plan id must not be blank".into()));
    }

    let mut batches = Vec::with_capacity(tables.tables.len());
    for table in &tables.tables {
        let records = source
            .fetch_records(table, ptrab_id)
            .map_err(|e| match e {
                PtrabError::ItemsLoad { .. } => e,
                other => PtrabError::ItemsLoad {
                    table: table.table.clone(),
                    reason: other.to_string(),
                },
            })?;
        batches.push(TableBatch { table, records });
    }

    let items = aggregate::aggregate(&batches)?;
    info!(
        ptrab_id,
        tables = batches.len(),
        items = items.len(),
        "line items aggregated"
    );
    Ok(items)
}

/// Save the board's non-empty groups for a plan in one call to the sink.
///
/// Returns the number of groups saved.
pub fn save_groups(
    sink: &mut dyn PersistenceSink,
    board: &DorBoard,
    ptrab_id: &str,
) -> Result<usize, PtrabError> {
    if ptrab_id.trim().is_empty() {
        return Err(PtrabError::Validation("plan id must not be blank".into()));
    }

    let (groups, empty): (Vec<DorGroup>, Vec<DorGroup>) =
        board.groups().into_iter().partition(|g| !g.items.is_empty());
    for g in &empty {
        warn!(group = %g.name, "skipping empty group");
    }
    if groups.is_empty() {
        return Err(PtrabError::Validation(
            "there are no groups with items to save".into(),
        ));
    }

    sink.save_line_items(&groups, ptrab_id).map_err(|e| match e {
        PtrabError::Save(_) => e,
        other => PtrabError::Save(other.to_string()),
    })?;
    info!(ptrab_id, groups = groups.len(), "groups saved");
    Ok(groups.len())
}
