use ptrab_core::dor::{BoardOptions, DorBoard, DorGroup, GroupPlan};
use ptrab_core::error::PtrabError;
use ptrab_core::model::LineItem;
use ptrab_core::source::{JsonFileSink, SnapshotSource};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::output;

pub struct DorArgs {
    pub snapshot: PathBuf,
    pub ptrab: String,
    pub plan: PathBuf,
    pub catalog: Option<PathBuf>,
    pub single_subitem: bool,
    pub save: Option<PathBuf>,
    pub output: String,
}

#[derive(Serialize)]
struct DorReport<'a> {
    groups: Vec<DorGroup>,
    available: Vec<&'a LineItem>,
}

pub fn run(args: DorArgs) -> Result<(), PtrabError> {
    let tables = super::table_catalog(args.catalog.as_deref())?;
    let source = SnapshotSource::from_file(&args.snapshot)?;
    let items = ptrab_core::load_line_items(&source, &tables, &args.ptrab)?;

    let plan_bytes = std::fs::read(&args.plan)?;
    let plan: Vec<GroupPlan> = serde_json::from_slice(&plan_bytes)?;
    debug!(path = %args.plan.display(), groups = plan.len(), "grouping plan loaded");

    let options = BoardOptions {
        single_subitem_per_group: args.single_subitem,
    };
    let mut board = DorBoard::with_options(items, options);
    board.apply_plan(&plan)?;

    if let Some(path) = args.save {
        let mut sink = JsonFileSink::new(&path);
        let saved = ptrab_core::save_groups(&mut sink, &board, &args.ptrab)?;
        eprintln!("Saved {} group(s) to {}", saved, path.display());
    }

    let report = DorReport {
        groups: board.groups(),
        available: board.available(),
    };
    match args.output.as_str() {
        "json" => output::json::print(&report)?,
        _ => output::table::print_groups(&report.groups, &report.available),
    }
    Ok(())
}
