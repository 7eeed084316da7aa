use ptrab_core::allocation::{compute_split, CategoryAllocation, SplitResult};
use ptrab_core::error::PtrabError;
use ptrab_core::numbers::{format_brl, parse_decimal};
use serde::Serialize;

use crate::output;

#[derive(Serialize)]
struct SplitReport {
    split: SplitResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    allocation: Option<CategoryAllocation>,
}

pub fn run(
    total: &str,
    nd39: &str,
    destination: Option<&str>,
    ug: Option<&str>,
    output_format: &str,
) -> Result<(), PtrabError> {
    let split = compute_split(parse_decimal(total)?, parse_decimal(nd39)?);
    let allocation = match destination {
        Some(dest) => Some(CategoryAllocation::commit(&split, dest, ug)?),
        None => None,
    };

    let report = SplitReport { split, allocation };
    match output_format {
        "json" => output::json::print(&report)?,
        _ => {
            println!("  Total:  {}", format_brl(report.split.total));
            println!("  ND 30:  {}", format_brl(report.split.nd30));
            println!("  ND 39:  {}", format_brl(report.split.nd39));
            if !report.split.input_enabled {
                println!("  (total is zero, ND 39 input disabled)");
            }
            if let Some(ref a) = report.allocation {
                let ug = a
                    .destination_budget_unit
                    .as_deref()
                    .map(|u| format!(" (UG {u})"))
                    .unwrap_or_default();
                println!("\n  Saved for {}{}", a.destination_org_unit, ug);
            }
        }
    }
    Ok(())
}
