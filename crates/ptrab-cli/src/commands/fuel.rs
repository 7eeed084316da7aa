use chrono::NaiveDate;
use ptrab_core::catalog::schema::PriceScope;
use ptrab_core::catalog::{self as core_catalog, builtin};
use ptrab_core::error::PtrabError;
use ptrab_core::fuel::{consolidate, ConsumptionItem, ConsumptionRequest, PriceRequest};
use std::path::PathBuf;
use tracing::debug;

use crate::output;

pub struct FuelArgs {
    pub input_file: PathBuf,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub local: Option<String>,
    pub prices: Option<PathBuf>,
    pub equipment: Option<PathBuf>,
    pub output: String,
}

pub fn run(args: FuelArgs) -> Result<(), PtrabError> {
    if args.from > args.to {
        return Err(PtrabError::Validation(format!(
            "period start {} is after its end {}",
            args.from, args.to
        )));
    }

    let equipment = match args.equipment {
        Some(ref p) => core_catalog::load_equipment(p)?,
        None => builtin::equipment()?,
    };
    let prices = match args.prices {
        Some(ref p) => core_catalog::load_prices(p)?,
        None => builtin::prices()?,
    };

    let bytes = std::fs::read(&args.input_file)?;
    let requests: Vec<ConsumptionRequest> = serde_json::from_slice(&bytes)?;
    let items = requests
        .iter()
        .map(|r| r.resolve(&equipment))
        .collect::<Result<Vec<ConsumptionItem>, _>>()?;
    debug!(items = items.len(), scope = ?args.local, "consumption requests resolved");

    let request = PriceRequest {
        from: args.from,
        to: args.to,
        scope: match args.local {
            Some(locality) => PriceScope::Local(locality),
            None => PriceScope::Nacional,
        },
    };
    let result = consolidate(&items, &prices, &request)?;

    match args.output.as_str() {
        "json" => output::json::print(&result)?,
        _ => output::table::print_fuel(&result),
    }
    Ok(())
}
