use super::{ConsumptionItem, Usage};
use crate::error::PtrabError;
use rust_decimal::Decimal;

fn require_positive(equipment: &str, what: &str, v: Decimal) -> Result<(), PtrabError> {
    if v <= Decimal::ZERO {
        return Err(PtrabError::Validation(format!(
            "{}: {} must be greater than zero",
            equipment, what
        )));
    }
    Ok(())
}

/// Liters consumed by one consumption item, before the operational margin.
///
/// - stationary: `quantity x hours/day x L/h x days`
/// - vehicle: `(distance x quantity x trips) / km/L`
pub fn liters_for(item: &ConsumptionItem) -> Result<Decimal, PtrabError> {
    let eq = item.equipment_type.as_str();
    require_positive(eq, "quantity", item.quantity)?;

    match item.usage {
        Usage::Stationary {
            hours_per_day,
            consumption_l_per_hour,
            operation_days,
        } => {
            require_positive(eq, "hours per day", hours_per_day)?;
            require_positive(eq, "consumption rate", consumption_l_per_hour)?;
            require_positive(eq, "operation days", operation_days)?;
            item.quantity
                .checked_mul(hours_per_day)
                .and_then(|v| v.checked_mul(consumption_l_per_hour))
                .and_then(|v| v.checked_mul(operation_days))
                .ok_or_else(|| PtrabError::overflow(format!("consumption of '{}'", eq)))
        }
        Usage::Vehicle {
            distance_km,
            trips,
            consumption_km_per_liter,
        } => {
            require_positive(eq, "distance", distance_km)?;
            require_positive(eq, "number of trips", trips)?;
            require_positive(eq, "consumption rate", consumption_km_per_liter)?;
            distance_km
                .checked_mul(item.quantity)
                .and_then(|v| v.checked_mul(trips))
                .and_then(|v| v.checked_div(consumption_km_per_liter))
                .ok_or_else(|| PtrabError::overflow(format!("consumption of '{}'", eq)))
        }
    }
}
