use super::{FuelTotals, ItemConsumption, PriceQuote, Usage, FUEL_MARGIN};
use crate::numbers::{format_br, format_brl, format_date_br, format_quantity, round_money};
use rust_decimal::Decimal;

/// One line of the memo per item, e.g.
/// `- Gerador 15 KVA: 2 un x 8 h/dia x 4 L/h x 10 dias = 640,00 L`.
fn item_line(c: &ItemConsumption) -> String {
    let item = &c.item;
    let formula = match item.usage {
        Usage::Stationary {
            hours_per_day,
            consumption_l_per_hour,
            operation_days,
        } => format!(
            "{} un x {} h/dia x {} L/h x {} dias",
            format_quantity(item.quantity),
            format_quantity(hours_per_day),
            format_quantity(consumption_l_per_hour),
            format_quantity(operation_days)
        ),
        Usage::Vehicle {
            distance_km,
            trips,
            consumption_km_per_liter,
        } => format!(
            "({} km x {} un x {} deslocamentos) ÷ {} km/L",
            format_quantity(distance_km),
            format_quantity(item.quantity),
            format_quantity(trips),
            format_quantity(consumption_km_per_liter)
        ),
    };
    format!(
        "- {}: {} = {} L",
        item.equipment_type,
        formula,
        format_br(c.liters, 2)
    )
}

/// Render the calculation memo stored with the record and printed on the plan.
pub fn render(totals: &FuelTotals, price: &PriceQuote, total_cost: Decimal) -> String {
    let raw = format_br(totals.total_liters_raw, 2);
    let billed = round_money(totals.total_liters_with_margin, 2);

    let mut lines = Vec::with_capacity(totals.items.len() + 6);
    lines.push(format!("Classe III - {}", totals.fuel_type));
    lines.push("Cálculo do consumo:".to_string());
    lines.extend(totals.items.iter().map(item_line));
    lines.push(format!("Consumo total: {raw} L"));
    lines.push(format!(
        "Margem operacional de 30%: {} L x {} = {} L",
        raw,
        format_br(FUEL_MARGIN, 1),
        format_br(billed, 2)
    ));
    lines.push(format!(
        "Preço de referência: {}/L ({}, {}, válido de {} a {})",
        format_brl(price.price),
        price.source,
        price.scope,
        format_date_br(price.valid_from),
        format_date_br(price.valid_to)
    ));
    lines.push(format!(
        "Custo total: {} L x {}/L = {}",
        format_br(billed, 2),
        format_brl(price.price),
        format_brl(total_cost)
    ));
    lines.join("\n")
}
