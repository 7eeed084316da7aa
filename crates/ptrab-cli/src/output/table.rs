use ptrab_core::aggregate::NatureSummary;
use ptrab_core::dor::DorGroup;
use ptrab_core::fuel::FuelConsolidation;
use ptrab_core::model::LineItem;
use ptrab_core::numbers::{format_br, format_brl};
use rust_decimal::Decimal;

fn description_width(items: &[&LineItem]) -> usize {
    items
        .iter()
        .map(|i| i.description.chars().count())
        .max()
        .unwrap_or(10)
        .min(60)
}

fn print_item_rows(items: &[&LineItem], indent: &str) {
    let width = description_width(items);
    for item in items {
        println!(
            "{indent}{:<width$}  {}  {:<12}  {:>16}",
            item.description,
            item.nature,
            item.organization_unit,
            format_brl(item.value),
            width = width
        );
    }
}

pub fn print_items(items: &[&LineItem]) {
    if items.is_empty() {
        println!("  No line items.");
        return;
    }
    println!("=== Line items ({}) ===\n", items.len());
    print_item_rows(items, "  ");
}

pub fn print_summary(summary: &[NatureSummary]) {
    println!("=== Totals by nature ===\n");
    let mut grand = Decimal::ZERO;
    for s in summary {
        println!(
            "  {}  {}  {:<36} {:>4} item(s)  {:>16}",
            s.gnd,
            s.nature,
            s.nature.label(),
            s.item_count,
            format_brl(s.total)
        );
        grand += s.total;
    }
    println!("\n  Total: {}", format_brl(grand));
}

pub fn print_groups(groups: &[DorGroup], available: &[&LineItem]) {
    for g in groups {
        println!("=== {} ({}) ===\n", g.name, format_brl(g.total));
        if g.items.is_empty() {
            println!("  (empty)");
        } else {
            let refs: Vec<&LineItem> = g.items.iter().collect();
            print_item_rows(&refs, "  ");
        }
        println!();
    }

    let available_total: Decimal = available.iter().map(|i| i.value).sum();
    println!(
        "=== Available: {} item(s), {} ===\n",
        available.len(),
        format_brl(available_total)
    );
    print_item_rows(available, "  ");
}

pub fn print_fuel(result: &[FuelConsolidation]) {
    for (i, c) in result.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!(
            "=== {}: {} L, {} ===\n",
            c.totals.fuel_type,
            format_br(c.totals.total_liters_with_margin, 2),
            format_brl(c.total_cost)
        );
        for line in c.memo.lines() {
            println!("  {line}");
        }
    }
}
