use crate::error::PtrabError;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a decimal written either in Brazilian notation or plain notation.
///
/// Handles formats like:
/// - "1234.56" -> 1234.56
/// - "1234,56" -> 1234.56
/// - "1.234,56" -> 1234.56
/// - "R$ 1.234,56" -> 1234.56
/// - "1.234.567" -> 1234567 (repeated dots are thousands separators)
pub fn parse_decimal(s: &str) -> Result<Decimal, PtrabError> {
    let trimmed = s.trim();
    let body = trimmed.strip_prefix("R$").unwrap_or(trimmed).trim();
    if body.is_empty() {
        return Err(PtrabError::Validation("empty number".into()));
    }

    let normalized = if body.contains(',') {
        body.replace('.', "").replace(',', ".")
    } else if body.matches('.').count() > 1 {
        body.replace('.', "")
    } else {
        body.to_string()
    };

    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|e| PtrabError::Validation(format!("invalid number '{}': {}", trimmed, e)))
}

/// Round half away from zero, the way values are printed on the plan.
pub fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a decimal in Brazilian notation with a fixed number of places.
///
/// `format_br(dec!(1234.5), 2)` -> "1.234,50"
pub fn format_br(value: Decimal, dp: u32) -> String {
    let rounded = round_money(value, dp);
    let plain = format!("{:.*}", dp as usize, rounded.abs());
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (plain.clone(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped},{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Format a monetary value as "R$ 1.234,56".
pub fn format_brl(value: Decimal) -> String {
    format!("R$ {}", format_br(value, 2))
}

/// Format a quantity without trailing zeros ("2", "2,5", "1.500").
pub fn format_quantity(value: Decimal) -> String {
    let normalized = value.normalize();
    format_br(normalized, normalized.scale())
}

pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
