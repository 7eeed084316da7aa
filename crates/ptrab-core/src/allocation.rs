use crate::error::PtrabError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Largest difference between total and ND 30 + ND 39 still considered balanced.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Result of splitting a category total between ND 30 (material) and ND 39 (services).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    pub total: Decimal,
    pub nd30: Decimal,
    pub nd39: Decimal,
    pub is_balanced: bool,
    /// False when the total is zero; the ND 39 field must not be editable then.
    pub input_enabled: bool,
}

impl SplitResult {
    /// Whether this split still adds up to `current_total`.
    pub fn is_balanced_against(&self, current_total: Decimal) -> bool {
        is_balanced(current_total, self.nd30, self.nd39)
    }
}

fn is_balanced(total: Decimal, nd30: Decimal, nd39: Decimal) -> bool {
    (total - (nd30 + nd39)).abs() < BALANCE_TOLERANCE
}

/// Split `category_total` given the user's ND 39 input.
///
/// ND 39 is clamped to `[0, total]` and ND 30 takes the rest. A negative
/// total is treated as zero.
pub fn compute_split(category_total: Decimal, nd39_input: Decimal) -> SplitResult {
    let total = category_total.max(Decimal::ZERO);
    if total.is_zero() {
        return SplitResult {
            total,
            nd30: Decimal::ZERO,
            nd39: Decimal::ZERO,
            is_balanced: true,
            input_enabled: false,
        };
    }

    let nd39 = nd39_input.clamp(Decimal::ZERO, total);
    let nd30 = total - nd39;
    SplitResult {
        total,
        nd30,
        nd39,
        is_balanced: is_balanced(total, nd30, nd39),
        input_enabled: true,
    }
}

/// A saved ND 30/39 split with its destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub total_value: Decimal,
    pub nd39_value: Decimal,
    pub nd30_value: Decimal,
    pub destination_org_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_budget_unit: Option<String>,
}

impl CategoryAllocation {
    /// Record a split. Requires a balanced split and a destination unit.
    pub fn commit(
        split: &SplitResult,
        destination_org_unit: &str,
        destination_budget_unit: Option<&str>,
    ) -> Result<CategoryAllocation, PtrabError> {
        let destination = destination_org_unit.trim();
        if destination.is_empty() {
            return Err(PtrabError::MissingDestination);
        }
        if !split.is_balanced {
            return Err(PtrabError::UnbalancedSplit {
                total: split.total,
                nd30: split.nd30,
                nd39: split.nd39,
            });
        }

        Ok(CategoryAllocation {
            total_value: split.total,
            nd39_value: split.nd39,
            nd30_value: split.nd30,
            destination_org_unit: destination.to_string(),
            destination_budget_unit: destination_budget_unit
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        })
    }

    /// Check a stored allocation against the category's current total.
    pub fn revalidate(&self, current_total: Decimal) -> Result<(), PtrabError> {
        if is_balanced(current_total, self.nd30_value, self.nd39_value) {
            return Ok(());
        }
        warn!(
            destination = %self.destination_org_unit,
            stored = %self.total_value,
            current = %current_total,
            "allocation is stale"
        );
        Err(PtrabError::UnbalancedSplit {
            total: current_total,
            nd30: self.nd30_value,
            nd39: self.nd39_value,
        })
    }

    /// Re-split `current_total` keeping the stored ND 39 as the input.
    pub fn rebalance(&self, current_total: Decimal) -> SplitResult {
        compute_split(current_total, self.nd39_value)
    }
}
