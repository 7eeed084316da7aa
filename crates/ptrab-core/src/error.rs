use crate::dor::GroupId;
use crate::model::FuelType;
use rust_decimal::Decimal;
use std::fmt;
use std::path::PathBuf;

/// Broad class of a failure, used by callers to decide how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blank field, zero quantity, unbalanced split. Shown inline, blocks the action.
    Validation,
    /// Fetch or save against the record store failed. User must re-trigger.
    DataSource,
    /// A business constraint was violated.
    BusinessRule,
    /// A directive catalog could not be loaded or is malformed.
    Catalog,
}

#[derive(Debug, thiserror::Error)]
pub enum PtrabError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("ND 30 ({nd30}) + ND 39 ({nd39}) does not match category total {total}")]
    UnbalancedSplit {
        total: Decimal,
        nd30: Decimal,
        nd39: Decimal,
    },

    #[error("destination organizational unit is required")]
    MissingDestination,

    #[error("failed to load items from '{table}': {reason}")]
    ItemsLoad { table: String, reason: String },

    #[error("failed to save groups: {0}")]
    Save(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("no {fuel} price reference for {scope}")]
    MissingFuelPrice { fuel: FuelType, scope: String },

    #[error("group {0} does not exist")]
    UnknownGroup(GroupId),

    #[error("item '{0}' does not exist")]
    UnknownItem(String),

    #[error("equipment '{0}' not found in the directive catalog")]
    UnknownEquipment(String),

    #[error("failed to load catalog from {path}: {reason}")]
    CatalogLoad { path: PathBuf, reason: String },

    #[error("invalid catalog: {0}")]
    CatalogInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PtrabError {
    /// Validation error for a computation that does not fit a `Decimal`.
    pub fn overflow(what: impl fmt::Display) -> PtrabError {
        PtrabError::Validation(format!("{} is too large to compute", what))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PtrabError::Validation(_)
            | PtrabError::UnbalancedSplit { .. }
            | PtrabError::MissingDestination
            | PtrabError::UnknownGroup(_)
            | PtrabError::UnknownItem(_)
            | PtrabError::UnknownEquipment(_) => ErrorKind::Validation,
            PtrabError::ItemsLoad { .. } | PtrabError::Save(_) | PtrabError::Io(_) => {
                ErrorKind::DataSource
            }
            PtrabError::BusinessRule(_) | PtrabError::MissingFuelPrice { .. } => {
                ErrorKind::BusinessRule
            }
            PtrabError::CatalogLoad { .. }
            | PtrabError::CatalogInvalid(_)
            | PtrabError::Json(_) => ErrorKind::Catalog,
        }
    }
}
