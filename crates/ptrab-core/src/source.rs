//! Collaborators the engine talks to: where records come from, where
//! fuel prices come from and where consolidated groups are saved.

use crate::catalog::schema::{PriceCatalog, SourceTableDef};
use crate::dor::DorGroup;
use crate::error::PtrabError;
use crate::fuel::{PriceQuote, PriceRequest};
use crate::model::{FuelType, RawRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Field linking a record to its plan.
pub const PTRAB_ID_FIELD: &str = "p_trab_id";

/// Fetches raw records of one table for one plan.
pub trait RecordSource {
    fn fetch_records(
        &self,
        table: &SourceTableDef,
        ptrab_id: &str,
    ) -> Result<Vec<RawRecord>, PtrabError>;
}

/// Looks up fuel prices.
pub trait PriceReference {
    fn fuel_price(&self, fuel: FuelType, request: &PriceRequest) -> Option<PriceQuote>;
}

/// Stores consolidated groups of a plan, replacing what was saved before.
pub trait PersistenceSink {
    fn save_line_items(&mut self, groups: &[DorGroup], ptrab_id: &str) -> Result<(), PtrabError>;
}

impl PriceReference for PriceCatalog {
    fn fuel_price(&self, fuel: FuelType, request: &PriceRequest) -> Option<PriceQuote> {
        self.lookup(fuel, request.from, request.to, &request.scope)
            .map(|e| PriceQuote {
                fuel_type: e.fuel_type,
                price: e.price,
                scope: e.scope.clone(),
                valid_from: e.valid_from,
                valid_to: e.valid_to,
                source: e.source.clone(),
            })
    }
}

/// Records of every table, as exported from the record store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<RawRecord>>,
}

/// A [`RecordSource`] over an in-memory [`Snapshot`].
///
/// Rows are filtered by their `p_trab_id` field. Tables missing from the
/// snapshot have no records.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> SnapshotSource {
        SnapshotSource { snapshot }
    }

    pub fn from_file(path: &Path) -> Result<SnapshotSource, PtrabError> {
        let bytes = std::fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), tables = snapshot.tables.len(), "snapshot loaded");
        Ok(SnapshotSource::new(snapshot))
    }
}

impl RecordSource for SnapshotSource {
    fn fetch_records(
        &self,
        table: &SourceTableDef,
        ptrab_id: &str,
    ) -> Result<Vec<RawRecord>, PtrabError> {
        Ok(self
            .snapshot
            .tables
            .get(&table.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.text(PTRAB_ID_FIELD).as_deref() == Some(ptrab_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Saved groups per plan id.
pub type SavedGroups = BTreeMap<String, Vec<DorGroup>>;

/// A [`PersistenceSink`] that keeps saved groups in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub saved: SavedGroups,
}

impl PersistenceSink for MemorySink {
    fn save_line_items(&mut self, groups: &[DorGroup], ptrab_id: &str) -> Result<(), PtrabError> {
        self.saved.insert(ptrab_id.to_string(), groups.to_vec());
        Ok(())
    }
}

/// A [`PersistenceSink`] backed by a JSON file holding every plan's groups.
///
/// Saving deletes the plan's previous groups and inserts the new ones;
/// other plans in the file are kept.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileSink {
        JsonFileSink { path: path.into() }
    }

    pub fn load(&self) -> Result<SavedGroups, PtrabError> {
        if !self.path.exists() {
            return Ok(SavedGroups::new());
        }
        let bytes = std::fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl PersistenceSink for JsonFileSink {
    fn save_line_items(&mut self, groups: &[DorGroup], ptrab_id: &str) -> Result<(), PtrabError> {
        let mut saved = self
            .load()
            .map_err(|e| PtrabError::Save(format!("{}: {}", self.path.display(), e)))?;
        saved.remove(ptrab_id);
        saved.insert(ptrab_id.to_string(), groups.to_vec());

        let json = serde_json::to_string_pretty(&saved)?;
        std::fs::write(&self.path, json)
            .map_err(|e| PtrabError::Save(format!("{}: {}", self.path.display(), e)))?;
        info!(path = %self.path.display(), ptrab_id, groups = groups.len(), "groups written");
        Ok(())
    }
}
