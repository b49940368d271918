//! Shared view state: the displayed records, filter, selection and counters

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::inventory::{filter_records, group_values, InventoryRecord, SelectedItem};

/// Counters describing how the view has been updated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewStats {
    pub refreshes: u64,
    pub fallbacks: u64,
    pub stale_discards: u64,
    pub skipped_cycles: u64,
}

/// Client-side view state, replaced wholesale on every applied fetch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewState {
    pub records: Vec<InventoryRecord>,
    pub filter: Option<String>,
    pub selected: Option<SelectedItem>,
    pub name: String,
    /// Ticket of the last response written into `records`
    pub applied_generation: u64,
    pub last_update_epoch_ms: Option<u64>,
    pub stats: ViewStats,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a response issued with `generation` is older than what is shown
    pub fn is_stale(&self, generation: u64) -> bool {
        generation <= self.applied_generation
    }

    /// Replace the records with a newer response.
    ///
    /// Returns false, leaving the records untouched, if `generation` is not newer
    /// than the last applied one.
    pub fn replace_records(
        &mut self,
        generation: u64,
        records: Vec<InventoryRecord>,
        now_ms: u64,
    ) -> bool {
        if self.is_stale(generation) {
            self.stats.stale_discards += 1;
            return false;
        }
        self.records = records;
        self.applied_generation = generation;
        self.last_update_epoch_ms = Some(now_ms);
        true
    }

    /// Records after applying the current filter
    pub fn displayed(&self) -> Vec<&InventoryRecord> {
        filter_records(&self.records, self.filter.as_deref())
    }

    pub fn group_values(&self) -> Vec<String> {
        group_values(&self.records)
    }

    pub fn find_record(&self, id: &str) -> Option<&InventoryRecord> {
        self.records.iter().find(|r| r.id.as_str() == id)
    }
}

/// Thread-safe shared state handle
pub type ViewHandle = Arc<RwLock<ViewState>>;

pub fn new_view_handle() -> ViewHandle {
    Arc::new(RwLock::new(ViewState::new()))
}
