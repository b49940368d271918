//! Inventory view controller
//!
//! Owns the view state and every call to the inventory service. Each read
//! takes a ticket from a generation counter when it is issued; a response is
//! only written into the view if its ticket is newer than the one already
//! shown, so a slow response can never overwrite a fresher one.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::Config;
use crate::inventory::{
    decode_records, sort_records, GroupField, InventoryRecord, SelectedItem, SortKey,
};
use crate::io::HttpClient;
use crate::state::{new_view_handle, ViewHandle, ViewState};
use crate::{InventoryError, Result};

/// Result of a refresh as seen by the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// The response replaced the view
    Applied { records: usize },
    /// The request failed and the fallback dataset replaced the view
    FellBack { error: String },
    /// A newer response was already shown; this one was dropped
    Stale,
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cycle", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed { refresh: RefreshOutcome },
    /// Another cycle was still in flight
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Order,
    Shipment,
    SetName,
    Clear,
}

impl MutationKind {
    pub fn path(&self) -> &'static str {
        match self {
            MutationKind::Order => "order",
            MutationKind::Shipment => "shipment",
            MutationKind::SetName => "name",
            MutationKind::Clear => "clear",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            MutationKind::Clear => "DELETE",
            _ => "POST",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method(), self.path())
    }
}

/// A write request against the inventory service
#[derive(Debug, Clone)]
pub enum Mutation {
    Order(SelectedItem),
    Shipment(SelectedItem),
    SetName(String),
    Clear,
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Order(_) => MutationKind::Order,
            Mutation::Shipment(_) => MutationKind::Shipment,
            Mutation::SetName(_) => MutationKind::SetName,
            Mutation::Clear => MutationKind::Clear,
        }
    }
}

/// What happened to a mutation and the refresh that always follows it
#[derive(Debug)]
pub struct MutationReport {
    pub kind: MutationKind,
    /// Response body on success
    pub result: Result<String>,
    pub refresh: RefreshOutcome,
}

/// Controller for one inventory view
pub struct InventoryController {
    http: Arc<dyn HttpClient>,
    base_url: String,
    group: Option<GroupField>,
    sort: SortKey,
    fallback: Vec<InventoryRecord>,
    /// Set when every reload is preceded by a rundown
    rundown_delay: Option<Duration>,
    state: ViewHandle,
    generation: AtomicU64,
    cycle_in_flight: AtomicBool,
}

impl fmt::Debug for InventoryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryController")
            .field("base_url", &self.base_url)
            .field("group", &self.group)
            .field("sort", &self.sort)
            .field("rundown_delay", &self.rundown_delay)
            .finish()
    }
}

impl InventoryController {
    pub fn new(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let poll = config.poll_settings();

        tracing::debug!(
            "Created {:?} inventory controller for {}",
            config.variant,
            base_url
        );

        Self {
            http,
            base_url,
            group: config.variant.group_field(),
            sort: config.sort_key(),
            fallback: config.fallback_records(),
            rundown_delay: poll.rundown.then(|| poll.rundown_delay()),
            state: new_view_handle(),
            generation: AtomicU64::new(0),
            cycle_in_flight: AtomicBool::new(false),
        }
    }

    /// Handle to the shared view state
    pub fn state(&self) -> ViewHandle {
        Arc::clone(&self.state)
    }

    pub fn group_field(&self) -> Option<GroupField> {
        self.group
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read `/inventory` and replace the view with it, or with the fallback on failure
    pub async fn refresh_inventory(&self) -> RefreshOutcome {
        let ticket = self.next_ticket();
        let fetched = self.fetch_records().await.map_err(|e| e.to_string());
        self.apply(ticket, fetched).await
    }

    async fn fetch_records(&self) -> Result<Vec<InventoryRecord>> {
        let url = self.url("inventory");
        tracing::debug!("Refreshing inventory from {}", url);

        let response = self
            .http
            .get(&url)
            .await?
            .error_for_status("GET /inventory")?;
        let mut records = decode_records(&response.body, self.group)?;
        sort_records(&mut records, self.sort);
        Ok(records)
    }

    async fn apply(
        &self,
        ticket: u64,
        fetched: std::result::Result<Vec<InventoryRecord>, String>,
    ) -> RefreshOutcome {
        let now_ms = current_epoch_ms();
        let mut state = self.state.write().await;

        match fetched {
            Ok(records) => {
                let count = records.len();
                if !state.replace_records(ticket, records, now_ms) {
                    tracing::debug!(
                        "Discarding stale inventory response (ticket {} <= {})",
                        ticket,
                        state.applied_generation
                    );
                    return RefreshOutcome::Stale;
                }
                state.stats.refreshes += 1;
                tracing::debug!("Inventory refreshed: {} records (ticket {})", count, ticket);
                RefreshOutcome::Applied { records: count }
            }
            Err(error) => {
                if !state.replace_records(ticket, self.fallback.clone(), now_ms) {
                    tracing::debug!("Ignoring stale failure (ticket {}): {}", ticket, error);
                    return RefreshOutcome::Stale;
                }
                state.stats.fallbacks += 1;
                tracing::warn!(
                    "Inventory fetch failed, showing {} fallback records: {}",
                    self.fallback.len(),
                    error
                );
                RefreshOutcome::FellBack { error }
            }
        }
    }

    /// Ask the remote units to report their stock. The body is only logged.
    pub async fn request_rundown(&self) -> Result<()> {
        let ticket = self.next_ticket();
        let url = self.url("rundown");
        tracing::debug!("Requesting rundown from {}", url);

        let sent = match self.http.get(&url).await {
            Ok(response) => response.error_for_status("GET /rundown"),
            Err(e) => Err(e),
        };

        match sent {
            Ok(response) => {
                tracing::info!(
                    "Rundown requested: status {} ({} bytes)",
                    response.status,
                    response.body.len()
                );
                Ok(())
            }
            Err(e) => {
                self.apply(ticket, Err(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Run one poll cycle unless another one is still in flight.
    ///
    /// With `rundown` set, the rundown request is followed by a fixed `delay`
    /// before the refresh; nothing waits for the remote side to finish.
    pub async fn poll_cycle(&self, rundown: bool, delay: Duration) -> CycleOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.cycle_in_flight) else {
            self.state.write().await.stats.skipped_cycles += 1;
            tracing::debug!("Poll cycle skipped: previous cycle still in flight");
            return CycleOutcome::Skipped;
        };

        let refresh = if rundown {
            self.rundown_then_refresh(delay).await
        } else {
            self.refresh_inventory().await
        };
        CycleOutcome::Completed { refresh }
    }

    /// Refresh the way this variant always does: with a rundown first when
    /// the poll settings ask for one. Used for the initial load and after
    /// every mutation.
    pub async fn reload(&self) -> RefreshOutcome {
        match self.rundown_delay {
            Some(delay) => self.rundown_then_refresh(delay).await,
            None => self.refresh_inventory().await,
        }
    }

    async fn rundown_then_refresh(&self, delay: Duration) -> RefreshOutcome {
        if let Err(e) = self.request_rundown().await {
            tracing::warn!("Rundown request failed: {}", e);
        }
        tokio::time::sleep(delay).await;
        self.refresh_inventory().await
    }

    /// Send a write request, then reload regardless of how it went
    pub async fn submit_mutation(&self, mutation: Mutation) -> MutationReport {
        let kind = mutation.kind();
        let result = self.send_mutation(&mutation).await;

        match &result {
            Ok(body) => {
                tracing::info!("{} succeeded: {}", kind, body);
                if let Mutation::SetName(name) = &mutation {
                    self.state.write().await.name = name.clone();
                }
            }
            Err(e) => tracing::warn!("{} failed: {}", kind, e),
        }

        let refresh = self.reload().await;
        MutationReport {
            kind,
            result,
            refresh,
        }
    }

    async fn send_mutation(&self, mutation: &Mutation) -> Result<String> {
        let kind = mutation.kind();
        let url = self.url(kind.path());

        let response = match mutation {
            Mutation::Order(item) => {
                if item.is_new() {
                    return Err(InventoryError::InvalidSelection(
                        "orders can only be placed for existing items".to_string(),
                    ));
                }
                let body = serde_json::to_string(&item.to_wire(self.group))?;
                self.http.post_body(&url, body).await?
            }
            Mutation::Shipment(item) => {
                if item.record().item_type.trim().is_empty() {
                    return Err(InventoryError::InvalidSelection(
                        "shipments need an item type".to_string(),
                    ));
                }
                let body = serde_json::to_string(&item.to_wire(self.group))?;
                self.http.post_body(&url, body).await?
            }
            Mutation::SetName(name) => self.http.post_body(&url, name.clone()).await?,
            Mutation::Clear => self.http.delete(&url).await?,
        };

        Ok(response.error_for_status(&kind.to_string())?.body)
    }

    /// Read the branch display name into the view.
    ///
    /// A non-2xx answer means no name is set; transport errors leave the name alone.
    pub async fn fetch_name(&self) -> Result<String> {
        let url = self.url("name");
        let response = match self.http.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Fetching name failed: {}", e);
                return Err(e);
            }
        };

        let name = if response.is_success() {
            response.body
        } else {
            tracing::debug!("GET /name returned status {}", response.status);
            String::new()
        };

        self.state.write().await.name = name.clone();
        Ok(name)
    }

    pub async fn select_item(&self, item: Option<SelectedItem>) {
        self.state.write().await.selected = item;
    }

    /// Stage a copy of the displayed record with this id
    pub async fn select_record(&self, id: &str) -> Result<SelectedItem> {
        let mut state = self.state.write().await;
        let record = state
            .find_record(id)
            .cloned()
            .ok_or_else(|| InventoryError::InvalidSelection(format!("no record with id {}", id)))?;
        let item = SelectedItem::existing(record);
        state.selected = Some(item.clone());
        Ok(item)
    }

    pub async fn select_new_item(&self) -> SelectedItem {
        let item = SelectedItem::new_item();
        self.state.write().await.selected = Some(item.clone());
        item
    }

    /// Edit the staged item in place
    pub async fn edit_selection(
        &self,
        item_type: Option<String>,
        quantity: Option<&str>,
    ) -> Result<SelectedItem> {
        let mut state = self.state.write().await;
        let selected = state
            .selected
            .as_mut()
            .ok_or_else(|| InventoryError::InvalidSelection("nothing selected".to_string()))?;
        if let Some(item_type) = item_type {
            selected.set_item_type(item_type)?;
        }
        if let Some(quantity) = quantity {
            selected.set_quantity(quantity);
        }
        Ok(selected.clone())
    }

    pub async fn set_filter(&self, group: Option<String>) {
        self.state.write().await.filter = group;
    }

    /// Records currently shown, after the filter
    pub async fn displayed(&self) -> Vec<InventoryRecord> {
        self.state
            .read()
            .await
            .displayed()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn group_values(&self) -> Vec<String> {
        self.state.read().await.group_values()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }
}

/// Holds the single-flight flag for the duration of a cycle
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
