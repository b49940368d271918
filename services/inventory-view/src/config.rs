//! Configuration types for the inventory view service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::inventory::{GroupField, InventoryRecord, SortKey};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the inventory service, e.g. `http://localhost:8080`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Poll settings; variant defaults apply when absent
    #[serde(default)]
    pub poll: Option<PollConfig>,
    /// Sort key override
    #[serde(default)]
    pub sort: Option<SortKey>,
    /// Fallback dataset override
    #[serde(default)]
    pub fallback: Option<Vec<InventoryRecord>>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            variant: Variant::default(),
            request_timeout_ms: default_request_timeout_ms(),
            poll: None,
            sort: None,
            fallback: None,
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_settings(&self) -> PollConfig {
        self.poll.clone().unwrap_or_else(|| self.variant.default_poll())
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort.unwrap_or_else(|| self.variant.sort_key())
    }

    pub fn fallback_records(&self) -> Vec<InventoryRecord> {
        self.fallback
            .clone()
            .unwrap_or_else(|| self.variant.fallback_records())
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(crate::InventoryError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        let poll = self.poll_settings();
        if poll.enabled && poll.interval_ms == 0 {
            return Err(crate::InventoryError::Config(
                "poll.interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which dashboard the view serves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Corporate dashboard: records grouped by branch
    #[default]
    Corporate,
    /// Hub dashboard: records grouped by unit, rundown before every poll
    Hub,
    /// Single branch manager: no grouping, supports orders, shipments and naming
    Branch,
}

impl Variant {
    pub fn group_field(&self) -> Option<GroupField> {
        match self {
            Variant::Corporate => Some(GroupField::Branch),
            Variant::Hub => Some(GroupField::Unit),
            Variant::Branch => None,
        }
    }

    pub fn sort_key(&self) -> SortKey {
        match self {
            Variant::Corporate => SortKey::None,
            Variant::Hub => SortKey::GroupKey,
            Variant::Branch => SortKey::ItemType,
        }
    }

    pub fn has_name(&self) -> bool {
        matches!(self, Variant::Branch)
    }

    pub fn default_poll(&self) -> PollConfig {
        match self {
            Variant::Hub => PollConfig {
                enabled: true,
                interval_ms: 2000,
                rundown: true,
                rundown_delay_ms: default_rundown_delay_ms(),
            },
            Variant::Corporate | Variant::Branch => PollConfig::default(),
        }
    }

    pub fn fallback_records(&self) -> Vec<InventoryRecord> {
        match self {
            Variant::Corporate => vec![
                InventoryRecord::new("1", Some("Stanford"), "Paper", 500),
                InventoryRecord::new("2", Some("Stanford"), "Printers", 10),
                InventoryRecord::new("3", Some("Stanford"), "Ink", 20),
            ],
            Variant::Hub | Variant::Branch => Vec::new(),
        }
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// Request a rundown before each refresh
    #[serde(default)]
    pub rundown: bool,
    /// Fixed delay between the rundown request and the refresh
    #[serde(default = "default_rundown_delay_ms")]
    pub rundown_delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_poll_interval_ms(),
            rundown: false,
            rundown_delay_ms: default_rundown_delay_ms(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn rundown_delay(&self) -> Duration {
        Duration::from_millis(self.rundown_delay_ms)
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_rundown_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::InventoryError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
