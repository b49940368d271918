//! Error types for the inventory view service

/// Errors that can occur in the inventory view service
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed inventory record: {0}")]
    Record(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InventoryError {
    /// Whether this error came from malformed response content rather than the transport
    pub fn is_parse(&self) -> bool {
        matches!(self, InventoryError::Parse(_) | InventoryError::Record(_))
    }
}

/// Result type alias for inventory view operations
pub type Result<T> = std::result::Result<T, InventoryError>;
