use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {field} {reason}")]
    Configuration { field: &'static str, reason: String },

    #[error("Grid is full: no empty cell left for agent {agent_id} ({cells} cells)")]
    NoCapacity { agent_id: usize, cells: usize },

    #[error("Cell ({x}, {y}) is already occupied")]
    CellOccupied { x: usize, y: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tick: expected {expected}, got {actual}")]
    TickMismatch { expected: u64, actual: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration { field, reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
