//! Error types for timetable-engine operations.

use thiserror::Error;

use crate::model::SlotId;
use crate::reconcile::BatchPhase;

#[derive(Error, Debug)]
pub enum TimetableError {
    /// A persistence call failed while a reconciled batch was being written.
    /// Steps after the failing one were not attempted.
    #[error("Save failed during {phase} phase after {completed} successful operation(s): {source}")]
    Persistence {
        phase: BatchPhase,
        completed: usize,
        #[source]
        source: RepositoryError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid time slot data: {0}")]
    InvalidSlot(String),
}

/// Failures reported by the backing store collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Time slot {0} not found")]
    SlotNotFound(SlotId),

    #[error("Period {0} not found")]
    PeriodNotFound(u64),

    #[error("Position {0} is already occupied")]
    PositionTaken(String),

    #[error("Store rejected the request: {0}")]
    Rejected(String),
}

/// Settings file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, TimetableError>;
