//! Error types for the recall engine

use thiserror::Error;

use crate::notes::Side;

/// Input rejected before any write happens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A note must belong to at least one collection")]
    NoCollections,

    #[error("A note must have exactly 2 sides, got {0}")]
    SideCount(usize),

    #[error("Side {0} has no fields")]
    EmptySide(Side),

    #[error("Empty field value on side {side} at position {position}")]
    EmptyValue { side: Side, position: u32 },

    #[error("Rating must be between 0 and 4, got {0}")]
    InvalidRating(i64),

    #[error("Review duration must be positive, got {0}ms")]
    InvalidDuration(i64),

    #[error("Retention must be between 0 and 100, got {0}")]
    InvalidRetention(u8),

    #[error("Maximum interval must be between 1 and 36500 days, got {0}")]
    InvalidMaxInterval(u32),

    #[error("Scheduler needs at least 19 weights, got {0}")]
    TooFewWeights(usize),

    #[error("Page limit must be positive")]
    InvalidLimit,
}

/// Errors that can occur in note, reviewable and review operations
#[derive(Debug, Error)]
pub enum RecallError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    #[error("Reviewable not found: {0}")]
    ReviewableNotFound(i64),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl From<rusqlite::Error> for RecallError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(msg.unwrap_or_else(|| e.to_string()))
            }
            other => Self::Sqlite(other),
        }
    }
}

impl RecallError {
    /// True for errors caused by the caller's input rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, RecallError>;
