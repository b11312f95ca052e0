//! Data models for reviews and scheduling state

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::notes::{Field, Reviewable};

/// How well a reviewable was recalled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rating {
    /// Rescheduled by hand rather than answered
    Manual,
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ANSWERS: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn value(self) -> i64 {
        match self {
            Self::Manual => 0,
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Manual),
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            other => Err(ValidationError::InvalidRating(other)),
        }
    }
}

impl ToSql for Rating {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.value()))
    }
}

impl FromSql for Rating {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        Rating::try_from(raw).map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

/// Where a reviewable is in the learning process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewState {
    /// Never reviewed
    #[default]
    New,
    /// In initial learning phase
    Learning,
    /// Regular spaced review
    Review,
    /// Failed and re-learning
    Relearning,
}

impl ReviewState {
    pub fn value(self) -> i64 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Review => 2,
            Self::Relearning => 3,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::New),
            1 => Some(Self::Learning),
            2 => Some(Self::Review),
            3 => Some(Self::Relearning),
            _ => None,
        }
    }
}

impl ToSql for ReviewState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.value()))
    }
}

impl FromSql for ReviewState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        ReviewState::from_value(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}

/// Default FSRS parameters
pub const DEFAULT_WEIGHTS: [f64; 19] = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

/// Scheduler settings; a copy is stored with every review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewConfig {
    #[serde(default)]
    pub due_fuzzed: bool,
    #[serde(default = "default_learning_enabled")]
    pub learning_enabled: bool,
    /// Longest interval in days
    #[serde(default = "default_max_interval")]
    pub max_interval: u32,
    /// Target recall probability, in percent
    #[serde(default = "default_retention")]
    pub retention: u8,
    #[serde(default = "default_weights")]
    pub weights: Vec<f64>,
}

fn default_learning_enabled() -> bool {
    true
}

/// Longest interval a scheduler may produce, in days
pub const MAX_INTERVAL_DAYS: u32 = 36500;

fn default_max_interval() -> u32 {
    MAX_INTERVAL_DAYS
}

fn default_retention() -> u8 {
    90
}

fn default_weights() -> Vec<f64> {
    DEFAULT_WEIGHTS.to_vec()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            due_fuzzed: false,
            learning_enabled: default_learning_enabled(),
            max_interval: default_max_interval(),
            retention: default_retention(),
            weights: default_weights(),
        }
    }
}

impl ReviewConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retention > 100 {
            return Err(ValidationError::InvalidRetention(self.retention));
        }
        if self.max_interval == 0 || self.max_interval > MAX_INTERVAL_DAYS {
            return Err(ValidationError::InvalidMaxInterval(self.max_interval));
        }
        if self.weights.len() < DEFAULT_WEIGHTS.len() {
            return Err(ValidationError::TooFewWeights(self.weights.len()));
        }
        Ok(())
    }
}

/// A recorded answer. Never modified once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub reviewable: i64,
    pub rating: Rating,
    pub duration_ms: i64,
    pub created_at: DateTime<Utc>,
    /// UTC offset of the reviewer, `+HH:MM`
    pub created_at_offset: String,
    pub config: ReviewConfig,
}

/// Scheduler output recorded after a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewableSnapshot {
    pub id: i64,
    pub reviewable: i64,
    pub review: i64,
    pub difficulty: f64,
    pub stability: f64,
    pub due: DateTime<Utc>,
    pub state: ReviewState,
    pub created_at: DateTime<Utc>,
}

/// What a scheduler decides for one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledState {
    pub difficulty: f64,
    pub stability: f64,
    pub due: DateTime<Utc>,
    pub state: ReviewState,
}

/// Request to record a review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReview {
    pub reviewable: i64,
    pub rating: Rating,
    pub duration_ms: i64,
    /// When the answer was given, in the reviewer's local offset
    pub reviewed_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedReview {
    pub review: Review,
    pub snapshot: ReviewableSnapshot,
}

/// Candidate filter for due selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFilter {
    /// Restrict to notes in any of these collections; empty means all
    #[serde(default)]
    pub collections: Vec<i64>,
    /// Only reviewables that are new or past their due date
    #[serde(default = "default_due_only")]
    pub due: bool,
}

fn default_due_only() -> bool {
    true
}

impl Default for ReviewFilter {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            due: default_due_only(),
        }
    }
}

/// A reviewable ready to be presented.
///
/// `fields` is indexed by presentation side (prompt first), each side
/// ordered by field position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueReviewable {
    pub reviewable: Reviewable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ReviewableSnapshot>,
    pub fields: [Vec<Field>; 2],
}

/// Counts over the live reviewables matching a filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub relearning: usize,
    pub due: usize,
}
