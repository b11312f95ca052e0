//! Data models for notes, fields and reviewables

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// One of the two sides of a note.
///
/// Also used as the presentation role of a field inside a reviewable:
/// `Front` is the prompt, `Back` the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    pub fn index(self) -> usize {
        match self {
            Self::Front => 0,
            Self::Back => 1,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Front),
            1 => Some(Self::Back),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Back => write!(f, "back"),
        }
    }
}

impl ToSql for Side {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.index() as i64))
    }
}

impl FromSql for Side {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let index = value.as_i64()?;
        Side::from_index(index).ok_or(FromSqlError::OutOfRange(index))
    }
}

/// Per-note configuration that drives reviewable synthesis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteConfig {
    /// Also generate the back → front direction
    #[serde(default)]
    pub reversible: bool,
    /// Split a multi-field answer side into one reviewable per field
    #[serde(default)]
    pub separable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub reversible: bool,
    pub separable: bool,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn config(&self) -> NoteConfig {
        NoteConfig {
            reversible: self.reversible,
            separable: self.separable,
        }
    }
}

/// A single piece of content on one side of a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: i64,
    pub note: i64,
    pub side: Side,
    pub position: u32,
    pub value: String,
    /// Content fingerprint used to match fields across edits
    pub hash: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewable {
    pub id: i64,
    pub note: i64,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Link between a reviewable and a field, with the side the field is
/// presented on (which may differ from the field's own side)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewableField {
    pub id: i64,
    pub reviewable: i64,
    pub field: i64,
    pub side: Side,
    pub created_at: DateTime<Utc>,
}

/// A field id together with the side it is presented on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRole {
    pub field: i64,
    pub side: Side,
}

/// The field composition of a reviewable, compared as a set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewableSpec {
    pub roles: BTreeSet<FieldRole>,
}

impl ReviewableSpec {
    pub fn new(roles: impl IntoIterator<Item = FieldRole>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    /// Field ids presented on `side`
    pub fn fields_on(&self, side: Side) -> Vec<i64> {
        self.roles
            .iter()
            .filter(|r| r.side == side)
            .map(|r| r.field)
            .collect()
    }
}

/// A stored reviewable with its field links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewableWithFields {
    pub reviewable: Reviewable,
    pub fields: Vec<ReviewableField>,
}

impl ReviewableWithFields {
    pub fn spec(&self) -> ReviewableSpec {
        ReviewableSpec::new(self.fields.iter().map(|f| FieldRole {
            field: f.field,
            side: f.side,
        }))
    }
}

/// A note with its live fields grouped by side, ordered by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteWithFields {
    pub note: Note,
    pub collections: Vec<i64>,
    pub fields: [Vec<Field>; 2],
}

impl NoteWithFields {
    /// Field values laid out the way `CreateNote::sides` expects them
    pub fn sides(&self) -> Vec<Vec<String>> {
        self.fields
            .iter()
            .map(|side| side.iter().map(|f| f.value.clone()).collect())
            .collect()
    }
}

/// Request to create a note
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub collections: Vec<i64>,
    /// Field values per side, in display order
    pub sides: Vec<Vec<String>>,
    #[serde(flatten)]
    pub config: NoteConfig,
}

/// Partial update of a note; `None` leaves the value unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sides: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<i64>>,
}

/// What a create or update actually changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSummary {
    pub fields_inserted: usize,
    pub fields_updated: usize,
    pub fields_archived: usize,
    pub reviewables_inserted: usize,
    pub reviewables_archived: usize,
    pub reviewables_unarchived: usize,
}

impl EditSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of a create or update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEdit {
    pub note: NoteWithFields,
    pub summary: EditSummary,
}

/// Sort direction for note listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// List-membership filters; empty lists do not restrict
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFilter {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub collections: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<i64>,
    #[serde(default = "default_page_limit")]
    pub limit: usize,
}

pub(crate) fn default_page_limit() -> usize {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: default_page_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    /// Id to pass as the cursor of the following page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub notes: Vec<NoteWithFields>,
    pub cursor: PageCursor,
}
