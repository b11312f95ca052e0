//! Notes and the reviewables derived from them
//!
//! This module provides:
//! - Content hashing of field values
//! - Field reconciliation (identity-preserving diff of a note's layout)
//! - Reviewable synthesis from fields and note config
//! - Reviewable reconciliation against stored rows
//! - Transactional note storage and cursor-paginated listing

pub mod fields;
pub mod hashing;
pub mod listing;
pub mod models;
pub mod reviewables;
pub mod storage;
pub mod synthesis;

pub use fields::{reconcile_fields, FieldPlan};
pub use listing::list_notes;
pub use models::*;
pub use reviewables::{reconcile_reviewables, ReviewablePlan};
pub use storage::{
    create_note, get_fields_for_note, get_note, get_reviewables_for_note, update_note,
};
pub use synthesis::{synthesize_reviewables, SeparablePolicy};
