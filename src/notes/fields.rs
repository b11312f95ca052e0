//! Field reconciliation.
//!
//! Matches a note's stored fields against a desired layout by content hash.
//! Fields sharing a hash are aligned by their order of occurrence, so moving
//! a value to another position or side keeps its row (and every reviewable
//! and review that points at it).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::hashing::content_hash;
use super::models::{Field, Side};
use crate::errors::ValidationError;

/// A field row to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewField {
    pub side: Side,
    pub position: u32,
    pub value: String,
    pub hash: String,
}

/// Move an existing row to a new slot; always leaves it unarchived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMove {
    pub id: i64,
    pub side: Side,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPlan {
    pub to_insert: Vec<NewField>,
    pub to_update: Vec<FieldMove>,
    pub to_archive: Vec<i64>,
}

impl FieldPlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_archive.is_empty()
    }
}

/// Check that a layout has exactly two non-empty sides with non-empty values
pub fn validate_layout(sides: &[Vec<String>]) -> Result<(), ValidationError> {
    if sides.len() != 2 {
        return Err(ValidationError::SideCount(sides.len()));
    }

    for (side, values) in Side::ALL.into_iter().zip(sides) {
        if values.is_empty() {
            return Err(ValidationError::EmptySide(side));
        }
        if let Some(position) = values.iter().position(|v| v.is_empty()) {
            return Err(ValidationError::EmptyValue {
                side,
                position: position as u32,
            });
        }
    }

    Ok(())
}

/// A desired occurrence of a value
#[derive(Debug, Clone, Copy)]
struct Slot<'a> {
    side: Side,
    position: u32,
    value: &'a str,
}

/// Plan the inserts, moves and archives that turn `current` into `desired`.
///
/// `current` should hold every field of the note, archived ones included,
/// so that reintroduced content revives its old row.
pub fn reconcile_fields(
    current: &[Field],
    desired: &[Vec<String>],
) -> Result<FieldPlan, ValidationError> {
    validate_layout(desired)?;

    let mut current_by_hash: BTreeMap<&str, Vec<&Field>> = BTreeMap::new();
    for field in current {
        current_by_hash.entry(field.hash.as_str()).or_default().push(field);
    }
    // Live rows first so an unchanged layout always matches itself
    for bucket in current_by_hash.values_mut() {
        bucket.sort_by_key(|f| (f.archived, f.position, f.side, f.id));
    }

    let mut desired_by_hash: BTreeMap<String, Vec<Slot<'_>>> = BTreeMap::new();
    for (side, values) in Side::ALL.into_iter().zip(desired) {
        for (position, value) in values.iter().enumerate() {
            desired_by_hash
                .entry(content_hash(value))
                .or_default()
                .push(Slot {
                    side,
                    position: position as u32,
                    value,
                });
        }
    }

    let hashes: BTreeSet<&str> = current_by_hash
        .keys()
        .copied()
        .chain(desired_by_hash.keys().map(String::as_str))
        .collect();

    let mut plan = FieldPlan::default();
    for hash in hashes {
        let have = current_by_hash.get(hash).map(Vec::as_slice).unwrap_or(&[]);
        let want = desired_by_hash.get(hash).map(Vec::as_slice).unwrap_or(&[]);

        for i in 0..have.len().max(want.len()) {
            match (have.get(i), want.get(i)) {
                (Some(field), Some(slot)) => {
                    if field.archived || field.side != slot.side || field.position != slot.position {
                        plan.to_update.push(FieldMove {
                            id: field.id,
                            side: slot.side,
                            position: slot.position,
                        });
                    }
                }
                (None, Some(slot)) => plan.to_insert.push(NewField {
                    side: slot.side,
                    position: slot.position,
                    value: slot.value.to_string(),
                    hash: hash.to_string(),
                }),
                (Some(field), None) => {
                    if !field.archived {
                        plan.to_archive.push(field.id);
                    }
                }
                (None, None) => {}
            }
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn field(id: i64, side: Side, position: u32, value: &str) -> Field {
        Field {
            id,
            note: 1,
            side,
            position,
            value: value.to_string(),
            hash: content_hash(value),
            archived: false,
            created_at: Utc::now(),
        }
    }

    fn layout(front: &[&str], back: &[&str]) -> Vec<Vec<String>> {
        vec![
            front.iter().map(|s| s.to_string()).collect(),
            back.iter().map(|s| s.to_string()).collect(),
        ]
    }

    #[test]
    fn test_new_note_inserts_everything() {
        let plan = reconcile_fields(&[], &layout(&["Front"], &["Back", "More"])).unwrap();

        assert_eq!(plan.to_insert.len(), 3);
        assert!(plan.to_update.is_empty());
        assert!(plan.to_archive.is_empty());

        let more = plan.to_insert.iter().find(|f| f.value == "More").unwrap();
        assert_eq!((more.side, more.position), (Side::Back, 1));
    }

    #[test]
    fn test_same_layout_is_a_no_op() {
        let current = vec![
            field(1, Side::Front, 0, "Front"),
            field(2, Side::Back, 0, "Back"),
            field(3, Side::Back, 1, "Back"),
        ];

        let plan = reconcile_fields(&current, &layout(&["Front"], &["Back", "Back"])).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_changed_value_archives_and_inserts() {
        let current = vec![field(1, Side::Front, 0, "Front"), field(2, Side::Back, 0, "Back")];

        let plan = reconcile_fields(&current, &layout(&["Front2"], &["Back"])).unwrap();

        assert_eq!(plan.to_archive, vec![1]);
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!(plan.to_insert[0].value, "Front2");
        assert_eq!(plan.to_insert[0].hash, content_hash("Front2"));
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn test_moving_value_between_sides_keeps_row() {
        let current = vec![field(1, Side::Front, 0, "A"), field(2, Side::Back, 0, "B")];

        let plan = reconcile_fields(&current, &layout(&["B"], &["A"])).unwrap();

        assert!(plan.to_insert.is_empty());
        assert!(plan.to_archive.is_empty());
        assert_eq!(plan.to_update.len(), 2);
        assert!(plan.to_update.contains(&FieldMove { id: 1, side: Side::Back, position: 0 }));
        assert!(plan.to_update.contains(&FieldMove { id: 2, side: Side::Front, position: 0 }));
    }

    #[test]
    fn test_archived_value_is_revived_in_place() {
        let mut old = field(1, Side::Front, 0, "Front");
        old.archived = true;
        let current = vec![old, field(2, Side::Front, 0, "Other"), field(3, Side::Back, 0, "Back")];

        let plan = reconcile_fields(&current, &layout(&["Front"], &["Back"])).unwrap();

        assert_eq!(plan.to_update, vec![FieldMove { id: 1, side: Side::Front, position: 0 }]);
        assert_eq!(plan.to_archive, vec![2]);
        assert!(plan.to_insert.is_empty());
    }

    #[test]
    fn test_duplicates_align_by_occurrence() {
        let current = vec![
            field(1, Side::Front, 0, "X"),
            field(2, Side::Front, 1, "X"),
            field(3, Side::Back, 0, "Y"),
        ];

        // One X goes away: the later occurrence is archived
        let plan = reconcile_fields(&current, &layout(&["X"], &["Y"])).unwrap();
        assert_eq!(plan.to_archive, vec![2]);
        assert!(plan.to_update.is_empty());

        // A third X appears: only one insert
        let plan = reconcile_fields(&current, &layout(&["X", "X"], &["Y", "X"])).unwrap();
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!((plan.to_insert[0].side, plan.to_insert[0].position), (Side::Back, 1));
    }

    #[test]
    fn test_archived_duplicate_does_not_displace_live_row() {
        let mut stale = field(1, Side::Back, 0, "X");
        stale.archived = true;
        let current = vec![stale, field(2, Side::Front, 0, "X"), field(3, Side::Back, 0, "Y")];

        let plan = reconcile_fields(&current, &layout(&["X"], &["Y"])).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_reorder_within_side_moves_rows() {
        let current = vec![field(1, Side::Front, 0, "A"), field(2, Side::Front, 1, "B"), field(3, Side::Back, 0, "C")];

        let plan = reconcile_fields(&current, &layout(&["B", "A"], &["C"])).unwrap();

        assert!(plan.to_insert.is_empty());
        assert!(plan.to_archive.is_empty());
        assert!(plan.to_update.contains(&FieldMove { id: 1, side: Side::Front, position: 1 }));
        assert!(plan.to_update.contains(&FieldMove { id: 2, side: Side::Front, position: 0 }));
    }

    #[test]
    fn test_invalid_layouts_are_rejected() {
        assert_eq!(
            reconcile_fields(&[], &[vec!["only".to_string()]]),
            Err(ValidationError::SideCount(1))
        );
        assert_eq!(
            reconcile_fields(&[], &layout(&["Front"], &[])),
            Err(ValidationError::EmptySide(Side::Back))
        );
        assert_eq!(
            reconcile_fields(&[], &layout(&["Front", ""], &["Back"])),
            Err(ValidationError::EmptyValue { side: Side::Front, position: 1 })
        );
    }
}
