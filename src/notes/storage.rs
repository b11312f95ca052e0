//! Note persistence.
//!
//! Every write path runs field reconciliation, reviewable synthesis and
//! reviewable reconciliation against a single transaction handle, so an edit
//! either lands completely or not at all.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use super::fields::{reconcile_fields, validate_layout, FieldPlan};
use super::models::*;
use super::reviewables::reconcile_reviewables;
use super::synthesis::{synthesize_reviewables, SeparablePolicy};
use crate::errors::{RecallError, Result, ValidationError};
use crate::storage::{column_time, to_millis, Database};

pub(crate) const FIELD_COLUMNS: &str =
    "id, note, side, position, value, hash, is_archived, created_at";

pub(crate) fn field_from_row(row: &Row<'_>) -> rusqlite::Result<Field> {
    Ok(Field {
        id: row.get(0)?,
        note: row.get(1)?,
        side: row.get(2)?,
        position: row.get(3)?,
        value: row.get(4)?,
        hash: row.get(5)?,
        archived: row.get(6)?,
        created_at: column_time(row, 7)?,
    })
}

pub(crate) fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        reversible: row.get(1)?,
        separable: row.get(2)?,
        created_at: column_time(row, 3)?,
    })
}

fn reviewable_from_row(row: &Row<'_>) -> rusqlite::Result<Reviewable> {
    Ok(Reviewable {
        id: row.get(0)?,
        note: row.get(1)?,
        archived: row.get(2)?,
        created_at: column_time(row, 3)?,
    })
}

/// Group fields by side, each side ordered by position
pub(crate) fn group_by_side(fields: impl IntoIterator<Item = Field>) -> [Vec<Field>; 2] {
    let mut grouped: [Vec<Field>; 2] = Default::default();
    for field in fields {
        grouped[field.side.index()].push(field);
    }
    for side in grouped.iter_mut() {
        side.sort_by_key(|f| (f.position, f.id));
    }
    grouped
}

// ==================== Validation ====================

pub fn validate_create(input: &CreateNote) -> std::result::Result<(), ValidationError> {
    if input.collections.is_empty() {
        return Err(ValidationError::NoCollections);
    }
    validate_layout(&input.sides)
}

pub fn validate_update(input: &UpdateNote) -> std::result::Result<(), ValidationError> {
    if matches!(&input.collections, Some(c) if c.is_empty()) {
        return Err(ValidationError::NoCollections);
    }
    if let Some(sides) = &input.sides {
        validate_layout(sides)?;
    }
    Ok(())
}

// ==================== Queries ====================

/// Load a note row
pub fn get_note_row(conn: &Connection, id: i64) -> Result<Note> {
    conn.query_row(
        "SELECT id, is_reversible, is_separable, created_at FROM note WHERE id = ?1",
        params![id],
        note_from_row,
    )
    .optional()?
    .ok_or(RecallError::NoteNotFound(id))
}

/// Every field of a note, archived ones included
pub fn get_fields_for_note(conn: &Connection, note: i64) -> Result<Vec<Field>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM note_field WHERE note = ?1 ORDER BY side, position, id",
        FIELD_COLUMNS
    ))?;
    let fields = stmt
        .query_map(params![note], field_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(fields)
}

/// Every reviewable of a note, optionally with its field links
pub fn get_reviewables_for_note(
    conn: &Connection,
    note: i64,
    with_fields: bool,
) -> Result<Vec<ReviewableWithFields>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, note, is_archived, created_at FROM reviewable WHERE note = ?1 ORDER BY id",
    )?;
    let reviewables = stmt
        .query_map(params![note], reviewable_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut links: HashMap<i64, Vec<ReviewableField>> = HashMap::new();
    if with_fields {
        let mut stmt = conn.prepare_cached(
            "SELECT rf.id, rf.reviewable, rf.field, rf.side, rf.created_at
             FROM reviewable_field rf
             JOIN reviewable r ON r.id = rf.reviewable
             JOIN note_field f ON f.id = rf.field
             WHERE r.note = ?1
             ORDER BY rf.reviewable, rf.side, f.position, rf.id",
        )?;
        let rows = stmt.query_map(params![note], |row| {
            Ok(ReviewableField {
                id: row.get(0)?,
                reviewable: row.get(1)?,
                field: row.get(2)?,
                side: row.get(3)?,
                created_at: column_time(row, 4)?,
            })
        })?;
        for link in rows {
            let link = link?;
            links.entry(link.reviewable).or_default().push(link);
        }
    }

    Ok(reviewables
        .into_iter()
        .map(|reviewable| ReviewableWithFields {
            fields: links.remove(&reviewable.id).unwrap_or_default(),
            reviewable,
        })
        .collect())
}

pub(crate) fn get_note_collections(conn: &Connection, note: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT collection FROM note_collection WHERE note = ?1 ORDER BY collection",
    )?;
    let ids = stmt
        .query_map(params![note], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

/// Attach collections and live fields to a note row
pub(crate) fn with_fields(conn: &Connection, note: Note) -> Result<NoteWithFields> {
    let fields = get_fields_for_note(conn, note.id)?
        .into_iter()
        .filter(|f| !f.archived);
    Ok(NoteWithFields {
        collections: get_note_collections(conn, note.id)?,
        fields: group_by_side(fields),
        note,
    })
}

/// A note with its live fields
pub fn get_note(conn: &Connection, id: i64) -> Result<NoteWithFields> {
    let note = get_note_row(conn, id)?;
    with_fields(conn, note)
}

// ==================== Writes ====================

/// Create a note, its fields and the reviewables derived from them
pub fn create_note(
    tx: &Transaction<'_>,
    input: &CreateNote,
    policy: SeparablePolicy,
) -> Result<NoteEdit> {
    validate_create(input)?;
    let now = to_millis(Utc::now());

    tx.execute(
        "INSERT INTO note (is_reversible, is_separable, created_at) VALUES (?1, ?2, ?3)",
        params![input.config.reversible, input.config.separable, now],
    )?;
    let id = tx.last_insert_rowid();

    set_collections(tx, id, &input.collections, now)?;

    let plan = reconcile_fields(&[], &input.sides)?;
    let mut summary = EditSummary::default();
    apply_field_plan(tx, id, &plan, now, &mut summary)?;
    sync_reviewables(tx, id, input.config, policy, now, &mut summary)?;

    log::debug!("Created note {} ({:?})", id, summary);
    Ok(NoteEdit {
        note: get_note(tx, id)?,
        summary,
    })
}

/// Apply a partial update to a note and re-derive its reviewables
pub fn update_note(
    tx: &Transaction<'_>,
    id: i64,
    input: &UpdateNote,
    policy: SeparablePolicy,
) -> Result<NoteEdit> {
    validate_update(input)?;
    let now = to_millis(Utc::now());

    let mut note = get_note_row(tx, id)?;
    if let Some(reversible) = input.reversible {
        note.reversible = reversible;
    }
    if let Some(separable) = input.separable {
        note.separable = separable;
    }
    tx.execute(
        "UPDATE note SET is_reversible = ?1, is_separable = ?2 WHERE id = ?3",
        params![note.reversible, note.separable, id],
    )?;

    if let Some(collections) = &input.collections {
        tx.execute("DELETE FROM note_collection WHERE note = ?1", params![id])?;
        set_collections(tx, id, collections, now)?;
    }

    let mut summary = EditSummary::default();
    if let Some(sides) = &input.sides {
        let current = get_fields_for_note(tx, id)?;
        let plan = reconcile_fields(&current, sides)?;
        apply_field_plan(tx, id, &plan, now, &mut summary)?;
    }

    // Config alone can change the desired set, so this always runs
    sync_reviewables(tx, id, note.config(), policy, now, &mut summary)?;

    log::debug!("Updated note {} ({:?})", id, summary);
    Ok(NoteEdit {
        note: get_note(tx, id)?,
        summary,
    })
}

fn set_collections(tx: &Transaction<'_>, note: i64, collections: &[i64], now: i64) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR IGNORE INTO note_collection (note, collection, created_at) VALUES (?1, ?2, ?3)",
    )?;
    for collection in collections {
        stmt.execute(params![note, collection, now])?;
    }
    Ok(())
}

fn apply_field_plan(
    tx: &Transaction<'_>,
    note: i64,
    plan: &FieldPlan,
    now: i64,
    summary: &mut EditSummary,
) -> Result<()> {
    let mut insert = tx.prepare_cached(
        "INSERT INTO note_field (note, value, hash, side, position, is_archived, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
    )?;
    for field in &plan.to_insert {
        insert.execute(params![note, field.value, field.hash, field.side, field.position, now])?;
    }

    let mut update = tx.prepare_cached(
        "UPDATE note_field SET side = ?1, position = ?2, is_archived = 0 WHERE id = ?3 AND note = ?4",
    )?;
    for field in &plan.to_update {
        update.execute(params![field.side, field.position, field.id, note])?;
    }

    let mut archive =
        tx.prepare_cached("UPDATE note_field SET is_archived = 1 WHERE id = ?1 AND note = ?2")?;
    for id in &plan.to_archive {
        archive.execute(params![id, note])?;
    }

    summary.fields_inserted += plan.to_insert.len();
    summary.fields_updated += plan.to_update.len();
    summary.fields_archived += plan.to_archive.len();
    Ok(())
}

fn sync_reviewables(
    tx: &Transaction<'_>,
    note: i64,
    config: NoteConfig,
    policy: SeparablePolicy,
    now: i64,
    summary: &mut EditSummary,
) -> Result<()> {
    let live = get_fields_for_note(tx, note)?
        .into_iter()
        .filter(|f| !f.archived);
    let desired = synthesize_reviewables(&group_by_side(live), config, policy);
    let current = get_reviewables_for_note(tx, note, true)?;
    let plan = reconcile_reviewables(&current, &desired);

    let mut insert_reviewable = tx.prepare_cached(
        "INSERT INTO reviewable (note, is_archived, created_at) VALUES (?1, 0, ?2)",
    )?;
    let mut insert_link = tx.prepare_cached(
        "INSERT INTO reviewable_field (reviewable, field, side, created_at) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for spec in &plan.to_insert {
        insert_reviewable.execute(params![note, now])?;
        let reviewable = tx.last_insert_rowid();
        for role in &spec.roles {
            insert_link.execute(params![reviewable, role.field, role.side, now])?;
        }
    }

    let mut set_archived =
        tx.prepare_cached("UPDATE reviewable SET is_archived = ?1 WHERE id = ?2 AND note = ?3")?;
    for id in &plan.to_archive {
        set_archived.execute(params![true, id, note])?;
    }
    for id in &plan.to_unarchive {
        set_archived.execute(params![false, id, note])?;
    }

    summary.reviewables_inserted += plan.to_insert.len();
    summary.reviewables_archived += plan.to_archive.len();
    summary.reviewables_unarchived += plan.to_unarchive.len();
    Ok(())
}

impl Database {
    /// Validate and create a note in its own transaction
    pub fn create_note(&mut self, input: &CreateNote, policy: SeparablePolicy) -> Result<NoteEdit> {
        validate_create(input)?;
        self.write(|tx| create_note(tx, input, policy))
    }

    /// Validate and update a note in its own transaction
    pub fn update_note(
        &mut self,
        id: i64,
        input: &UpdateNote,
        policy: SeparablePolicy,
    ) -> Result<NoteEdit> {
        validate_update(input)?;
        self.write(|tx| update_note(tx, id, input, policy))
    }

    pub fn get_note(&self, id: i64) -> Result<NoteWithFields> {
        get_note(self.conn(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::create_collection;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let collection = create_collection(db.conn(), "Default").unwrap();
        (db, collection.id)
    }

    fn sides(front: &[&str], back: &[&str]) -> Vec<Vec<String>> {
        vec![
            front.iter().map(|s| s.to_string()).collect(),
            back.iter().map(|s| s.to_string()).collect(),
        ]
    }

    fn create(db: &mut Database, collection: i64, front: &[&str], back: &[&str], config: NoteConfig) -> NoteEdit {
        db.create_note(
            &CreateNote {
                collections: vec![collection],
                sides: sides(front, back),
                config,
            },
            SeparablePolicy::default(),
        )
        .unwrap()
    }

    fn values(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.value.as_str()).collect()
    }

    fn count(db: &Database, sql: &str) -> i64 {
        db.conn().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_create_basic_note() {
        let (mut db, collection) = setup();

        let edit = create(&mut db, collection, &["Front"], &["Back"], NoteConfig::default());

        assert_eq!(values(&edit.note.fields[0]), vec!["Front"]);
        assert_eq!(values(&edit.note.fields[1]), vec!["Back"]);
        assert_eq!(edit.note.collections, vec![collection]);
        assert_eq!(edit.summary.fields_inserted, 2);
        assert_eq!(edit.summary.reviewables_inserted, 1);

        let reviewables = get_reviewables_for_note(db.conn(), edit.note.note.id, true).unwrap();
        assert_eq!(reviewables.len(), 1);
        let spec = reviewables[0].spec();
        assert_eq!(spec.fields_on(Side::Front), vec![edit.note.fields[0][0].id]);
        assert_eq!(spec.fields_on(Side::Back), vec![edit.note.fields[1][0].id]);
    }

    #[test]
    fn test_changing_a_value_replaces_field_and_reviewable() {
        let (mut db, collection) = setup();
        let edit = create(&mut db, collection, &["Front"], &["Back"], NoteConfig::default());
        let note = edit.note.note.id;
        let old_front = edit.note.fields[0][0].id;
        let back = edit.note.fields[1][0].clone();
        let old_reviewable = get_reviewables_for_note(db.conn(), note, false).unwrap()[0].reviewable.id;

        let update = UpdateNote {
            sides: Some(sides(&["Front2"], &["Back"])),
            ..Default::default()
        };
        let edit = db.update_note(note, &update, SeparablePolicy::default()).unwrap();

        assert_eq!(edit.summary.fields_inserted, 1);
        assert_eq!(edit.summary.fields_archived, 1);
        assert_eq!(edit.summary.fields_updated, 0);
        assert_eq!(edit.summary.reviewables_inserted, 1);
        assert_eq!(edit.summary.reviewables_archived, 1);
        assert_eq!(edit.note.fields[1][0], back);

        let all_fields = get_fields_for_note(db.conn(), note).unwrap();
        let old = all_fields.iter().find(|f| f.id == old_front).unwrap();
        assert!(old.archived);

        let reviewables = get_reviewables_for_note(db.conn(), note, true).unwrap();
        assert_eq!(reviewables.len(), 2);
        assert!(reviewables.iter().find(|r| r.reviewable.id == old_reviewable).unwrap().reviewable.archived);
        let live: Vec<_> = reviewables.iter().filter(|r| !r.reviewable.archived).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].spec().fields_on(Side::Front), vec![edit.note.fields[0][0].id]);
        assert_eq!(live[0].spec().fields_on(Side::Back), vec![back.id]);
    }

    #[test]
    fn test_toggling_reversible_reuses_fields() {
        let (mut db, collection) = setup();
        let edit = create(&mut db, collection, &["Front"], &["Back"], NoteConfig::default());
        let note = edit.note.note.id;
        let (front, back) = (edit.note.fields[0][0].id, edit.note.fields[1][0].id);

        let update = UpdateNote {
            reversible: Some(true),
            ..Default::default()
        };
        let edit = db.update_note(note, &update, SeparablePolicy::default()).unwrap();

        assert!(edit.note.note.reversible);
        assert_eq!(edit.summary.fields_inserted, 0);
        assert_eq!(edit.summary.reviewables_inserted, 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM note_field"), 2);

        let reviewables = get_reviewables_for_note(db.conn(), note, true).unwrap();
        assert_eq!(reviewables.len(), 2);
        let reversed = reviewables[1].spec();
        assert_eq!(reversed.fields_on(Side::Front), vec![back]);
        assert_eq!(reversed.fields_on(Side::Back), vec![front]);

        // And back again: the reversed reviewable is archived, not deleted
        let update = UpdateNote {
            reversible: Some(false),
            ..Default::default()
        };
        let edit = db.update_note(note, &update, SeparablePolicy::default()).unwrap();
        assert_eq!(edit.summary.reviewables_archived, 1);

        // Re-enabling revives the same row
        let update = UpdateNote {
            reversible: Some(true),
            ..Default::default()
        };
        let edit = db.update_note(note, &update, SeparablePolicy::default()).unwrap();
        assert_eq!(edit.summary.reviewables_unarchived, 1);
        assert_eq!(edit.summary.reviewables_inserted, 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM reviewable"), 2);
    }

    #[test]
    fn test_resubmitting_same_layout_changes_nothing() {
        let (mut db, collection) = setup();
        let config = NoteConfig {
            reversible: true,
            separable: true,
        };
        let edit = create(&mut db, collection, &["A", "B"], &["C", "D", "C"], config);
        let note = edit.note.note.id;

        let update = UpdateNote {
            sides: Some(edit.note.sides()),
            reversible: Some(true),
            separable: Some(true),
            collections: None,
        };
        let again = db.update_note(note, &update, SeparablePolicy::default()).unwrap();

        assert!(again.summary.is_empty(), "{:?}", again.summary);
        assert_eq!(again.note, edit.note);
    }

    #[test]
    fn test_reintroduced_value_restores_same_row() {
        let (mut db, collection) = setup();
        let edit = create(&mut db, collection, &["Front"], &["Back"], NoteConfig::default());
        let note = edit.note.note.id;
        let original = edit.note.fields[0][0].id;
        let original_reviewable = get_reviewables_for_note(db.conn(), note, false).unwrap()[0].reviewable.id;

        let update = UpdateNote {
            sides: Some(sides(&["Other"], &["Back"])),
            ..Default::default()
        };
        db.update_note(note, &update, SeparablePolicy::default()).unwrap();

        let update = UpdateNote {
            sides: Some(sides(&["Front"], &["Back"])),
            ..Default::default()
        };
        let edit = db.update_note(note, &update, SeparablePolicy::default()).unwrap();

        assert_eq!(edit.note.fields[0][0].id, original);
        assert_eq!(edit.summary.fields_inserted, 0);
        assert_eq!(edit.summary.fields_updated, 1);
        assert_eq!(edit.summary.reviewables_unarchived, 1);

        let live: Vec<_> = get_reviewables_for_note(db.conn(), note, false)
            .unwrap()
            .into_iter()
            .filter(|r| !r.reviewable.archived)
            .collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].reviewable.id, original_reviewable);
    }

    #[test]
    fn test_separable_note_splits_answers() {
        let (mut db, collection) = setup();
        let config = NoteConfig {
            reversible: false,
            separable: true,
        };
        let edit = create(&mut db, collection, &["Capital of France"], &["Paris", "Paree"], config);

        assert_eq!(edit.summary.reviewables_inserted, 2);
    }

    #[test]
    fn test_validation_errors_write_nothing() {
        let (mut db, collection) = setup();

        let err = db
            .create_note(
                &CreateNote {
                    collections: vec![],
                    sides: sides(&["Front"], &["Back"]),
                    config: NoteConfig::default(),
                },
                SeparablePolicy::default(),
            )
            .unwrap_err();
        assert!(matches!(err, RecallError::Validation(ValidationError::NoCollections)));

        let err = db
            .create_note(
                &CreateNote {
                    collections: vec![collection],
                    sides: sides(&["Front"], &[""]),
                    config: NoteConfig::default(),
                },
                SeparablePolicy::default(),
            )
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(count(&db, "SELECT COUNT(*) FROM note"), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM note_field"), 0);
    }

    #[test]
    fn test_unknown_collection_rolls_back() {
        let (mut db, collection) = setup();

        let err = db
            .create_note(
                &CreateNote {
                    collections: vec![collection, 999],
                    sides: sides(&["Front"], &["Back"]),
                    config: NoteConfig::default(),
                },
                SeparablePolicy::default(),
            )
            .unwrap_err();

        assert!(matches!(err, RecallError::ConstraintViolation(_)));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM note"), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM note_collection"), 0);
    }

    #[test]
    fn test_update_unknown_note() {
        let (mut db, _) = setup();

        let err = db
            .update_note(42, &UpdateNote::default(), SeparablePolicy::default())
            .unwrap_err();
        assert!(matches!(err, RecallError::NoteNotFound(42)));
    }

    #[test]
    fn test_update_replaces_collections() {
        let (mut db, collection) = setup();
        let other = create_collection(db.conn(), "Other").unwrap();
        let edit = create(&mut db, collection, &["Front"], &["Back"], NoteConfig::default());

        let update = UpdateNote {
            collections: Some(vec![other.id]),
            ..Default::default()
        };
        let edit = db
            .update_note(edit.note.note.id, &update, SeparablePolicy::default())
            .unwrap();

        assert_eq!(edit.note.collections, vec![other.id]);
        assert!(edit.summary.is_empty());
    }
}
