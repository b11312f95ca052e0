//! Review persistence
//!
//! Reviews and snapshots are append-only. Recording a review writes both
//! rows in the caller's transaction; the latest snapshot of a reviewable is
//! the one with the newest `created_at` (highest id on ties).

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use super::algorithm::Scheduler;
use super::models::*;
use crate::errors::{RecallError, Result, ValidationError};
use crate::storage::{column_time, from_millis, to_millis, Database};

const REVIEW_COLUMNS: &str = "id, reviewable, rating, duration, created_at, created_at_offset,
    is_due_fuzzed, is_learning_enabled, max_interval, retention, weights";

const SNAPSHOT_COLUMNS: &str =
    "id, reviewable, review, difficulty, stability, due, state, created_at";

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let weights: String = row.get(10)?;
    let weights = serde_json::from_str(&weights)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(Review {
        id: row.get(0)?,
        reviewable: row.get(1)?,
        rating: row.get(2)?,
        duration_ms: row.get(3)?,
        created_at: column_time(row, 4)?,
        created_at_offset: row.get(5)?,
        config: ReviewConfig {
            due_fuzzed: row.get(6)?,
            learning_enabled: row.get(7)?,
            max_interval: row.get(8)?,
            retention: row.get(9)?,
            weights,
        },
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewableSnapshot> {
    Ok(ReviewableSnapshot {
        id: row.get(0)?,
        reviewable: row.get(1)?,
        review: row.get(2)?,
        difficulty: row.get(3)?,
        stability: row.get(4)?,
        due: column_time(row, 5)?,
        state: row.get(6)?,
        created_at: column_time(row, 7)?,
    })
}

pub(crate) fn get_snapshot(conn: &Connection, id: i64) -> Result<ReviewableSnapshot> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM reviewable_snapshot WHERE id = ?1",
        SNAPSHOT_COLUMNS
    ))?;
    let snapshot = stmt.query_row(params![id], snapshot_from_row)?;
    Ok(snapshot)
}

/// The scheduling state a reviewable is currently in, if it was ever reviewed
pub fn latest_snapshot(conn: &Connection, reviewable: i64) -> Result<Option<ReviewableSnapshot>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM reviewable_snapshot WHERE reviewable = ?1
         ORDER BY created_at DESC, id DESC LIMIT 1",
        SNAPSHOT_COLUMNS
    ))?;
    let snapshot = stmt
        .query_row(params![reviewable], snapshot_from_row)
        .optional()?;
    Ok(snapshot)
}

/// Review history of a reviewable, oldest first
pub fn list_reviews(conn: &Connection, reviewable: i64) -> Result<Vec<Review>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM review WHERE reviewable = ?1 ORDER BY created_at, id",
        REVIEW_COLUMNS
    ))?;
    let reviews = stmt
        .query_map(params![reviewable], review_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(reviews)
}

/// Snapshot history of a reviewable, oldest first
pub fn list_snapshots(conn: &Connection, reviewable: i64) -> Result<Vec<ReviewableSnapshot>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM reviewable_snapshot WHERE reviewable = ?1 ORDER BY created_at, id",
        SNAPSHOT_COLUMNS
    ))?;
    let snapshots = stmt
        .query_map(params![reviewable], snapshot_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(snapshots)
}

pub fn validate_review(input: &RecordReview, config: &ReviewConfig) -> std::result::Result<(), ValidationError> {
    if input.duration_ms <= 0 {
        return Err(ValidationError::InvalidDuration(input.duration_ms));
    }
    config.validate()
}

/// Record an answer and the scheduling state it leads to.
///
/// The reviewable must exist and not be archived.
pub fn record_review(
    tx: &Transaction<'_>,
    input: &RecordReview,
    config: &ReviewConfig,
    scheduler: &dyn Scheduler,
) -> Result<RecordedReview> {
    validate_review(input, config)?;

    let archived: Option<bool> = tx
        .query_row(
            "SELECT is_archived FROM reviewable WHERE id = ?1",
            params![input.reviewable],
            |row| row.get(0),
        )
        .optional()?;
    if archived != Some(false) {
        return Err(RecallError::ReviewableNotFound(input.reviewable));
    }

    let now = from_millis(to_millis(input.reviewed_at.with_timezone(&Utc)))?;
    let offset = input.reviewed_at.format("%:z").to_string();
    let previous = latest_snapshot(tx, input.reviewable)?;
    let scheduled = scheduler.schedule(config, previous.as_ref(), input.rating, now);

    tx.execute(
        "INSERT INTO review (reviewable, rating, duration, created_at, created_at_offset,
            is_due_fuzzed, is_learning_enabled, max_interval, retention, weights)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            input.reviewable,
            input.rating,
            input.duration_ms,
            to_millis(now),
            offset,
            config.due_fuzzed,
            config.learning_enabled,
            config.max_interval,
            config.retention,
            serde_json::to_string(&config.weights)?,
        ],
    )?;
    let review_id = tx.last_insert_rowid();

    let due = from_millis(to_millis(scheduled.due))?;
    tx.execute(
        "INSERT INTO reviewable_snapshot (reviewable, review, difficulty, stability, due, state, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.reviewable,
            review_id,
            scheduled.difficulty,
            scheduled.stability,
            to_millis(due),
            scheduled.state,
            to_millis(now),
        ],
    )?;
    let snapshot_id = tx.last_insert_rowid();

    log::info!(
        "Recorded {:?} for reviewable {} (next due {}, {:?})",
        input.rating,
        input.reviewable,
        due,
        scheduled.state
    );

    Ok(RecordedReview {
        review: Review {
            id: review_id,
            reviewable: input.reviewable,
            rating: input.rating,
            duration_ms: input.duration_ms,
            created_at: now,
            created_at_offset: offset,
            config: config.clone(),
        },
        snapshot: ReviewableSnapshot {
            id: snapshot_id,
            reviewable: input.reviewable,
            review: review_id,
            difficulty: scheduled.difficulty,
            stability: scheduled.stability,
            due,
            state: scheduled.state,
            created_at: now,
        },
    })
}

impl Database {
    pub fn record_review(
        &mut self,
        input: &RecordReview,
        config: &ReviewConfig,
        scheduler: &dyn Scheduler,
    ) -> Result<RecordedReview> {
        validate_review(input, config)?;
        self.write(|tx| record_review(tx, input, config, scheduler))
    }

    pub fn list_reviews(&self, reviewable: i64) -> Result<Vec<Review>> {
        list_reviews(self.conn(), reviewable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{get_reviewables_for_note, CreateNote, NoteConfig, SeparablePolicy, UpdateNote};
    use crate::review::IntervalScheduler;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};

    fn setup() -> (Database, i64) {
        let mut db = Database::open_in_memory().unwrap();
        let collection = db.create_collection("Default").unwrap().id;
        let edit = db
            .create_note(
                &CreateNote {
                    collections: vec![collection],
                    sides: vec![vec!["Katze".to_string()], vec!["cat".to_string()]],
                    config: NoteConfig::default(),
                },
                SeparablePolicy::default(),
            )
            .unwrap();
        let reviewable = get_reviewables_for_note(db.conn(), edit.note.note.id, false).unwrap()[0]
            .reviewable
            .id;
        (db, reviewable)
    }

    fn answer(reviewable: i64, rating: Rating, at: DateTime<FixedOffset>) -> RecordReview {
        RecordReview {
            reviewable,
            rating,
            duration_ms: 4200,
            reviewed_at: at,
        }
    }

    fn local(hours: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(hours * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_record_first_review() {
        let (mut db, reviewable) = setup();
        let at = local(2);

        let recorded = db
            .record_review(&answer(reviewable, Rating::Good, at), &ReviewConfig::default(), &IntervalScheduler)
            .unwrap();

        assert_eq!(recorded.review.created_at_offset, "+02:00");
        assert_eq!(recorded.review.created_at, at.with_timezone(&Utc));
        assert_eq!(recorded.snapshot.review, recorded.review.id);
        assert_eq!(recorded.snapshot.state, ReviewState::Learning);
        assert_eq!(recorded.snapshot.due, at.with_timezone(&Utc) + Duration::days(1));

        let stored = latest_snapshot(db.conn(), reviewable).unwrap().unwrap();
        assert_eq!(stored, recorded.snapshot);

        let reviews = db.list_reviews(reviewable).unwrap();
        assert_eq!(reviews, vec![recorded.review]);
    }

    #[test]
    fn test_negative_offset_is_kept() {
        let (mut db, reviewable) = setup();

        let recorded = db
            .record_review(&answer(reviewable, Rating::Hard, local(-5)), &ReviewConfig::default(), &IntervalScheduler)
            .unwrap();

        assert_eq!(recorded.review.created_at_offset, "-05:00");
    }

    #[test]
    fn test_successive_reviews_build_on_latest_snapshot() {
        let (mut db, reviewable) = setup();
        let config = ReviewConfig::default();
        let first = local(0);

        db.record_review(&answer(reviewable, Rating::Good, first), &config, &IntervalScheduler)
            .unwrap();
        let second = db
            .record_review(
                &answer(reviewable, Rating::Good, first + Duration::days(1)),
                &config,
                &IntervalScheduler,
            )
            .unwrap();

        assert_eq!(second.snapshot.state, ReviewState::Review);
        assert_eq!(second.snapshot.stability, 6.0);
        assert_eq!(list_snapshots(db.conn(), reviewable).unwrap().len(), 2);
    }

    #[test]
    fn test_config_is_stored_with_review() {
        let (mut db, reviewable) = setup();
        let config = ReviewConfig {
            due_fuzzed: true,
            learning_enabled: false,
            max_interval: 180,
            retention: 85,
            ..Default::default()
        };

        db.record_review(&answer(reviewable, Rating::Easy, local(1)), &config, &IntervalScheduler)
            .unwrap();

        let reviews = db.list_reviews(reviewable).unwrap();
        assert_eq!(reviews[0].config, config);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let (mut db, reviewable) = setup();

        let mut input = answer(reviewable, Rating::Good, local(0));
        input.duration_ms = 0;
        let err = db
            .record_review(&input, &ReviewConfig::default(), &IntervalScheduler)
            .unwrap_err();
        assert!(err.is_validation());

        let config = ReviewConfig {
            weights: vec![1.0; 4],
            ..Default::default()
        };
        let err = db
            .record_review(&answer(reviewable, Rating::Good, local(0)), &config, &IntervalScheduler)
            .unwrap_err();
        assert!(err.is_validation());

        let config = ReviewConfig {
            retention: 101,
            ..Default::default()
        };
        assert!(db
            .record_review(&answer(reviewable, Rating::Good, local(0)), &config, &IntervalScheduler)
            .is_err());

        let config = ReviewConfig {
            max_interval: u32::MAX,
            ..Default::default()
        };
        let err = db
            .record_review(&answer(reviewable, Rating::Good, local(0)), &config, &IntervalScheduler)
            .unwrap_err();
        assert!(matches!(
            err,
            RecallError::Validation(ValidationError::InvalidMaxInterval(u32::MAX))
        ));

        assert!(db.list_reviews(reviewable).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_or_archived_reviewable() {
        let (mut db, reviewable) = setup();

        let result = db.record_review(&answer(9999, Rating::Good, local(0)), &ReviewConfig::default(), &IntervalScheduler);
        assert!(matches!(result, Err(RecallError::ReviewableNotFound(9999))));

        let note = get_reviewables_for_note(db.conn(), 1, false).unwrap()[0].reviewable.note;
        let update = UpdateNote {
            sides: Some(vec![vec!["Hund".to_string()], vec!["dog".to_string()]]),
            ..Default::default()
        };
        db.update_note(note, &update, SeparablePolicy::default()).unwrap();

        let result = db.record_review(&answer(reviewable, Rating::Good, local(0)), &ReviewConfig::default(), &IntervalScheduler);
        assert!(matches!(result, Err(RecallError::ReviewableNotFound(id)) if id == reviewable));
    }

    #[test]
    fn test_latest_snapshot_ties_break_on_id() {
        let (mut db, reviewable) = setup();
        let at = local(0);

        db.record_review(&answer(reviewable, Rating::Good, at), &ReviewConfig::default(), &IntervalScheduler)
            .unwrap();
        let second = db
            .record_review(&answer(reviewable, Rating::Again, at), &ReviewConfig::default(), &IntervalScheduler)
            .unwrap();

        let latest = latest_snapshot(db.conn(), reviewable).unwrap().unwrap();
        assert_eq!(latest.id, second.snapshot.id);
    }
}
