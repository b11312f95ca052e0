//! Due selection.
//!
//! Ranks live reviewables by the due date of their latest snapshot.
//! A reviewable that has never been reviewed has no snapshot and sorts
//! ahead of everything else.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use super::models::{DueReviewable, ReviewFilter, ReviewState, ReviewStats};
use super::storage::get_snapshot;
use crate::errors::{Result, ValidationError};
use crate::collections::membership_filter;
use crate::notes::storage::{field_from_row, FIELD_COLUMNS};
use crate::notes::{Field, Reviewable, Side};
use crate::storage::{column_time, to_millis, Database};

/// Latest snapshot of `r`, newest `created_at` first, highest id on ties
const LATEST_SNAPSHOT: &str = "SELECT latest.id FROM reviewable_snapshot latest
    WHERE latest.reviewable = r.id
    ORDER BY latest.created_at DESC, latest.id DESC
    LIMIT 1";

/// Live reviewables joined with their latest snapshot, restricted by `filter`
fn candidates_sql(filter: &ReviewFilter, now: DateTime<Utc>, args: &mut Vec<Value>) -> String {
    let mut inner = format!(
        "SELECT r.id, r.note, r.is_archived, r.created_at, s.id AS snapshot, s.due AS due, s.state AS state
         FROM reviewable r
         LEFT JOIN reviewable_snapshot s ON s.id = ({})
         WHERE r.is_archived = 0",
        LATEST_SNAPSHOT
    );

    if !filter.collections.is_empty() {
        inner.push_str(&format!(
            " AND {}",
            membership_filter("r.note", filter.collections.len())
        ));
        args.extend(filter.collections.iter().map(|&id| Value::Integer(id)));
    }

    let mut sql = format!("SELECT * FROM ({}) WHERE 1 = 1", inner);
    if filter.due {
        sql.push_str(" AND (due IS NULL OR due <= ?)");
        args.push(Value::Integer(to_millis(now)));
    }
    sql
}

/// Fields of a reviewable grouped by presentation side
pub fn get_presented_fields(conn: &Connection, reviewable: i64) -> Result<[Vec<Field>; 2]> {
    let columns = FIELD_COLUMNS
        .split(", ")
        .map(|c| format!("f.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {}, rf.side FROM reviewable_field rf
         JOIN note_field f ON f.id = rf.field
         WHERE rf.reviewable = ?1
         ORDER BY rf.side, f.position, f.id",
        columns
    ))?;

    let rows = stmt
        .query_map(params![reviewable], |row| {
            let presented: Side = row.get(8)?;
            Ok((presented, field_from_row(row)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut grouped: [Vec<Field>; 2] = Default::default();
    for (side, field) in rows {
        grouped[side.index()].push(field);
    }
    Ok(grouped)
}

/// Up to `limit` reviewables in presentation order
pub fn select_next_batch(
    conn: &Connection,
    filter: &ReviewFilter,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<DueReviewable>> {
    let limit = match i64::try_from(limit) {
        Ok(limit) if limit > 0 => limit,
        _ => return Err(ValidationError::InvalidLimit.into()),
    };

    let mut args = Vec::new();
    let mut sql = candidates_sql(filter, now, &mut args);
    sql.push_str(" ORDER BY due IS NOT NULL, due ASC, id ASC LIMIT ?");
    args.push(Value::Integer(limit));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            let reviewable = Reviewable {
                id: row.get(0)?,
                note: row.get(1)?,
                archived: row.get(2)?,
                created_at: column_time(row, 3)?,
            };
            let snapshot: Option<i64> = row.get(4)?;
            Ok((reviewable, snapshot))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut selected = Vec::with_capacity(rows.len());
    for (reviewable, snapshot) in rows {
        let snapshot = snapshot.map(|id| get_snapshot(conn, id)).transpose()?;
        let fields = get_presented_fields(conn, reviewable.id)?;
        selected.push(DueReviewable {
            reviewable,
            snapshot,
            fields,
        });
    }

    log::debug!("Selected {} reviewable(s) for {:?}", selected.len(), filter);
    Ok(selected)
}

/// The reviewable to present next, if any
pub fn select_next(
    conn: &Connection,
    filter: &ReviewFilter,
    now: DateTime<Utc>,
) -> Result<Option<DueReviewable>> {
    Ok(select_next_batch(conn, filter, 1, now)?.into_iter().next())
}

/// Count live reviewables by state; `due` honours the filter's collections only
pub fn review_stats(
    conn: &Connection,
    filter: &ReviewFilter,
    now: DateTime<Utc>,
) -> Result<ReviewStats> {
    let all = ReviewFilter {
        collections: filter.collections.clone(),
        due: false,
    };
    let mut args = Vec::new();
    let sql = candidates_sql(&all, now, &mut args);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            let due: Option<i64> = row.get(5)?;
            let state: Option<ReviewState> = row.get(6)?;
            Ok((due, state))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let now = to_millis(now);
    let mut stats = ReviewStats {
        total: rows.len(),
        ..Default::default()
    };
    for (due, state) in rows {
        match state.unwrap_or_default() {
            ReviewState::New => stats.new += 1,
            ReviewState::Learning => stats.learning += 1,
            ReviewState::Review => stats.review += 1,
            ReviewState::Relearning => stats.relearning += 1,
        }
        if due.map_or(true, |due| due <= now) {
            stats.due += 1;
        }
    }

    Ok(stats)
}

impl Database {
    pub fn select_next(&self, filter: &ReviewFilter) -> Result<Option<DueReviewable>> {
        select_next(self.conn(), filter, Utc::now())
    }

    pub fn select_next_batch(&self, filter: &ReviewFilter, limit: usize) -> Result<Vec<DueReviewable>> {
        select_next_batch(self.conn(), filter, limit, Utc::now())
    }

    pub fn review_stats(&self, filter: &ReviewFilter) -> Result<ReviewStats> {
        review_stats(self.conn(), filter, Utc::now())
    }
}
