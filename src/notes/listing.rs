//! Cursor-paginated note listing

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::models::{NoteFilter, NotePage, PageCursor, Pagination, SortOrder};
use super::storage::{note_from_row, with_fields};
use crate::collections::membership_filter;
use crate::errors::{Result, ValidationError};
use crate::storage::Database;

pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// List notes ordered by id.
///
/// Filters match by list membership: any of the given ids, and any of the
/// given collections. The cursor is inclusive (the first id of the page);
/// `next` is the id that starts the following page, absent on the last page.
pub fn list_notes(
    conn: &Connection,
    filter: &NoteFilter,
    order: SortOrder,
    page: &Pagination,
) -> Result<NotePage> {
    // One extra row tells us whether another page exists
    let fetch = match i64::try_from(page.limit) {
        Ok(limit) if limit > 0 && limit < i64::MAX => limit + 1,
        _ => return Err(ValidationError::InvalidLimit.into()),
    };

    let mut sql =
        String::from("SELECT id, is_reversible, is_separable, created_at FROM note WHERE 1 = 1");
    let mut args: Vec<Value> = Vec::new();

    if !filter.ids.is_empty() {
        sql.push_str(&format!(" AND id IN ({})", placeholders(filter.ids.len())));
        args.extend(filter.ids.iter().map(|&id| Value::Integer(id)));
    }

    if !filter.collections.is_empty() {
        sql.push_str(&format!(
            " AND {}",
            membership_filter("id", filter.collections.len())
        ));
        args.extend(filter.collections.iter().map(|&id| Value::Integer(id)));
    }

    if let Some(cursor) = page.cursor {
        sql.push_str(match order {
            SortOrder::Asc => " AND id >= ?",
            SortOrder::Desc => " AND id <= ?",
        });
        args.push(Value::Integer(cursor));
    }

    sql.push_str(match order {
        SortOrder::Asc => " ORDER BY id ASC",
        SortOrder::Desc => " ORDER BY id DESC",
    });
    sql.push_str(" LIMIT ?");
    args.push(Value::Integer(fetch));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params_from_iter(args.iter()), note_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let next = if rows.len() > page.limit {
        let next = rows[page.limit].id;
        rows.truncate(page.limit);
        Some(next)
    } else {
        None
    };

    let notes = rows
        .into_iter()
        .map(|note| with_fields(conn, note))
        .collect::<Result<Vec<_>>>()?;

    Ok(NotePage {
        notes,
        cursor: PageCursor { next },
    })
}

impl Database {
    pub fn list_notes(
        &self,
        filter: &NoteFilter,
        order: SortOrder,
        page: &Pagination,
    ) -> Result<NotePage> {
        list_notes(self.conn(), filter, order, page)
    }
}
