//! Collections group notes for filtering.
//!
//! Only what note membership needs lives here; renaming and deleting
//! collections is left to the application layer.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::notes::listing::placeholders;
use crate::storage::{column_time, from_millis, to_millis, Database};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

pub fn create_collection(conn: &Connection, name: &str) -> Result<Collection> {
    // Stored at millisecond precision; keep the returned value identical
    let created_at = from_millis(to_millis(Utc::now()))?;
    conn.execute(
        "INSERT INTO collection (name, created_at) VALUES (?1, ?2)",
        params![name, to_millis(created_at)],
    )?;
    let id = conn.last_insert_rowid();
    log::info!("Created collection {} ({})", id, name);

    Ok(Collection {
        id,
        name: name.to_string(),
        created_at,
    })
}

pub fn list_collections(conn: &Connection) -> Result<Vec<Collection>> {
    let mut stmt = conn.prepare_cached("SELECT id, name, created_at FROM collection ORDER BY id")?;
    let collections = stmt
        .query_map([], |row| {
            Ok(Collection {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: column_time(row, 2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(collections)
}

/// SQL condition restricting a note id `column` to notes in any of `count`
/// collections. Binds one parameter per collection id.
pub(crate) fn membership_filter(column: &str, count: usize) -> String {
    format!(
        "{} IN (SELECT note FROM note_collection WHERE collection IN ({}))",
        column,
        placeholders(count)
    )
}

/// Ids of notes belonging to any of the given collections
pub fn notes_in_collections(conn: &Connection, ids: &[i64]) -> Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id FROM note WHERE {} ORDER BY id",
        membership_filter("id", ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let notes = stmt
        .query_map(params_from_iter(ids.iter()), |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(notes)
}

impl Database {
    pub fn create_collection(&mut self, name: &str) -> Result<Collection> {
        self.write(|tx| create_collection(tx, name))
    }

    pub fn list_collections(&self) -> Result<Vec<Collection>> {
        list_collections(self.conn())
    }
}
