//! SQLite schema for notes, reviewables and review history.
//!
//! Timestamps are UTC unix milliseconds. Rows in `review` and
//! `reviewable_snapshot` are append-only; `note_field` and `reviewable`
//! only ever flip `is_archived`.

/// Bumped whenever `SCHEMA` changes shape
pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collection (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(name) > 0),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS note (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    is_reversible INTEGER NOT NULL DEFAULT 0,
    is_separable INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS note_collection (
    note INTEGER NOT NULL REFERENCES note(id),
    collection INTEGER NOT NULL REFERENCES collection(id),
    created_at INTEGER NOT NULL,
    PRIMARY KEY (note, collection)
);

CREATE TABLE IF NOT EXISTS note_field (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note INTEGER NOT NULL REFERENCES note(id),
    value TEXT NOT NULL CHECK (length(value) > 0),
    hash TEXT NOT NULL,
    side INTEGER NOT NULL CHECK (side IN (0, 1)),
    position INTEGER NOT NULL CHECK (position >= 0),
    is_archived INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reviewable (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note INTEGER NOT NULL REFERENCES note(id),
    is_archived INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reviewable_field (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reviewable INTEGER NOT NULL REFERENCES reviewable(id),
    field INTEGER NOT NULL REFERENCES note_field(id),
    side INTEGER NOT NULL CHECK (side IN (0, 1)),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS review (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reviewable INTEGER NOT NULL REFERENCES reviewable(id),
    rating INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 4),
    duration INTEGER NOT NULL CHECK (duration > 0),
    created_at INTEGER NOT NULL,
    created_at_offset TEXT NOT NULL CHECK (
        created_at_offset GLOB '[+-][0-9][0-9]:[0-9][0-9]'
        AND CAST(substr(created_at_offset, 2, 2) AS INTEGER) < 24
        AND CAST(substr(created_at_offset, 5, 2) AS INTEGER) < 60
    ),
    is_due_fuzzed INTEGER NOT NULL,
    is_learning_enabled INTEGER NOT NULL,
    max_interval INTEGER NOT NULL CHECK (max_interval > 0),
    retention INTEGER NOT NULL CHECK (retention BETWEEN 0 AND 100),
    weights TEXT NOT NULL CHECK (json_valid(weights) AND json_array_length(weights) >= 19)
);

CREATE TABLE IF NOT EXISTS reviewable_snapshot (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reviewable INTEGER NOT NULL REFERENCES reviewable(id),
    review INTEGER NOT NULL UNIQUE REFERENCES review(id),
    difficulty REAL NOT NULL CHECK (difficulty > 0),
    due INTEGER NOT NULL,
    stability REAL NOT NULL CHECK (stability > 0),
    state INTEGER NOT NULL CHECK (state BETWEEN 0 AND 3),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_note_field_note ON note_field(note);
CREATE INDEX IF NOT EXISTS idx_note_collection_collection ON note_collection(collection);
CREATE INDEX IF NOT EXISTS idx_reviewable_note ON reviewable(note);
CREATE INDEX IF NOT EXISTS idx_reviewable_field_reviewable ON reviewable_field(reviewable);
CREATE INDEX IF NOT EXISTS idx_review_reviewable ON review(reviewable);
CREATE INDEX IF NOT EXISTS idx_snapshot_reviewable ON reviewable_snapshot(reviewable, created_at, id);
"#;
