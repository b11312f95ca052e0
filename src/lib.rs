//! Spaced-repetition engine.
//!
//! Notes hold ordered fields on a front and a back side. Every edit
//! reconciles the stored fields against the requested layout, derives the
//! reviewables the note should have, and reconciles those against the stored
//! ones, preserving identities (and therefore review history) wherever the
//! content survives. Reviews append immutable scheduling snapshots, and due
//! selection ranks live reviewables by their latest snapshot.

pub mod collections;
pub mod config;
pub mod errors;
pub mod notes;
pub mod review;
pub mod storage;

pub use collections::Collection;
pub use config::RecallConfig;
pub use errors::{RecallError, Result, ValidationError};
pub use storage::Database;
