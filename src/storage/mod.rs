mod database;
pub mod schema;

pub use database::{from_millis, to_millis, Database};
pub(crate) use database::column_time;
