//! Storage module
//!
//! SQLite-backed collections for scraped frequency data and census figures.

pub mod bulk;
pub mod dao;
mod database;
pub mod models;

pub use bulk::{BulkWriteResult, Filter, Sort, SqlValue, WriteOp};
pub use dao::YearRange;
pub use database::Database;
pub use models::{CensusRecord, Record, RegionFrequencyRecord, INTERNATIONAL_REGION};
