//! Filters and bulk write operations
//!
//! A `WriteOp` is one entry of a batch handed to `Database::bulk_write`.

use chrono::NaiveDate;

/// A value bound into a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Null,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Integer)
    }
}

/// Row selection; column names come from record definitions, never from input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Eq(&'static str, SqlValue),
    /// Inclusive on both ends
    Between(&'static str, SqlValue, SqlValue),
}

impl Filter {
    /// SQL condition and the values it binds, in order
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        match self {
            Self::All => ("1 = 1".to_string(), Vec::new()),
            Self::Eq(column, value) => (format!("{column} = ?"), vec![value.clone()]),
            Self::Between(column, low, high) => (
                format!("{column} BETWEEN ? AND ?"),
                vec![low.clone(), high.clone()],
            ),
        }
    }
}

/// Ascending result ordering for reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
}

impl Sort {
    pub const fn asc(column: &'static str) -> Self {
        Self { column }
    }

    pub fn to_sql(self) -> String {
        format!("ORDER BY {} ASC", self.column)
    }
}

/// One write in a bulk batch
///
/// Updates replace every column of the matched row(s) with `set`.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp<R> {
    InsertOne(R),
    UpdateOne { filter: Filter, set: R, upsert: bool },
    UpdateMany { filter: Filter, set: R, upsert: bool },
    DeleteOne { filter: Filter },
    DeleteMany { filter: Filter },
}

impl<R> WriteOp<R> {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InsertOne(_) => "insertOne",
            Self::UpdateOne { .. } => "updateOne",
            Self::UpdateMany { .. } => "updateMany",
            Self::DeleteOne { .. } => "deleteOne",
            Self::DeleteMany { .. } => "deleteMany",
        }
    }
}

/// Counters for an executed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub inserted: u64,
    pub modified: u64,
    pub deleted: u64,
    pub upserted: u64,
    /// Operations skipped because they failed in an unordered batch
    pub failed: u64,
}

/// What a single operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Inserted(u64),
    Modified(u64),
    Upserted,
    Deleted(u64),
}

impl BulkWriteResult {
    pub fn record(&mut self, outcome: OpOutcome) {
        match outcome {
            OpOutcome::Inserted(n) => self.inserted += n,
            OpOutcome::Modified(n) => self.modified += n,
            OpOutcome::Upserted => self.upserted += 1,
            OpOutcome::Deleted(n) => self.deleted += n,
        }
    }
}
