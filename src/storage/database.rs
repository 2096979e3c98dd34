//! SQLite access
//!
//! The pool is opened lazily on first use. `OnceCell` guarantees a single
//! initialisation even if two tasks ask for it concurrently.

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use std::str::FromStr;
use tokio::sync::OnceCell;

use super::bulk::{BulkWriteResult, Filter, OpOutcome, Sort, SqlValue, WriteOp};
use super::models::{Record, SCHEMA};
use crate::error::Result;
use crate::logger;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct Database {
    url: String,
    max_connections: u32,
    pool: OnceCell<SqlitePool>,
}

impl Database {
    pub fn new(url: &str, max_connections: u32) -> Self {
        Self {
            url: url.to_string(),
            max_connections: max_connections.max(1),
            pool: OnceCell::new(),
        }
    }

    /// Private in-memory database; one connection so every query sees the same data
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:", 1)
    }

    /// Shared pool, connecting and ensuring the schema on first call
    pub async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| connect(&self.url, self.max_connections))
            .await
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            logger::log_info(&format!("Closing the database at {}", self.url));
            pool.close().await;
        }
    }

    /// Read every record of `R` matching `filter`
    pub async fn read<R: Record>(&self, filter: &Filter, sort: Option<Sort>) -> Result<Vec<R>> {
        let pool = self.pool().await?;
        let (condition, values) = filter.to_sql();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {condition}",
            R::COLUMNS.join(", "),
            R::TABLE
        );
        if let Some(sort) = sort {
            sql.push(' ');
            sql.push_str(&sort.to_sql());
        }

        logger::log_debug(&format!("About to read records from {}: {sql}", R::TABLE));
        let rows = bind_values(sqlx::query(&sql), values)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                logger::log_error(&format!("Read from {} failed: {e}", R::TABLE));
                e
            })?;
        let records = rows.iter().map(R::from_row).collect::<Result<Vec<_>, _>>()?;
        logger::log_debug(&format!(
            "Just read {} records from the {} collection",
            records.len(),
            R::TABLE
        ));
        Ok(records)
    }

    /// Execute a batch of writes in one transaction
    ///
    /// Ordered batches stop at the first failure and roll back. Unordered
    /// batches skip failing operations and count them in `failed`.
    pub async fn bulk_write<R: Record>(
        &self,
        ordered: bool,
        ops: Vec<WriteOp<R>>,
    ) -> Result<BulkWriteResult> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        let mut result = BulkWriteResult::default();

        for (index, op) in ops.into_iter().enumerate() {
            let kind = op.kind();
            match execute_op(&mut *tx, op).await {
                Ok(outcome) => result.record(outcome),
                Err(e) if ordered => {
                    logger::log_error(&format!(
                        "bulkWrite on {} aborted at operation {index} ({kind}): {e}",
                        R::TABLE
                    ));
                    return Err(e.into());
                }
                Err(e) => {
                    logger::log_warning(&format!(
                        "bulkWrite on {} skipped operation {index} ({kind}): {e}",
                        R::TABLE
                    ));
                    result.failed += 1;
                }
            }
        }

        tx.commit().await?;
        log_bulk_result(R::TABLE, &result);
        Ok(result)
    }
}

async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    logger::log_info(&format!("Connecting to the database using the following URL: {url}"));

    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| {
            logger::log_error(&format!("Failed to connect to {url}: {e}"));
            e
        })?;

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    logger::log_info("Connected to the database, tables ensured to exist");
    Ok(pool)
}

async fn execute_op<R: Record>(
    conn: &mut SqliteConnection,
    op: WriteOp<R>,
) -> Result<OpOutcome, sqlx::Error> {
    match op {
        WriteOp::InsertOne(record) => insert(conn, &record).await.map(OpOutcome::Inserted),
        WriteOp::UpdateOne {
            filter,
            set,
            upsert,
        } => update(conn, &filter, &set, upsert, true).await,
        WriteOp::UpdateMany {
            filter,
            set,
            upsert,
        } => update(conn, &filter, &set, upsert, false).await,
        WriteOp::DeleteOne { filter } => delete::<R>(conn, &filter, true).await,
        WriteOp::DeleteMany { filter } => delete::<R>(conn, &filter, false).await,
    }
}

async fn insert<R: Record>(conn: &mut SqliteConnection, record: &R) -> Result<u64, sqlx::Error> {
    let placeholders = vec!["?"; R::COLUMNS.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        R::TABLE,
        R::COLUMNS.join(", ")
    );
    let done = bind_values(sqlx::query(&sql), record.values()?)
        .execute(conn)
        .await?;
    Ok(done.rows_affected())
}

async fn update<R: Record>(
    conn: &mut SqliteConnection,
    filter: &Filter,
    set: &R,
    upsert: bool,
    single: bool,
) -> Result<OpOutcome, sqlx::Error> {
    let assignments = R::COLUMNS
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let (condition, filter_values) = filter.to_sql();
    let sql = if single {
        format!(
            "UPDATE {table} SET {assignments} WHERE rowid IN \
             (SELECT rowid FROM {table} WHERE {condition} LIMIT 1)",
            table = R::TABLE
        )
    } else {
        format!("UPDATE {} SET {assignments} WHERE {condition}", R::TABLE)
    };

    let mut values = set.values()?;
    values.extend(filter_values);
    let done = bind_values(sqlx::query(&sql), values)
        .execute(&mut *conn)
        .await?;

    if done.rows_affected() == 0 && upsert {
        insert(conn, set).await?;
        return Ok(OpOutcome::Upserted);
    }
    Ok(OpOutcome::Modified(done.rows_affected()))
}

async fn delete<R: Record>(
    conn: &mut SqliteConnection,
    filter: &Filter,
    single: bool,
) -> Result<OpOutcome, sqlx::Error> {
    let (condition, values) = filter.to_sql();
    let sql = if single {
        format!(
            "DELETE FROM {table} WHERE rowid IN \
             (SELECT rowid FROM {table} WHERE {condition} LIMIT 1)",
            table = R::TABLE
        )
    } else {
        format!("DELETE FROM {} WHERE {condition}", R::TABLE)
    };
    let done = bind_values(sqlx::query(&sql), values)
        .execute(conn)
        .await?;
    Ok(OpOutcome::Deleted(done.rows_affected()))
}

fn bind_values(mut query: SqliteQuery<'_>, values: Vec<SqlValue>) -> SqliteQuery<'_> {
    for value in values {
        query = match value {
            SqlValue::Text(text) => query.bind(text),
            SqlValue::Integer(number) => query.bind(number),
            SqlValue::Date(date) => query.bind(date),
            SqlValue::Null => query.bind(None::<i64>),
        };
    }
    query
}

fn log_bulk_result(table: &str, result: &BulkWriteResult) {
    if result.inserted > 0 {
        logger::log_info(&format!("Wrote {} records to the \"{table}\" collection", result.inserted));
    }
    if result.deleted > 0 {
        logger::log_info(&format!("Deleted {} records from the \"{table}\" collection", result.deleted));
    }
    if result.modified > 0 || result.upserted > 0 {
        logger::log_info(&format!(
            "Modified {} and upserted {} records within the \"{table}\" collection",
            result.modified, result.upserted
        ));
    }
}
