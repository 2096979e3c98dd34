//! Collection-level queries used by the aggregator, controllers and scrapers

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::bulk::{BulkWriteResult, Filter, Sort, WriteOp};
use super::database::Database;
use super::models::{CensusRecord, Record, RegionFrequencyRecord};
use crate::error::Result;
use crate::logger;

/// Earliest and latest year with frequency data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    pub starting_year: i32,
    pub ending_year: i32,
}

/// Frequency records with `start <= month_year <= end`, oldest first
pub async fn fetch_frequency_records(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RegionFrequencyRecord>> {
    let filter = Filter::Between(
        RegionFrequencyRecord::MONTH_YEAR,
        start.into(),
        end.into(),
    );
    db.read(&filter, Some(Sort::asc(RegionFrequencyRecord::MONTH_YEAR)))
        .await
}

pub async fn fetch_census_records(db: &Database) -> Result<Vec<CensusRecord>> {
    db.read(&Filter::All, None).await
}

/// `None` when nothing has been scraped yet
pub async fn fetch_year_range(db: &Database) -> Result<Option<YearRange>> {
    let dates: Vec<RegionFrequencyRecord> = db
        .read(&Filter::All, Some(Sort::asc(RegionFrequencyRecord::MONTH_YEAR)))
        .await?;

    Ok(match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => Some(YearRange {
            starting_year: first.month_year.year(),
            ending_year: last.month_year.year(),
        }),
        _ => None,
    })
}

/// Drop every record of `R`, then write `inserts`
///
/// The delete and the insert are two separate batches, so a reader can see
/// an empty collection in between.
pub async fn replace_all<R: Record>(
    db: &Database,
    inserts: Vec<WriteOp<R>>,
) -> Result<(BulkWriteResult, BulkWriteResult)> {
    logger::log_info(&format!(
        "Replacing the {} collection with {} fresh operations",
        R::TABLE,
        inserts.len()
    ));
    let deleted = db
        .bulk_write::<R>(true, vec![WriteOp::DeleteMany { filter: Filter::All }])
        .await?;
    let inserted = db.bulk_write(true, inserts).await?;
    Ok((deleted, inserted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn month(year: i32, month: u32) -> RegionFrequencyRecord {
        RegionFrequencyRecord {
            month_year: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            region_frequency_map: BTreeMap::from([("TX".to_string(), 1)]),
        }
    }

    #[tokio::test]
    async fn test_year_range_empty() {
        let db = Database::in_memory();
        assert_eq!(fetch_year_range(&db).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_replace_all_and_year_range() {
        let db = Database::in_memory();
        replace_all(&db, vec![WriteOp::InsertOne(month(1999, 3))])
            .await
            .unwrap();

        let (deleted, inserted) = replace_all(
            &db,
            vec![
                WriteOp::InsertOne(month(2007, 5)),
                WriteOp::InsertOne(month(2005, 1)),
                WriteOp::InsertOne(month(2016, 12)),
            ],
        )
        .await
        .unwrap();
        assert_eq!(deleted.deleted, 1);
        assert_eq!(inserted.inserted, 3);

        let range = fetch_year_range(&db).await.unwrap().unwrap();
        assert_eq!(
            range,
            YearRange {
                starting_year: 2005,
                ending_year: 2016
            }
        );
    }
}
