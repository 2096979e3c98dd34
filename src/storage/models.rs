//! Persisted record types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeMap;

use super::bulk::SqlValue;

/// Region code recorded when a report names no state or province
pub const INTERNATIONAL_REGION: &str = "INT";

/// A record stored in one table, column order fixed by `COLUMNS`
pub trait Record: Sized + Send + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Column values in `COLUMNS` order
    fn values(&self) -> Result<Vec<SqlValue>, sqlx::Error>;

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Sighting counts per region for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFrequencyRecord {
    /// Always the first day of the month
    pub month_year: NaiveDate,
    pub region_frequency_map: BTreeMap<String, u32>,
}

impl RegionFrequencyRecord {
    pub const MONTH_YEAR: &'static str = "month_year";
}

impl Record for RegionFrequencyRecord {
    const TABLE: &'static str = "region_frequency";
    const COLUMNS: &'static [&'static str] = &["month_year", "region_frequency_map"];

    fn values(&self) -> Result<Vec<SqlValue>, sqlx::Error> {
        let map = serde_json::to_string(&self.region_frequency_map)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        Ok(vec![SqlValue::Date(self.month_year), SqlValue::Text(map)])
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_map: String = row.try_get("region_frequency_map")?;
        let region_frequency_map = serde_json::from_str(&raw_map).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "region_frequency_map".to_string(),
                source: Box::new(e),
            }
        })?;
        Ok(Self {
            month_year: row.try_get("month_year")?,
            region_frequency_map,
        })
    }
}

/// Census data for one US state or territory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusRecord {
    pub region: String,
    pub postal_code: String,
    pub census_code: String,
    /// `None` when the census API had no usable figure
    pub population: Option<i64>,
}

impl CensusRecord {
    pub const POSTAL_CODE: &'static str = "postal_code";
}

impl Record for CensusRecord {
    const TABLE: &'static str = "census_data";
    const COLUMNS: &'static [&'static str] = &["region", "postal_code", "census_code", "population"];

    fn values(&self) -> Result<Vec<SqlValue>, sqlx::Error> {
        Ok(vec![
            SqlValue::Text(self.region.clone()),
            SqlValue::Text(self.postal_code.clone()),
            SqlValue::Text(self.census_code.clone()),
            self.population.into(),
        ])
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            region: row.try_get("region")?,
            postal_code: row.try_get("postal_code")?,
            census_code: row.try_get("census_code")?,
            population: row.try_get("population")?,
        })
    }
}

/// Schema for every collection
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS region_frequency (
    month_year TEXT NOT NULL UNIQUE,
    region_frequency_map TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS census_data (
    region TEXT NOT NULL,
    postal_code TEXT NOT NULL,
    census_code TEXT NOT NULL,
    population INTEGER
);
CREATE INDEX IF NOT EXISTS idx_census_postal_code ON census_data (postal_code);
";
