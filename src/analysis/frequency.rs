//! Incident frequency rankings
//!
//! Sums monthly region counts over a date range and derives the per-capita
//! ratio ("one sighting per N residents") for regions with census data.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::Result;
use crate::storage::dao;
use crate::storage::{CensusRecord, Database, RegionFrequencyRecord};

/// Total sightings for one region; serializes as `["CA", 10]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry(pub String, pub u64);

/// Residents per sighting for one region; serializes as `["CA", 100]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerCapitaEntry(pub String, pub u64);

/// Sum counts per region in first-seen order, then stable-sort by total
pub fn sum_records(records: &[RegionFrequencyRecord]) -> Vec<FrequencyEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<FrequencyEntry> = Vec::new();

    for record in records {
        for (region, count) in &record.region_frequency_map {
            let slot = *index.entry(region.as_str()).or_insert_with(|| {
                entries.push(FrequencyEntry(region.clone(), 0));
                entries.len() - 1
            });
            entries[slot].1 += u64::from(*count);
        }
    }

    entries.sort_by_key(|entry| entry.1);
    entries
}

/// Per-capita ratios for summed regions that have a census population
///
/// Regions missing from the census, with no population figure, or with a
/// zero total are left out.
pub fn per_capita_from(
    frequency: &[FrequencyEntry],
    census: &[CensusRecord],
) -> Vec<PerCapitaEntry> {
    let populations: HashMap<&str, Option<i64>> = census
        .iter()
        .map(|record| (record.postal_code.as_str(), record.population))
        .collect();

    let mut entries: Vec<PerCapitaEntry> = frequency
        .iter()
        .filter(|FrequencyEntry(_, total)| *total > 0)
        .filter_map(|FrequencyEntry(region, total)| {
            let population = populations.get(region.as_str()).copied().flatten()?;
            Some(PerCapitaEntry(region.clone(), ratio(population, *total)))
        })
        .collect();

    entries.sort_by_key(|entry| entry.1);
    entries
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn ratio(population: i64, total: u64) -> u64 {
    (population.max(0) as f64 / total as f64).round() as u64
}

/// Region totals for `start <= month <= end`, ascending by total
pub async fn sum_frequency(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<FrequencyEntry>> {
    let records = dao::fetch_frequency_records(db, start, end).await?;
    Ok(sum_records(&records))
}

/// Per-capita ratios for `start <= month <= end`, ascending by ratio
pub async fn per_capita(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PerCapitaEntry>> {
    let frequency = sum_frequency(db, start, end).await?;
    let census = dao::fetch_census_records(db).await?;
    Ok(per_capita_from(&frequency, &census))
}
