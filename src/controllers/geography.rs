//! Geography controller
//!
//! Serves the map page and the JSON rankings it asks for when the user
//! picks a date range.

use chrono::NaiveDate;
use serde::Serialize;

use super::{ActionOutput, Controller, Params};
use crate::analysis::{self, FrequencyEntry, PerCapitaEntry};
use crate::config::AppState;
use crate::error::{AppError, Result};
use crate::http::QueryParams;
use crate::logger;
use crate::routing::DEFAULT_ACTION;
use crate::storage::dao::{self, YearRange};

pub const MAP_DATA_ACTION: &str = "getFilteredMapData";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Body of `getFilteredMapData`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    pub raw_data: Vec<FrequencyEntry>,
    pub per_capita_data: Vec<PerCapitaEntry>,
}

pub async fn invoke(action: &str, params: &Params, state: &AppState) -> Result<ActionOutput> {
    match action {
        DEFAULT_ACTION => init(state).await,
        MAP_DATA_ACTION => {
            let empty = QueryParams::new();
            let query = match params {
                Params::Query(query) => query,
                Params::Resource(_) => &empty,
            };
            filtered_map_data(query, state).await
        }
        _ => Err(Controller::Geography.unknown_action(action)),
    }
}

/// Render the map page with year pickers bounded by the stored data
pub async fn init(state: &AppState) -> Result<ActionOutput> {
    logger::log_debug("Loading the geography page");

    let year_range = match dao::fetch_year_range(&state.database).await? {
        Some(range) => range,
        None => {
            // Nothing scraped yet; offer the configured starting year only
            let year = state.config.scrape.starting_year;
            YearRange {
                starting_year: year,
                ending_year: year,
            }
        }
    };

    Ok(ActionOutput::html(render_page(year_range)?))
}

/// Rankings for a month range given as 0-based months
pub async fn filtered_map_data(query: &QueryParams, state: &AppState) -> Result<ActionOutput> {
    let start = month_param(query, "beginningYear", "beginningMonth")?;
    let end = month_param(query, "endingYear", "endingMonth")?;
    logger::log_debug(&format!("Fetching map data from {start} to {end}"));

    let data = MapData {
        raw_data: analysis::sum_frequency(&state.database, start, end).await?,
        per_capita_data: analysis::per_capita(&state.database, start, end).await?,
    };
    Ok(ActionOutput::json(serde_json::to_vec(&data)?))
}

/// First day of the month named by a year parameter and a 0-11 month parameter
fn month_param(query: &QueryParams, year_key: &str, month_key: &str) -> Result<NaiveDate> {
    let year: i32 = required(query, year_key)?
        .parse()
        .map_err(|_| AppError::bad_parameter(year_key, "not a year"))?;
    let month: u32 = required(query, month_key)?
        .parse()
        .map_err(|_| AppError::bad_parameter(month_key, "not a month number"))?;
    if month > 11 {
        return Err(AppError::bad_parameter(month_key, "month must be between 0 and 11"));
    }

    NaiveDate::from_ymd_opt(year, month + 1, 1)
        .ok_or_else(|| AppError::bad_parameter(year_key, "year out of range"))
}

fn required<'a>(query: &'a QueryParams, key: &str) -> Result<&'a str> {
    query
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_parameter(key, "missing"))
}

fn render_page(range: YearRange) -> Result<String> {
    let initial_data = serde_json::to_string(&range)?;

    let month_options: String = MONTHS
        .iter()
        .enumerate()
        .map(|(index, name)| {
            format!(
                "            <label><input type=\"radio\" name=\"fromMonth\" value=\"{index}\"> {name}</label>\
                 <label><input type=\"radio\" name=\"toMonth\" value=\"{index}\"> {name}</label>\n"
            )
        })
        .collect();

    let mut page = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>UFO Atlas - Sightings by Region</title>
    <link rel="icon" href="/images/favicon.ico">
</head>
<body>
    <main>
        <h1>UFO sightings by region</h1>
        <section id="dateRangeForm">
"#,
    );
    page.push_str(&format!(
        r#"            <div id="beginningYearContainer"><i>&lt;</i><span id="beginningYear">{start}</span><i>&gt;</i></div>
            <div id="endingYearContainer"><i>&lt;</i><span id="endingYear">{end}</span><i>&gt;</i></div>
"#,
        start = range.starting_year,
        end = range.ending_year,
    ));
    page.push_str(&month_options);
    page.push_str(
        r#"            <button id="dateRangeSubmit" type="button">Show sightings</button>
        </section>
        <section id="map"></section>
        <table id="rawDataTable"><thead><tr><th class="columnHeader" data-column-index="0">Region</th><th class="columnHeader" data-column-index="1">Sightings</th></tr></thead><tbody></tbody></table>
        <table id="perCapitaDataTable"><thead><tr><th class="columnHeader" data-column-index="0">Region</th><th class="columnHeader" data-column-index="1">Residents per sighting</th></tr></thead><tbody></tbody></table>
    </main>
"#,
    );
    page.push_str(&format!("    <script>window.ATLAS = {initial_data};</script>\n"));
    page.push_str(
        r#"    <script src="/scripts/geography/main.js"></script>
</body>
</html>
"#,
    );

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::{Database, RegionFrequencyRecord, WriteOp};
    use std::collections::BTreeMap;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    async fn state_with_months(months: &[(i32, u32)]) -> AppState {
        let config = Config::load_from("does-not-exist").unwrap();
        let db = Database::in_memory();
        let ops = months
            .iter()
            .map(|(y, m)| {
                WriteOp::InsertOne(RegionFrequencyRecord {
                    month_year: NaiveDate::from_ymd_opt(*y, *m, 1).unwrap(),
                    region_frequency_map: BTreeMap::from([("CA".to_string(), *m)]),
                })
            })
            .collect();
        db.bulk_write(true, ops).await.unwrap();
        AppState::with_database(&config, db)
    }

    #[test]
    fn test_month_param() {
        let q = query(&[("y", "2015"), ("m", "0")]);
        assert_eq!(
            month_param(&q, "y", "m").unwrap(),
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
        let q = query(&[("y", "2015"), ("m", "11")]);
        assert_eq!(
            month_param(&q, "y", "m").unwrap(),
            NaiveDate::from_ymd_opt(2015, 12, 1).unwrap()
        );
    }

    #[test]
    fn test_month_param_rejects_bad_input() {
        assert!(matches!(
            month_param(&query(&[("y", "2015")]), "y", "m"),
            Err(AppError::BadParameter { .. })
        ));
        assert!(month_param(&query(&[("y", "soon"), ("m", "1")]), "y", "m").is_err());
        assert!(month_param(&query(&[("y", "2015"), ("m", "12")]), "y", "m").is_err());
        assert!(month_param(&query(&[("y", "2015"), ("m", "-1")]), "y", "m").is_err());
    }

    #[tokio::test]
    async fn test_filtered_map_data() {
        let state = state_with_months(&[(2015, 1), (2015, 6), (2016, 2)]).await;
        let q = query(&[
            ("beginningYear", "2015"),
            ("beginningMonth", "0"),
            ("endingYear", "2015"),
            ("endingMonth", "11"),
        ]);
        let out = invoke(MAP_DATA_ACTION, &Params::Query(q), &state).await.unwrap();
        assert_eq!(out.content_type, Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&out.body).unwrap();
        assert_eq!(body["rawData"], serde_json::json!([["CA", 7]]));
        assert!(body["perCapitaData"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_embeds_year_range() {
        let state = state_with_months(&[(2007, 3), (2014, 9)]).await;
        let out = invoke("init", &Params::Query(QueryParams::new()), &state).await.unwrap();
        let html = String::from_utf8(out.body.to_vec()).unwrap();
        assert!(html.contains(r#"window.ATLAS = {"startingYear":2007,"endingYear":2014};"#));
        assert!(html.contains("December"));
    }

    #[tokio::test]
    async fn test_init_without_data_uses_configured_year() {
        let state = state_with_months(&[]).await;
        let out = init(&state).await.unwrap();
        let html = String::from_utf8(out.body.to_vec()).unwrap();
        assert!(html.contains(r#"{"startingYear":2005,"endingYear":2005}"#));
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let state = state_with_months(&[]).await;
        let err = invoke("launch", &Params::Query(QueryParams::new()), &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownAction { controller: "geography", .. }));
    }
}
