//! Plain-text frequency report for the `crunch` command

use chrono::NaiveDate;

use super::frequency::{FrequencyEntry, PerCapitaEntry};
use crate::error::{AppError, Result};

/// Parse `YYYY-MM` into the first day of that month
pub fn parse_month(value: &str) -> Result<NaiveDate> {
    let (year, month) = value
        .trim()
        .split_once('-')
        .ok_or_else(|| AppError::bad_parameter(value, "expected YYYY-MM"))?;
    let year: i32 = year
        .parse()
        .map_err(|_| AppError::bad_parameter(value, "year is not a number"))?;
    let month: u32 = month
        .parse()
        .map_err(|_| AppError::bad_parameter(value, "month is not a number"))?;

    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::bad_parameter(value, "month must be between 01 and 12"))
}

/// Both rankings, highest value first
pub fn render(raw: &[FrequencyEntry], per_capita: &[PerCapitaEntry]) -> String {
    let mut out = String::from("---------- RAW INCIDENT STATS ----------\n");
    for FrequencyEntry(region, total) in raw.iter().rev() {
        out.push_str(&format!("{region} ----> {total}\n"));
    }
    out.push_str("---------- STATE PER-CAPITA INCIDENT RATIOS ----------\n");
    for PerCapitaEntry(region, ratio) in per_capita.iter().rev() {
        out.push_str(&format!("{region} ----> {ratio}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(
            parse_month("2015-01").unwrap(),
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
        assert_eq!(
            parse_month("2015-12").unwrap(),
            NaiveDate::from_ymd_opt(2015, 12, 1).unwrap()
        );
        assert!(parse_month("2015").is_err());
        assert!(parse_month("2015-13").is_err());
        assert!(parse_month("2015-00").is_err());
        assert!(parse_month("last-year").is_err());
    }

    #[test]
    fn test_render_descending() {
        let raw = vec![
            FrequencyEntry("WA".to_string(), 3),
            FrequencyEntry("CA".to_string(), 10),
        ];
        let ratios = vec![PerCapitaEntry("CA".to_string(), 100)];
        let report = render(&raw, &ratios);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[1], "CA ----> 10");
        assert_eq!(lines[2], "WA ----> 3");
        assert_eq!(lines[4], "CA ----> 100");
    }
}
