//! Reporting Windows
//!
//! Works out which closed period a report covers and where that report lives
//! on disk. Monthly reports cover the previous calendar month; weekly reports
//! cover the seven days ending now.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Monthly,
    Weekly,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Monthly => "monthly",
            WindowKind::Weekly => "weekly",
        }
    }
}

/// A closed reporting period; both bounds are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub kind: WindowKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn monthly(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            kind: WindowKind::Monthly,
            start,
            end,
        }
    }

    pub fn weekly(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            kind: WindowKind::Weekly,
            start,
            end,
        }
    }

    /// The calendar month before the one containing `now`
    pub fn previous_month(now: DateTime<Utc>) -> Result<Self> {
        let (year, month) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };

        let start = Utc
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| Error::Internal(format!("invalid month {}-{}", year, month)))?;
        let first_of_this_month = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .ok_or_else(|| Error::Internal(format!("invalid date {}", now)))?;

        Ok(Self::monthly(
            start,
            first_of_this_month - Duration::seconds(1),
        ))
    }

    /// The seven days ending at `now`
    pub fn week_ending(now: DateTime<Utc>) -> Self {
        Self::weekly(now - Duration::days(7), now)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Where the report for this window is written
    pub fn report_path(&self, output_dir: &Path, extension: &str) -> PathBuf {
        match self.kind {
            WindowKind::Monthly => output_dir.join("Monthly").join(format!(
                "monthly-{}.{}",
                self.start.format("%Y-%m-%d"),
                extension
            )),
            WindowKind::Weekly => output_dir.join("Weekly").join(format!(
                "weekly-ending-{}.{}",
                self.end.format("%Y-%m-%dT%H%M%S"),
                extension
            )),
        }
    }
}

impl std::fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Parse a `YY-MM-DD-HH-MM-SS` override for "now".
///
/// The year may be given with two digits (`24`) or four (`2024`).
pub fn parse_test_date(value: &str) -> Result<DateTime<Utc>> {
    let parts: Vec<&str> = value.split('-').collect();
    if parts.len() != 6 {
        return Err(Error::Config(format!(
            "test date must be YY-MM-DD-HH-MM-SS, got '{}'",
            value
        )));
    }

    let numbers = parts
        .iter()
        .map(|p| p.parse::<u32>())
        .collect::<std::result::Result<Vec<u32>, _>>()
        .map_err(|e| Error::Config(format!("could not parse test date '{}': {}", value, e)))?;

    let year = if numbers[0] < 100 {
        2000 + numbers[0] as i32
    } else {
        numbers[0] as i32
    };

    NaiveDate::from_ymd_opt(year, numbers[1], numbers[2])
        .and_then(|d| d.and_hms_opt(numbers[3], numbers[4], numbers[5]))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::Config(format!("test date '{}' is not a valid instant", value)))
}
