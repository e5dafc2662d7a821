use std::fmt;
use std::str::FromStr;

use chrono::offset::LocalResult;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::MoonError;
use crate::models::{LocalHour, UtcTimestamp};

/// The timezone the user's dates and hours are read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Whatever the operating system says.
    System,
    Named(Tz),
}

impl Zone {
    pub fn today(&self) -> NaiveDate {
        match self {
            Zone::System => Local::now().date_naive(),
            Zone::Named(tz) => Utc::now().with_timezone(tz).date_naive(),
        }
    }

    fn to_utc(&self, local: &NaiveDateTime) -> LocalResult<DateTime<Utc>> {
        match self {
            Zone::System => Local
                .from_local_datetime(local)
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Named(tz) => tz
                .from_local_datetime(local)
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "local" | "system" => Ok(Zone::System),
            name => name
                .parse::<Tz>()
                .map(Zone::Named)
                .map_err(|e| format!("unknown timezone {name:?}: {e}")),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::System => f.write_str("local"),
            Zone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

pub const FIRST_SUPPORTED_DAY: NaiveDate = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap();

/// Inclusive span of timestamps the API has imagery for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedRange {
    first: UtcTimestamp,
    last: UtcTimestamp,
}

impl SupportedRange {
    /// From 2011-01-01T00 through the last hour of `year`.
    pub fn through_year(year: i32) -> Self {
        let last_day = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);
        Self {
            first: UtcTimestamp::first_hour(FIRST_SUPPORTED_DAY),
            last: UtcTimestamp::last_hour(last_day),
        }
    }

    pub fn current() -> Self {
        use chrono::Datelike;
        Self::through_year(Utc::now().year())
    }

    pub fn contains(&self, timestamp: &UtcTimestamp) -> bool {
        (self.first..=self.last).contains(timestamp)
    }
}

/// Maps a local date and hour onto the UTC hour the API is queried with.
#[derive(Debug, Clone)]
pub struct LocalToUtcConverter {
    zone: Zone,
    range: SupportedRange,
}

impl LocalToUtcConverter {
    pub fn new(zone: Zone, range: SupportedRange) -> Self {
        Self { zone, range }
    }

    pub fn convert(&self, date: NaiveDate, hour: LocalHour) -> Result<UtcTimestamp, MoonError> {
        let local = date
            .and_hms_opt(hour.value(), 0, 0)
            .ok_or_else(|| MoonError::HourValue(hour.to_string()))?;

        // Gaps (spring forward) have no instant; overlaps take the first one.
        let utc = self
            .zone
            .to_utc(&local)
            .earliest()
            .ok_or(MoonError::NonexistentLocalTime(local))?;

        // The offset can push a border date across the edge, so check afterwards.
        let timestamp = UtcTimestamp::from_datetime(&utc);
        if !self.range.contains(&timestamp) {
            return Err(MoonError::DateOutOfRange {
                timestamp,
                first: self.range.first,
                last: self.range.last,
            });
        }
        Ok(timestamp)
    }
}
