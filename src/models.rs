use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use clap::ValueEnum;

use crate::error::MoonError;

/// Hour of the local wall-clock day, 0..=23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalHour(u32);

impl LocalHour {
    pub fn new(hour: u32) -> Option<Self> {
        (hour <= 23).then_some(Self(hour))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl FromStr for LocalHour {
    type Err = MoonError;

    /// Accepts one or two ASCII digits, so "5" and "05" are the same hour.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits_only = !trimmed.is_empty()
            && trimmed.len() <= 2
            && trimmed.bytes().all(|b| b.is_ascii_digit());
        if !digits_only {
            return Err(MoonError::HourValue(s.to_string()));
        }
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(LocalHour::new)
            .ok_or_else(|| MoonError::HourValue(s.to_string()))
    }
}

impl fmt::Display for LocalHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// A UTC date and hour; minutes and seconds are always zero.
///
/// Field order matters: the derived ordering compares the date first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UtcTimestamp {
    date: NaiveDate,
    hour: u32,
}

impl UtcTimestamp {
    /// Truncates to the hour.
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self {
            date: dt.date_naive(),
            hour: dt.hour(),
        }
    }

    pub fn first_hour(date: NaiveDate) -> Self {
        Self { date, hour: 0 }
    }

    pub fn last_hour(date: NaiveDate) -> Self {
        Self { date, hour: 23 }
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{:02}", self.date.format("%Y-%m-%d"), self.hour)
    }
}

/// Which image the API is asked for, and the file extension it is saved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ImageQuality {
    /// 730x730 JPEG from `image.url`
    #[default]
    Standard,
    /// 5760x3240 TIFF from `image_highres.url`
    High,
}

impl ImageQuality {
    pub fn extension(self) -> &'static str {
        match self {
            ImageQuality::Standard => "jpg",
            ImageQuality::High => "tif",
        }
    }

    pub fn response_field(self) -> &'static str {
        match self {
            ImageQuality::Standard => "image",
            ImageQuality::High => "image_highres",
        }
    }
}

/// One resolved image: where it lives and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedHour {
    pub hour: LocalHour,
    pub reason: String,
}

#[derive(Debug)]
pub enum BatchOutcome {
    Completed,
    /// The user answered "no" when asked to confirm the batch.
    Declined,
    Aborted(MoonError),
}

#[derive(Debug)]
pub struct BatchResult {
    pub downloaded: usize,
    /// Image requests that came back non-2xx; nothing was written for them.
    pub empty: usize,
    pub skipped: Vec<SkippedHour>,
    pub outcome: BatchOutcome,
}

impl Default for BatchResult {
    fn default() -> Self {
        Self {
            downloaded: 0,
            empty: 0,
            skipped: Vec::new(),
            outcome: BatchOutcome::Completed,
        }
    }
}

impl BatchResult {
    pub fn exit_code(&self) -> u8 {
        match &self.outcome {
            BatchOutcome::Completed | BatchOutcome::Declined => 0,
            BatchOutcome::Aborted(MoonError::Cancelled) => 130,
            BatchOutcome::Aborted(_) => 1,
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = match &self.outcome {
            BatchOutcome::Completed => format!("Done. {} image(s) downloaded.", self.downloaded),
            BatchOutcome::Declined => "Nothing downloaded.".to_string(),
            BatchOutcome::Aborted(reason) => format!(
                "Aborted: {reason}. {} image(s) downloaded before stopping.",
                self.downloaded
            ),
        };
        if self.empty > 0 {
            summary.push_str(&format!(" {} request(s) returned no image.", self.empty));
        }
        if !self.skipped.is_empty() {
            summary.push_str(&format!(" {} hour(s) skipped:", self.skipped.len()));
            for skipped in &self.skipped {
                summary.push_str(&format!("\n  {}: {}", skipped.hour, skipped.reason));
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_hour_one_and_two_digits() {
        assert_eq!("5".parse::<LocalHour>().unwrap(), "05".parse::<LocalHour>().unwrap());
        assert_eq!("0".parse::<LocalHour>().unwrap().value(), 0);
        assert_eq!(" 23\n".parse::<LocalHour>().unwrap().value(), 23);
        assert_eq!("7".parse::<LocalHour>().unwrap().to_string(), "07");
    }

    #[test]
    fn test_local_hour_rejects_garbage() {
        for input in ["24", "-1", "", "abc", "005", "+5", "1.5"] {
            assert!(
                matches!(input.parse::<LocalHour>(), Err(MoonError::HourValue(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_timestamp_truncates_to_hour() {
        let dt = Utc.with_ymd_and_hms(2024, 2, 29, 23, 30, 59).unwrap();
        let ts = UtcTimestamp::from_datetime(&dt);
        assert_eq!(ts.to_string(), "2024-02-29T23");
    }

    #[test]
    fn test_timestamp_ordering_compares_date_first() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(UtcTimestamp::last_hour(d1) < UtcTimestamp::first_hour(d2));
        assert!(UtcTimestamp::first_hour(d1) < UtcTimestamp::last_hour(d1));
    }

    #[test]
    fn test_exit_codes() {
        let mut result = BatchResult::default();
        assert_eq!(result.exit_code(), 0);
        result.outcome = BatchOutcome::Aborted(MoonError::Cancelled);
        assert_eq!(result.exit_code(), 130);
        result.outcome = BatchOutcome::Aborted(MoonError::Transport("bad cert".into()));
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_summary_lists_skipped_hours() {
        let result = BatchResult {
            downloaded: 2,
            empty: 1,
            skipped: vec![SkippedHour {
                hour: LocalHour::new(3).unwrap(),
                reason: "out of range".into(),
            }],
            outcome: BatchOutcome::Completed,
        };
        let summary = result.summary();
        assert!(summary.starts_with("Done. 2 image(s) downloaded."));
        assert!(summary.contains("1 request(s) returned no image"));
        assert!(summary.contains("03: out of range"));
    }
}
