use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::UtcTimestamp;

/// Everything that can go wrong between reading the user's date and writing
/// the last image.
#[derive(Debug, Error)]
pub enum MoonError {
    #[error("Invalid date {0:?}. Use t (today), tm (tomorrow), +N / -N (days from today) or YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("Please enter a value between 00 and 23 (got {0:?})")]
    HourValue(String),

    #[error("The hour of the first Moon visualization image ({start:02}) should be earlier than the last ({end:02})")]
    HoursOrder { start: u32, end: u32 },

    #[error("{timestamp} UTC is outside the supported range {first} to {last} UTC")]
    DateOutOfRange {
        timestamp: UtcTimestamp,
        first: UtcTimestamp,
        last: UtcTimestamp,
    },

    #[error("Local time {0} does not exist in the configured timezone")]
    NonexistentLocalTime(NaiveDateTime),

    #[error("API did not respond ({0}). Check API URL or network connection")]
    EndpointUnavailable(String),

    #[error("Secure connection failed: {0}")]
    Transport(String),

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Program stopped by user")]
    Cancelled,
}

impl MoonError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Bad user input; the prompt that produced it asks again.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateFormat(_) | Self::HourValue(_) | Self::HoursOrder { .. }
        )
    }

    /// Affects a single hour only; the batch moves on to the next one.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::DateOutOfRange { .. } | Self::NonexistentLocalTime(_)
        )
    }
}
