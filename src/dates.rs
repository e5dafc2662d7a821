use chrono::{Days, NaiveDate};

use crate::error::MoonError;

/// Turns what the user typed into a calendar date.
///
/// `t` is today, `tm` tomorrow, `+N`/`-N` are day offsets from today, and
/// anything else must be a strict `YYYY-MM-DD` date.
pub fn resolve(token: &str, today: NaiveDate) -> Result<NaiveDate, MoonError> {
    let token = token.trim();
    let invalid = || MoonError::InvalidDateFormat(token.to_string());

    match token {
        "t" => Ok(today),
        "tm" => today.checked_add_days(Days::new(1)).ok_or_else(invalid),
        _ if token.starts_with('+') || token.starts_with('-') => {
            let offset: i64 = token.parse().map_err(|_| invalid())?;
            shift(today, offset).ok_or_else(invalid)
        }
        _ => parse_iso_date(token).ok_or_else(invalid),
    }
}

fn shift(date: NaiveDate, offset: i64) -> Option<NaiveDate> {
    let days = Days::new(offset.unsigned_abs());
    if offset >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    }
}

// chrono accepts unpadded months/days and signed years; the API does not.
fn parse_iso_date(token: &str) -> Option<NaiveDate> {
    let bytes = token.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}
