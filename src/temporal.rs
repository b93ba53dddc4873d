// ⏳ Temporal helpers - close-approach date strings
//
// The JPL close-approach data carries times as "2029-Apr-13 21:46" (UTC,
// minute resolution). Output never shows seconds because the source has none.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format of the `cd` field in `cad.json`
pub const CD_FORMAT: &str = "%Y-%b-%d %H:%M";

/// Canonical output format
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse a calendar date-hour string into a UTC instant
///
/// # Examples:
/// ```
/// use neo_graph::temporal::{cd_to_datetime, datetime_to_str};
///
/// let time = cd_to_datetime("2029-Apr-13 21:46").unwrap();
/// assert_eq!(datetime_to_str(&time), "2029-04-13 21:46");
/// ```
pub fn cd_to_datetime(calendar_date: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(calendar_date.trim(), CD_FORMAT).map(|naive| naive.and_utc())
}

/// Format a UTC instant without seconds
pub fn datetime_to_str(time: &DateTime<Utc>) -> String {
    time.format(OUTPUT_FORMAT).to_string()
}
