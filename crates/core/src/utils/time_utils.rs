use chrono::{DateTime, NaiveTime, SecondsFormat, Timelike, Utc};

use crate::errors::{DatabaseError, Error, Result};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Canonical RFC 3339 text form used for stored timestamps.
///
/// Fixed millisecond precision with a `Z` suffix keeps lexical and
/// chronological ordering identical, which range filters rely on.
pub fn to_db_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_db_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            Error::Database(DatabaseError::Internal(format!(
                "Invalid stored timestamp '{}': {}",
                value, e
            )))
        })
}

pub fn parse_optional_db_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(parse_db_timestamp).transpose()
}

/// Shortest distance in minutes between two times of day, wrapping at midnight.
pub fn minutes_between_times_of_day(a: NaiveTime, b: NaiveTime) -> i64 {
    let a_minutes = i64::from(a.hour() * 60 + a.minute());
    let b_minutes = i64::from(b.hour() * 60 + b.minute());
    let diff = (a_minutes - b_minutes).abs();
    diff.min(MINUTES_PER_DAY - diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn db_timestamp_round_trips_and_sorts_lexically() {
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 1, 20, 30, 0).unwrap();
        let early_text = to_db_timestamp(&early);
        assert_eq!(early_text, "2026-03-01T08:00:00.000Z");
        assert!(early_text < to_db_timestamp(&late));
        assert_eq!(parse_db_timestamp(&early_text).unwrap(), early);
    }

    #[test]
    fn time_of_day_distance_wraps_midnight() {
        let before = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
        let after = NaiveTime::from_hms_opt(0, 10, 0).unwrap();
        assert_eq!(minutes_between_times_of_day(before, after), 20);
        let morning = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(minutes_between_times_of_day(morning, noon), 240);
    }
}
