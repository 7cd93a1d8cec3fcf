//! Alignment keys linking a fine row to the coarse row that contains it.
//!
//! Keys are taken from the literal wall-clock timestamp; no time zone is
//! applied, so an hourly bar stamped `09:00` and the 5-minute bars stamped
//! `09:00`..`09:55` share a key.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub use market_data_ingestor::io::dataframe::parse_timestamp;

/// Calendar date plus hour of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HourKey {
    pub date: NaiveDate,
    pub hour: u32,
}

impl fmt::Display for HourKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}h", self.date, self.hour)
    }
}

/// Key of a daily row.
pub fn date_key(ts: NaiveDateTime) -> NaiveDate {
    ts.date()
}

/// Key of an hourly row.
pub fn hour_key(ts: NaiveDateTime) -> HourKey {
    HourKey {
        date: ts.date(),
        hour: ts.hour(),
    }
}

/// Which truncation a merge aligns on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Date,
    Hour,
}

/// A hashable key produced by [`KeyKind::key_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoarseKey {
    Date(NaiveDate),
    Hour(HourKey),
}

impl fmt::Display for CoarseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::Hour(key) => write!(f, "{key}"),
        }
    }
}

impl KeyKind {
    pub fn key_of(self, ts: NaiveDateTime) -> CoarseKey {
        match self {
            Self::Date => CoarseKey::Date(date_key(ts)),
            Self::Hour => CoarseKey::Hour(hour_key(ts)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn date_key_ignores_time_of_day() {
        assert_eq!(
            date_key(ts("2019-01-02 15:55:00")),
            NaiveDate::from_ymd_opt(2019, 1, 2).unwrap()
        );
        assert_eq!(date_key(ts("2019-01-02 00:00:00")), date_key(ts("2019-01-02 23:59:59")));
    }

    #[test]
    fn hour_key_truncates_minutes() {
        let key = hour_key(ts("2019-01-02 09:35:00"));
        assert_eq!(key.hour, 9);
        assert_eq!(key, hour_key(ts("2019-01-02 09:00:00")));
        assert_ne!(key, hour_key(ts("2019-01-02 10:00:00")));
        assert_eq!(key.to_string(), "2019-01-02 09h");
    }

    #[test]
    fn kinds_produce_distinct_keys() {
        let t = ts("2019-01-02 09:35:00");
        assert!(matches!(KeyKind::Date.key_of(t), CoarseKey::Date(_)));
        assert!(matches!(KeyKind::Hour.key_of(t), CoarseKey::Hour(_)));
    }
}
