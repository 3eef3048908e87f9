//! Calendar-day codec for ratings.
//!
//! A [`RatingDate`] is exchanged with clients as `"YYYY-MM-DD"` text and
//! persisted as a BSON datetime at midnight UTC of that day. Both encodings
//! share the same in-memory value, so neither carries time-of-day or zone.

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;

/// Years that fit in the four-digit wire form.
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateFormatError {
    #[error("expected a YYYY-MM-DD date, got {0:?}")]
    Malformed(String),

    #[error("date {0} is outside years 0000-9999")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RatingDate(NaiveDate);

impl RatingDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(|d| Self::try_from(d).ok())
    }
}

impl TryFrom<NaiveDate> for RatingDate {
    type Error = DateFormatError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
            Ok(Self(date))
        } else {
            Err(DateFormatError::OutOfRange(date.to_string()))
        }
    }
}

impl fmt::Display for RatingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_wire(*self))
    }
}

/// Parse `text` strictly as `YYYY-MM-DD`.
///
/// chrono's `%Y` accepts signs and any number of digits, so the shape is
/// checked byte by byte before the calendar check.
pub fn decode_wire(text: &str) -> Result<RatingDate, DateFormatError> {
    let malformed = || DateFormatError::Malformed(text.to_string());

    let bytes = text.as_bytes();
    if bytes.len() != 10 {
        return Err(malformed());
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return Err(malformed());
    }

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| malformed())?;
    RatingDate::try_from(date)
}

pub fn encode_wire(date: RatingDate) -> String {
    let d = date.0;
    format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
}

/// Midnight UTC of the given day.
pub fn encode_storage(date: RatingDate) -> bson::DateTime {
    let midnight = Utc.from_utc_datetime(&date.0.and_time(NaiveTime::MIN));
    bson::DateTime::from_chrono(midnight)
}

/// UTC calendar day of a stored timestamp; the time-of-day is dropped.
pub fn decode_storage(raw: bson::DateTime) -> Result<RatingDate, DateFormatError> {
    RatingDate::try_from(raw.to_chrono().date_naive())
}

/// serde adapter for the wire form, for use with `#[serde(with = "wire")]`.
pub mod wire {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{decode_wire, encode_wire, RatingDate};

    pub fn serialize<S>(date: &RatingDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&encode_wire(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<RatingDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        decode_wire(&text).map_err(de::Error::custom)
    }
}
