//! Purpose: Date/time variants that string values can be converted into.
//! Exports: `Temporal`, `OffsetTime`, `ZonedDateTime`, `Instant`, parse helpers.
//! Role: Canonical ISO-8601 text formats for parsing and for serialization.
//! Invariants: Every variant renders back to text its own parser accepts.
//! Invariants: `Instant` is always normalized to UTC.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time, UtcOffset};

use crate::core::error::{Error, ErrorKind};

type Format = &'static [BorrowedFormatItem<'static>];

const DATE_FORMAT: Format = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: Format = format_description!("[hour]:[minute]:[second]");
const FRACTIONAL_TIME_FORMAT: Format =
    format_description!("[hour]:[minute]:[second].[subsecond digits:1+]");
const SHORT_TIME_FORMAT: Format = format_description!("[hour]:[minute]");
const OFFSET_FORMAT: Format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
const SECOND_OFFSET_FORMAT: Format =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]:[offset_second]");
const EXTENDED_DATE_TIME_FORMAT: Format = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:1+][offset_hour sign:mandatory]:[offset_minute]:[offset_second]"
);

#[derive(Clone, Debug, PartialEq)]
pub enum Temporal {
    Date(Date),
    Time(Time),
    OffsetTime(OffsetTime),
    OffsetDateTime(OffsetDateTime),
    Zoned(ZonedDateTime),
    Instant(Instant),
}

impl Temporal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Date(_) => "Date",
            Self::Time(_) => "Time",
            Self::OffsetTime(_) => "OffsetTime",
            Self::OffsetDateTime(_) => "OffsetDateTime",
            Self::Zoned(_) => "ZonedDateTime",
            Self::Instant(_) => "Instant",
        }
    }

    /// Canonical ISO-8601 text, accepted back by the matching parser.
    pub fn to_text(&self) -> Result<String, Error> {
        match self {
            Self::Date(date) => format_date(*date),
            Self::Time(time) => format_time(*time),
            Self::OffsetTime(time) => time.to_text(),
            Self::OffsetDateTime(datetime) => format_date_time(*datetime),
            Self::Zoned(zoned) => zoned.to_text(),
            Self::Instant(instant) => instant.to_text(),
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, self.to_text())
    }
}

fn write_text(f: &mut fmt::Formatter<'_>, text: Result<String, Error>) -> fmt::Result {
    f.write_str(&text.map_err(|_| fmt::Error)?)
}

fn invalid(kind: &str, input: &str) -> Error {
    Error::new(ErrorKind::Parse).with_message(format!("invalid {kind} text `{input}`"))
}

fn unformattable(kind: &str, err: time::error::Format) -> Error {
    Error::new(ErrorKind::Serialize)
        .with_message(format!("{kind} cannot be written as ISO-8601 text"))
        .with_source(err)
}

pub fn parse_date(input: &str) -> Result<Date, Error> {
    Date::parse(input, DATE_FORMAT).map_err(|err| invalid("date", input).with_source(err))
}

pub fn parse_time(input: &str) -> Result<Time, Error> {
    [FRACTIONAL_TIME_FORMAT, TIME_FORMAT, SHORT_TIME_FORMAT]
        .into_iter()
        .find_map(|format| Time::parse(input, format).ok())
        .ok_or_else(|| invalid("time", input))
}

pub fn parse_offset(input: &str) -> Result<UtcOffset, Error> {
    if input == "Z" {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(input, OFFSET_FORMAT)
        .or_else(|_| UtcOffset::parse(input, SECOND_OFFSET_FORMAT))
        .map_err(|err| invalid("offset", input).with_source(err))
}

pub fn parse_offset_date_time(input: &str) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(input, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(input, EXTENDED_DATE_TIME_FORMAT))
        .map_err(|err| invalid("offset date-time", input).with_source(err))
}

fn format_date(date: Date) -> Result<String, Error> {
    date.format(DATE_FORMAT).map_err(|err| unformattable("date", err))
}

/// Seconds are always written; the fraction only when non-zero, without trailing zeros.
fn format_time(time: Time) -> Result<String, Error> {
    let format = if time.nanosecond() == 0 {
        TIME_FORMAT
    } else {
        FRACTIONAL_TIME_FORMAT
    };
    time.format(format).map_err(|err| unformattable("time", err))
}

fn format_offset(offset: UtcOffset) -> Result<String, Error> {
    if offset.is_utc() {
        return Ok("Z".to_string());
    }
    let format = if offset.seconds_past_minute() == 0 {
        OFFSET_FORMAT
    } else {
        SECOND_OFFSET_FORMAT
    };
    offset.format(format).map_err(|err| unformattable("offset", err))
}

/// RFC 3339 where it can express the value; offset seconds and years before 0000
/// fall back to the extended form.
fn format_date_time(datetime: OffsetDateTime) -> Result<String, Error> {
    datetime
        .format(&Rfc3339)
        .or_else(|_| datetime.format(EXTENDED_DATE_TIME_FORMAT))
        .map_err(|err| unformattable("date-time", err))
}

/// Wall-clock time with a fixed UTC offset, e.g. `15:37:56+01:00`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OffsetTime {
    pub time: Time,
    pub offset: UtcOffset,
}

impl OffsetTime {
    pub fn new(time: Time, offset: UtcOffset) -> Self {
        Self { time, offset }
    }

    pub fn to_text(&self) -> Result<String, Error> {
        Ok(format_time(self.time)? + &format_offset(self.offset)?)
    }
}

impl FromStr for OffsetTime {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        let split = input
            .rfind(['+', '-', 'Z'])
            .ok_or_else(|| invalid("offset time", input))?;
        let (time, offset) = input.split_at(split);
        Ok(Self {
            time: parse_time(time)?,
            offset: parse_offset(offset)?,
        })
    }
}

impl fmt::Display for OffsetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, self.to_text())
    }
}

/// Offset date-time with an optional region id suffix, e.g.
/// `2022-05-07T10:15:30+01:00[Europe/Paris]`. The region is carried as text.
#[derive(Clone, Debug, PartialEq)]
pub struct ZonedDateTime {
    pub datetime: OffsetDateTime,
    pub zone: Option<String>,
}

impl FromStr for ZonedDateTime {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        let (stamp, zone) = match input.find('[') {
            Some(open) => {
                let zone = input[open + 1..]
                    .strip_suffix(']')
                    .filter(|zone| !zone.is_empty())
                    .ok_or_else(|| invalid("zoned date-time", input))?;
                (&input[..open], Some(zone.to_string()))
            }
            None => (input, None),
        };
        Ok(Self {
            datetime: parse_offset_date_time(stamp)?,
            zone,
        })
    }
}

impl ZonedDateTime {
    pub fn to_text(&self) -> Result<String, Error> {
        let stamp = format_date_time(self.datetime)?;
        Ok(match &self.zone {
            Some(zone) => format!("{stamp}[{zone}]"),
            None => stamp,
        })
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, self.to_text())
    }
}

/// A point on the UTC time line, rendered as `2022-05-07T10:15:30Z`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Instant(OffsetDateTime);

impl Instant {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn from_offset_date_time(datetime: OffsetDateTime) -> Self {
        Self(datetime.to_offset(UtcOffset::UTC))
    }

    pub fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    pub fn to_text(&self) -> Result<String, Error> {
        format_date_time(self.0)
    }
}

impl FromStr for Instant {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        parse_offset_date_time(input).map(Self::from_offset_date_time)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, self.to_text())
    }
}

macro_rules! text_serde {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let text = self.to_text().map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    )*};
}

text_serde!(OffsetTime, ZonedDateTime, Instant);
