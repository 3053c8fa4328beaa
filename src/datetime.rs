use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("date pattern compiles"));

static TIME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("time pattern compiles")
});

/// A calendar date, a time of day, or both, with an optional zone offset.
///
/// Keeps the lexical shape it was written in so the writer reproduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Datetime {
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    offset: Option<FixedOffset>,
}

impl Default for Datetime {
    fn default() -> Self {
        Self::zero()
    }
}

impl Datetime {
    /// `0001-01-01T00:00:00`, the placeholder for literals that fail to materialize.
    pub fn zero() -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(1, 1, 1),
            time: Some(NaiveTime::MIN),
            offset: None,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { date: Some(date), time: None, offset: None }
    }

    pub fn from_time(time: NaiveTime, offset: Option<FixedOffset>) -> Self {
        Self { date: None, time: Some(time), offset }
    }

    pub fn from_naive(datetime: NaiveDateTime, offset: Option<FixedOffset>) -> Self {
        Self {
            date: Some(datetime.date()),
            time: Some(datetime.time()),
            offset,
        }
    }

    /// Seconds since the Unix epoch, in UTC.
    pub fn from_timestamp(seconds: i64) -> Option<Self> {
        let utc = DateTime::from_timestamp(seconds, 0)?;
        Some(Self::from_naive(utc.naive_utc(), FixedOffset::east_opt(0)))
    }

    /// Materialize a datetime literal.
    ///
    /// Accepts the date, time and combined shapes the scanner recognizes. A
    /// pure-digit text that matches none of them is read as a Unix timestamp
    /// in seconds. The parser never gets here with such text, since the
    /// scanner makes every pure-digit literal an integer; integer values
    /// reach timestamps through `FromNode for Datetime` instead.
    pub fn parse(text: &str) -> Option<Self> {
        if let Some((date, time)) = text.split_once('T') {
            let date = parse_date(date)?;
            let (time, offset) = parse_time(time)?;
            return Some(Self { date: Some(date), time: Some(time), offset });
        }
        if let Some(date) = parse_date(text) {
            return Some(Self::from_date(date));
        }
        if let Some((time, offset)) = parse_time(text) {
            return Some(Self::from_time(time, offset));
        }
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            return text.parse::<i64>().ok().and_then(Self::from_timestamp);
        }
        None
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// Date and time combined; a missing part counts as midnight or the zero date.
    pub fn naive(&self) -> NaiveDateTime {
        let date = self.date.or(Self::zero().date).unwrap_or_default();
        date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_SHAPE.captures(text)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_time(text: &str) -> Option<(NaiveTime, Option<FixedOffset>)> {
    let caps = TIME_SHAPE.captures(text)?;
    let hour = caps[1].parse().ok()?;
    let minute = caps[2].parse().ok()?;
    let second = match caps.get(3) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };
    let nanos = match caps.get(4) {
        // right-pad the fraction to nine digits
        Some(f) => format!("{:0<9}", f.as_str()).parse().ok()?,
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;

    let offset = match caps.get(5).map(|m| m.as_str()) {
        None => None,
        Some("Z") => Some(FixedOffset::east_opt(0)?),
        Some(zone) => {
            let sign = if zone.starts_with('-') { -1 } else { 1 };
            let hours: i32 = zone[1..3].parse().ok()?;
            let minutes: i32 = zone[4..6].parse().ok()?;
            if minutes > 59 {
                return None;
            }
            Some(FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?)
        }
    };
    Some((time, offset))
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(date) = self.date {
            write!(f, "{}", date.format("%Y-%m-%d"))?;
            if self.time.is_some() {
                write!(f, "T")?;
            }
        }
        if let Some(time) = self.time {
            write!(f, "{}", time.format("%H:%M:%S"))?;
            if time.nanosecond() != 0 {
                let fraction = format!("{:09}", time.nanosecond());
                write!(f, ".{}", fraction.trim_end_matches('0'))?;
            }
            match self.offset.map(|o| o.local_minus_utc()) {
                None => {}
                Some(0) => write!(f, "Z")?,
                Some(seconds) => {
                    let sign = if seconds < 0 { '-' } else { '+' };
                    let seconds = seconds.abs();
                    write!(f, "{}{:02}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60)?;
                }
            }
        }
        Ok(())
    }
}
