//! Timestamp values with recorded precision

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Timelike, Utc};

use crate::error::{Result, SiphonError};

/// How much of a timestamp was actually written in the source.
///
/// Rendering reproduces exactly the recorded precision instead of padding
/// every value out to nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPrecision {
    /// `2007T`
    Year,
    /// `2007-02T`
    Month,
    /// `2007-02-23`
    Day,
    /// `2007-02-23T12:14Z`
    Minute,
    /// `2007-02-23T12:14:33Z`
    Second,
    /// `2007-02-23T12:14:33.079Z`, with the written fraction digit count
    Fractional(u8),
}

/// Point in time with recorded precision and UTC offset
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamp {
    /// The instant; date-only precisions carry midnight UTC.
    pub datetime: DateTime<FixedOffset>,
    /// Precision the source actually wrote.
    pub precision: TimestampPrecision,
}

impl Timestamp {
    /// Parse from the interchange text notation.
    ///
    /// Accepted shapes: `2007T`, `2007-02T`, `2007-02-23`, `2007-02-23T`,
    /// and date + `T` + time with a mandatory `Z` or `±HH:MM` offset
    /// (`2007-02-23T12:14:33.079-08:00`). Errors carry no byte offset;
    /// callers re-anchor with [`SiphonError::at_offset`].
    pub fn from_text(s: &str) -> Result<Self> {
        let bad = |cause: &str| SiphonError::decode(0, format!("invalid timestamp '{s}': {cause}"));

        // Date-only precisions
        if let Some(date_part) = s.strip_suffix('T') {
            match date_part.len() {
                4 => {
                    let year = parse_digits(date_part, "year")?;
                    let date = NaiveDate::from_ymd_opt(year as i32, 1, 1)
                        .ok_or_else(|| bad("year out of range"))?;
                    return Self::from_date(date, TimestampPrecision::Year);
                }
                7 => {
                    let (year, month) = parse_year_month(date_part)?;
                    let date = NaiveDate::from_ymd_opt(year, month, 1)
                        .ok_or_else(|| bad("month out of range"))?;
                    return Self::from_date(date, TimestampPrecision::Month);
                }
                10 => {
                    let date = parse_date(date_part)?;
                    return Self::from_date(date, TimestampPrecision::Day);
                }
                _ => {}
            }
        }

        if s.len() == 10 && !s.contains('T') {
            let date = parse_date(s)?;
            return Self::from_date(date, TimestampPrecision::Day);
        }

        // Date + time: split on the mandatory 'T'
        let t_pos = s.find('T').ok_or_else(|| bad("missing 'T' separator"))?;
        let date = parse_date(&s[..t_pos])?;
        let rest = &s[t_pos + 1..];

        // Split off the offset suffix
        let (time_part, offset) = if let Some(stripped) = rest.strip_suffix('Z') {
            (stripped, Utc.fix())
        } else if let Some(sign_pos) = rest.rfind(['+', '-']) {
            let (time_part, offset_part) = rest.split_at(sign_pos);
            (time_part, parse_offset(offset_part)?)
        } else {
            return Err(bad("time precision requires a 'Z' or '±HH:MM' offset"));
        };

        let (time, precision) = parse_time(time_part)?;
        let naive = NaiveDateTime::new(date, time);
        let datetime = naive
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| bad("ambiguous local time"))?;
        Ok(Self {
            datetime,
            precision,
        })
    }

    fn from_date(date: NaiveDate, precision: TimestampPrecision) -> Result<Self> {
        let naive = NaiveDateTime::new(date, NaiveTime::MIN);
        let datetime = naive
            .and_local_timezone(Utc.fix())
            .single()
            .ok_or_else(|| SiphonError::decode(0, "invalid date"))?;
        Ok(Self {
            datetime,
            precision,
        })
    }

    /// Render in the interchange/RFC 3339 style at the recorded precision.
    pub fn to_text(&self) -> String {
        use chrono::Datelike;
        let dt = &self.datetime;
        match self.precision {
            TimestampPrecision::Year => format!("{:04}T", dt.year()),
            TimestampPrecision::Month => format!("{:04}-{:02}T", dt.year(), dt.month()),
            TimestampPrecision::Day => {
                format!("{:04}-{:02}-{:02}", dt.year(), dt.month(), dt.day())
            }
            TimestampPrecision::Minute => {
                format!("{}T{:02}:{:02}{}", self.date_text(), dt.hour(), dt.minute(), self.offset_text())
            }
            TimestampPrecision::Second => format!(
                "{}T{:02}:{:02}:{:02}{}",
                self.date_text(),
                dt.hour(),
                dt.minute(),
                dt.second(),
                self.offset_text()
            ),
            TimestampPrecision::Fractional(digits) => {
                let digits = digits.clamp(1, 9) as u32;
                let frac = dt.nanosecond() / 10u32.pow(9 - digits);
                format!(
                    "{}T{:02}:{:02}:{:02}.{:0width$}{}",
                    self.date_text(),
                    dt.hour(),
                    dt.minute(),
                    dt.second(),
                    frac,
                    self.offset_text(),
                    width = digits as usize
                )
            }
        }
    }

    fn date_text(&self) -> String {
        use chrono::Datelike;
        format!(
            "{:04}-{:02}-{:02}",
            self.datetime.year(),
            self.datetime.month(),
            self.datetime.day()
        )
    }

    fn offset_text(&self) -> String {
        let secs = self.datetime.offset().local_minus_utc();
        if secs == 0 {
            return "Z".to_string();
        }
        let sign = if secs < 0 { '-' } else { '+' };
        let abs = secs.unsigned_abs();
        format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }
}

fn parse_digits(s: &str, what: &str) -> Result<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SiphonError::decode(0, format!("invalid {what} '{s}'")));
    }
    s.parse::<u32>()
        .map_err(|_| SiphonError::decode(0, format!("invalid {what} '{s}'")))
}

fn parse_year_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| SiphonError::decode(0, format!("invalid year-month '{s}'")))?;
    if year.len() != 4 || month.len() != 2 {
        return Err(SiphonError::decode(0, format!("invalid year-month '{s}'")));
    }
    Ok((parse_digits(year, "year")? as i32, parse_digits(month, "month")?))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return Err(SiphonError::decode(0, format!("invalid date '{s}'")));
    }
    let year = parse_digits(parts[0], "year")? as i32;
    let month = parse_digits(parts[1], "month")?;
    let day = parse_digits(parts[2], "day")?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| SiphonError::decode(0, format!("date out of range '{s}'")))
}

fn parse_offset(s: &str) -> Result<FixedOffset> {
    let bad = || SiphonError::decode(0, format!("invalid offset '{s}'"));
    let (sign, rest) = match s.split_at(1) {
        ("+", rest) => (1i32, rest),
        ("-", rest) => (-1i32, rest),
        _ => return Err(bad()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(bad)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(bad());
    }
    let hours = parse_digits(hours, "offset hours")?;
    let minutes = parse_digits(minutes, "offset minutes")?;
    if hours > 23 || minutes > 59 {
        return Err(bad());
    }
    FixedOffset::east_opt(sign * (hours as i32 * 3600 + minutes as i32 * 60)).ok_or_else(bad)
}

fn parse_time(s: &str) -> Result<(NaiveTime, TimestampPrecision)> {
    let bad = || SiphonError::decode(0, format!("invalid time '{s}'"));
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [h, m] => {
            let time = NaiveTime::from_hms_opt(
                parse_digits(h, "hours")?,
                parse_digits(m, "minutes")?,
                0,
            )
            .ok_or_else(bad)?;
            Ok((time, TimestampPrecision::Minute))
        }
        [h, m, sec] => {
            let hours = parse_digits(h, "hours")?;
            let minutes = parse_digits(m, "minutes")?;
            if let Some((whole, frac)) = sec.split_once('.') {
                if frac.is_empty() || frac.len() > 9 {
                    return Err(bad());
                }
                let digits = frac.len() as u8;
                let frac_value = parse_digits(frac, "fraction")?;
                let nanos = frac_value * 10u32.pow(9 - frac.len() as u32);
                let time = NaiveTime::from_hms_nano_opt(
                    hours,
                    minutes,
                    parse_digits(whole, "seconds")?,
                    nanos,
                )
                .ok_or_else(bad)?;
                Ok((time, TimestampPrecision::Fractional(digits)))
            } else {
                let time =
                    NaiveTime::from_hms_opt(hours, minutes, parse_digits(sec, "seconds")?)
                        .ok_or_else(bad)?;
                Ok((time, TimestampPrecision::Second))
            }
        }
        _ => Err(bad()),
    }
}
