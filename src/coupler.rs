//! Parsing of the `coupler.res` timestamp file.
//!
//! The file has three lines, each starting with whitespace-separated integers
//! followed by a free-text description:
//!
//! ```text
//!      2        (Calendar: no_calendar=0, thirty_day_months=1, julian=2, gregorian=3, noleap=4)
//!   2016     8     1     0     0     0        Model start time:   year, month, day, hour, minute, second
//!   2016     8     1     0    15     0        Current model time: year, month, day, hour, minute, second
//! ```

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Calendar declared on the first line of `coupler.res`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Calendar {
    /// `no_calendar`
    NoCalendar,
    /// `thirty_day_months`
    ThirtyDayMonths,
    /// `julian`
    Julian,
    /// `gregorian`
    Gregorian,
    /// `noleap`
    NoLeap,
}

impl Calendar {
    fn from_id(id: i64) -> Result<Self> {
        match id {
            0 => Ok(Calendar::NoCalendar),
            1 => Ok(Calendar::ThirtyDayMonths),
            2 => Ok(Calendar::Julian),
            3 => Ok(Calendar::Gregorian),
            4 => Ok(Calendar::NoLeap),
            other => Err(Error::CouplerRes(format!("unknown calendar id {other}"))),
        }
    }
}

/// Parsed contents of `coupler.res`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouplerRes {
    /// Calendar type
    pub calendar: Calendar,
    /// Model start time
    pub start_time: NaiveDateTime,
    /// Current model time
    pub current_time: NaiveDateTime,
}

impl CouplerRes {
    /// Parse the text of a `coupler.res` file.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let mut next_line = |what: &str| {
            lines
                .next()
                .ok_or_else(|| Error::CouplerRes(format!("missing {what} line")))
        };
        let calendar_line = next_line("calendar")?;
        let start_line = next_line("start time")?;
        let current_line = next_line("current time")?;

        let calendar_id = leading_integers(calendar_line, 1)?[0];
        Ok(CouplerRes {
            calendar: Calendar::from_id(calendar_id)?,
            start_time: parse_datetime(start_line)?,
            current_time: parse_datetime(current_line)?,
        })
    }
}

/// Current model time recorded in a `coupler.res` file.
pub fn current_date_from_coupler_res(text: &str) -> Result<NaiveDateTime> {
    Ok(CouplerRes::parse(text)?.current_time)
}

fn leading_integers(line: &str, count: usize) -> Result<Vec<i64>> {
    let values: Vec<i64> = line
        .split_whitespace()
        .take(count)
        .map(|token| {
            token
                .parse()
                .map_err(|_| Error::CouplerRes(format!("expected integer, found {token:?}")))
        })
        .collect::<Result<_>>()?;
    if values.len() < count {
        return Err(Error::CouplerRes(format!(
            "expected {count} integers in line {line:?}"
        )));
    }
    Ok(values)
}

fn parse_datetime(line: &str) -> Result<NaiveDateTime> {
    let v = leading_integers(line, 6)?;
    let invalid = || Error::CouplerRes(format!("invalid date in line {line:?}"));
    let field = |x: i64| u32::try_from(x).map_err(|_| invalid());
    let year = i32::try_from(v[0]).map_err(|_| invalid())?;
    let (hour, minute, second) = (field(v[3])?, field(v[4])?, field(v[5])?);
    NaiveDate::from_ymd_opt(year, field(v[1])?, field(v[2])?)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)
}
