//! Free-text date and time parsing.
//!
//! Listing dates carry no year ("aug 15 fri"). The year is inferred from the
//! run's reference date: default to its year, and if the resulting date is
//! more than 30 days in the past, roll forward to the next year. This is a
//! heuristic for year-less source data, not a law; tests pin both sides of
//! the 30-day boundary.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::month_number;
use crate::domain::TimeInfo;
use crate::error::{EtlError, Result};

/// How far in the past a candidate date may be before it is assumed to
/// belong to next year.
const PAST_TOLERANCE_DAYS: i64 = 30;

static TIME_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").unwrap());

/// A resolved calendar date plus its epoch instant (midnight UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub epoch_ms: i64,
}

/// Epoch milliseconds of midnight UTC on a date.
pub fn date_epoch_ms(date: NaiveDate) -> i64 {
    NaiveDateTime::new(date, NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Whether a line opens with a date token ("aug 15", "Aug 15 fri").
pub fn is_date_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    let month_ok = tokens.next().map(month_number).flatten().is_some();
    let day_ok = tokens
        .next()
        .map(|t| t.trim_end_matches([',', '.']).parse::<u32>().is_ok())
        .unwrap_or(false);
    month_ok && day_ok
}

/// Parse a `"<month> <day> [<weekday>]"` date line relative to `today`.
pub fn parse_date(text: &str, today: NaiveDate) -> Result<ParsedDate> {
    let mut tokens = text.split_whitespace();
    let month_token = tokens
        .next()
        .ok_or_else(|| EtlError::Format(format!("empty date: '{text}'")))?;
    let month = month_number(month_token)
        .ok_or_else(|| EtlError::Format(format!("unknown month token: '{month_token}'")))?;
    let day_token = tokens
        .next()
        .ok_or_else(|| EtlError::Format(format!("missing day in date: '{text}'")))?;
    let day: u32 = day_token
        .trim_end_matches([',', '.'])
        .parse()
        .map_err(|_| EtlError::Format(format!("invalid day token: '{day_token}'")))?;
    if !(1..=31).contains(&day) {
        return Err(EtlError::Format(format!("day out of range: {day}")));
    }
    // The optional trailing weekday abbreviation is advisory only

    let candidate = NaiveDate::from_ymd_opt(today.year(), month, day)
        .ok_or_else(|| EtlError::Format(format!("no such date: month {month} day {day}")))?;
    let date = if (today - candidate).num_days() > PAST_TOLERANCE_DAYS {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day).ok_or_else(|| {
            EtlError::Format(format!("no such date next year: month {month} day {day}"))
        })?
    } else {
        candidate
    };

    Ok(ParsedDate {
        date,
        epoch_ms: date_epoch_ms(date),
    })
}

/// Parse `"<door>/<show>"` or a single time token. The last slash-segment is
/// the show time; an earlier segment, if present, is the door time. Hours
/// 1-11 without am/pm default to PM, evening shows being the norm.
pub fn parse_time(text: &str) -> Result<TimeInfo> {
    let segments: Vec<&str> = text.split('/').map(str::trim).filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(EtlError::Format(format!("empty time: '{text}'")));
    }

    let start_time = parse_time_segment(segments[segments.len() - 1])?;
    let door_time = if segments.len() > 1 {
        Some(parse_time_segment(segments[segments.len() - 2])?)
    } else {
        None
    };

    Ok(TimeInfo {
        start_time: Some(start_time),
        door_time,
    })
}

fn parse_time_segment(segment: &str) -> Result<String> {
    let caps = TIME_SEGMENT_RE
        .captures(segment)
        .ok_or_else(|| EtlError::Format(format!("unparseable time segment: '{segment}'")))?;
    let mut hour: u32 = caps[1]
        .parse()
        .map_err(|_| EtlError::Format(format!("invalid hour: '{segment}'")))?;
    let minute: u32 = caps
        .get(2)
        .map(|m| m.as_str().parse())
        .transpose()
        .map_err(|_| EtlError::Format(format!("invalid minute: '{segment}'")))?
        .unwrap_or(0);

    match caps.get(3).map(|m| m.as_str().to_lowercase()) {
        Some(meridiem) => {
            if hour == 0 || hour > 12 {
                return Err(EtlError::Format(format!("hour out of range for am/pm: '{segment}'")));
            }
            if meridiem == "am" {
                if hour == 12 {
                    hour = 0;
                }
            } else if hour != 12 {
                hour += 12;
            }
        }
        None => {
            // Hours 12 and 0 pass through unchanged
            if (1..=11).contains(&hour) {
                hour += 12;
            }
        }
    }

    if hour > 23 || minute > 59 {
        return Err(EtlError::Format(format!("time out of range: '{segment}'")));
    }
    Ok(format!("{hour:02}:{minute:02}"))
}
