//! Turns the forum's "age" strings into absolute timestamps.
//!
//! Recent items carry a relative age ("3 days ago"); very old favorites carry
//! an absolute date prefixed with `on` ("on March 3, 2019"). Anything that
//! cannot be understood becomes [`zero_timestamp`].

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %Y",
];

/// The value used for "no usable time". Matches the zero time written by
/// earlier versions of the tool (`0001-01-01T00:00:00Z`).
pub fn zero_timestamp() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Resolves `raw` against `anchor`. Never fails: unknown input yields
/// [`zero_timestamp`].
pub fn parse_age(raw: &str, anchor: DateTime<Utc>) -> DateTime<Utc> {
    let raw = raw.trim();
    let mut tokens = raw.split_whitespace();
    let parsed = match tokens.next() {
        Some("on") => parse_absolute(&tokens.collect::<Vec<_>>().join(" ")),
        Some(_) => parse_relative(raw, anchor),
        None => None,
    };

    match parsed {
        Some(ts) => ts,
        None => {
            tracing::debug!(raw, "unrecognized age string; using zero timestamp");
            zero_timestamp()
        }
    }
}

fn parse_absolute(expr: &str) -> Option<DateTime<Utc>> {
    // The forum abbreviates September as "Sept".
    let expr = expr
        .split_whitespace()
        .map(|token| match token {
            "Sept" | "Sept." => "Sep",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ");
    let expr = expr.trim().trim_end_matches('.');
    if expr.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(expr) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(expr) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(expr, format) {
            return Some(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Some(date) = parse_date(expr, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

fn parse_date(expr: &str, format: &str) -> Option<NaiveDate> {
    if format == "%B %Y" {
        // Month-only dates need a day to be representable.
        return NaiveDate::parse_from_str(&format!("1 {expr}"), "%d %B %Y").ok();
    }
    NaiveDate::parse_from_str(expr, format).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl AgeUnit {
    fn parse(token: &str) -> Option<Self> {
        let token = token.to_ascii_lowercase();
        let unit = match token.trim_end_matches('s') {
            "sec" | "second" => Self::Second,
            "min" | "minute" => Self::Minute,
            "hr" | "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "yr" | "year" => Self::Year,
            _ => return None,
        };
        Some(unit)
    }
}

fn parse_relative(expr: &str, anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lowered = expr.to_ascii_lowercase();
    match lowered.as_str() {
        "now" | "just now" => return Some(anchor),
        "yesterday" => return anchor.checked_sub_signed(TimeDelta::try_days(1)?),
        _ => {}
    }

    let tokens = lowered.split_whitespace().collect::<Vec<_>>();
    let [count, unit, "ago"] = tokens.as_slice() else {
        return None;
    };

    let count: u32 = match *count {
        "a" | "an" | "one" => 1,
        digits => digits.parse().ok()?,
    };
    let unit = AgeUnit::parse(unit)?;

    let seconds_per = match unit {
        AgeUnit::Second => 1,
        AgeUnit::Minute => 60,
        AgeUnit::Hour => 60 * 60,
        AgeUnit::Day => 24 * 60 * 60,
        AgeUnit::Week => 7 * 24 * 60 * 60,
        AgeUnit::Month => return anchor.checked_sub_months(Months::new(count)),
        AgeUnit::Year => {
            return anchor.checked_sub_months(Months::new(count.checked_mul(12)?));
        }
    };

    let delta = TimeDelta::try_seconds(i64::from(count).checked_mul(seconds_per)?)?;
    anchor.checked_sub_signed(delta)
}
