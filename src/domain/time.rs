use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Weekday};

use super::error::DomainError;

/// Format used everywhere a date is shown to or read from the user.
pub const DATE_FORMAT: &str = "%y-%m-%d";

const MINUTE: f64 = 1.0 / 60.0;

/// Rounds fractional hours to the closest minute.
pub fn round_hours(hours: f64) -> f64 {
    (hours / MINUTE).round() * MINUTE
}

/// Formats fractional hours as `H:MM`, truncating the leftover minutes.
pub fn format_duration(hours: f64) -> String {
    let h = hours as i64;
    let m = ((hours - h as f64) * 60.0) as i64;
    format!("{h}:{m:02}")
}

/// Parses a 24h wall-clock time, `"HH:MM"`.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| DomainError::InvalidFormat)
}

/// Places a wall-clock time on the year/month/day of `date`.
pub fn at_clock_time(
    date: DateTime<Local>,
    clock: NaiveTime,
) -> Result<DateTime<Local>, DomainError> {
    Local
        .from_local_datetime(&date.date_naive().and_time(clock))
        .earliest()
        .ok_or(DomainError::InvalidDate)
}

/// Parses `"H:MM"` into fractional hours. Exactly two integer parts.
pub fn parse_duration(s: &str) -> Result<f64, DomainError> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(DomainError::InvalidFormat);
    }

    let hours: i64 = parts[0].parse().map_err(|_| DomainError::InvalidFormat)?;
    let minutes: i64 = parts[1].parse().map_err(|_| DomainError::InvalidFormat)?;

    Ok(hours as f64 + minutes as f64 / 60.0)
}

/// Resolves a user-supplied date token relative to `now`.
///
/// Empty, `now`, `today` and today's own `%y-%m-%d` spelling all mean the
/// current moment. `yesterday` and bare integers are day offsets. Anything
/// else has to parse as `%y-%m-%d`.
pub fn resolve_date_token(
    token: &str,
    now: DateTime<Local>,
) -> Result<DateTime<Local>, DomainError> {
    match token {
        "" | "now" | "today" => return Ok(now),
        "yesterday" => return Ok(now - Duration::days(1)),
        _ => {}
    }

    if token == now.format(DATE_FORMAT).to_string() {
        return Ok(now);
    }

    if let Ok(offset) = token.parse::<i64>() {
        return Ok(now + Duration::days(offset));
    }

    let date = NaiveDate::parse_from_str(token, DATE_FORMAT).map_err(|_| DomainError::InvalidDate)?;
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or(DomainError::InvalidDate)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
