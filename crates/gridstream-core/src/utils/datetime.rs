//! Conversions between calendar date-times and serial day numbers.
//!
//! A serial value counts days (with a fractional time-of-day part) from the
//! workbook's configured origin date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Error, Result};

/// Build a `NaiveDateTime` from broken-down components.
///
/// # Errors
///
/// Fails when the components do not form a valid calendar date or time of
/// day.
pub fn date_time_from_parts(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: f64,
) -> Result<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        Error::InvalidArgument(format!("invalid date: {year:04}-{month:02}-{day:02}"))
    })?;
    let whole_seconds = second.trunc() as u32;
    let nanos = ((second - second.trunc()) * 1e9).round() as u32;
    let time = NaiveTime::from_hms_nano_opt(hour, minute, whole_seconds, nanos).ok_or_else(
        || Error::InvalidArgument(format!("invalid time of day: {hour}:{minute}:{second}")),
    )?;
    Ok(date.and_time(time))
}

/// Convert a date-time to a serial day count relative to the origin date.
pub fn to_serial(origin: NaiveDate, dt: NaiveDateTime) -> f64 {
    let days = (dt.date() - origin).num_days() as f64;
    let seconds = f64::from(dt.time().num_seconds_from_midnight())
        + f64::from(dt.time().nanosecond()) / 1e9;
    days + seconds / 86_400.0
}

/// Convert a serial day count back to a date-time.
pub fn from_serial(origin: NaiveDate, serial: f64) -> NaiveDateTime {
    let days = serial.floor() as i64;
    let frac = serial - serial.floor();
    let date = origin + chrono::Duration::days(days);
    let total_nanos = (frac * 86_400.0 * 1e9).round() as i64;
    let secs = (total_nanos / 1_000_000_000) as u32;
    let nanos = (total_nanos % 1_000_000_000) as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is valid"));
    date.and_time(time)
}

/// The default origin date used when none is configured.
pub fn default_origin() -> NaiveDate {
    let (y, m, d) = crate::utils::constants::DEFAULT_ORIGIN_DATE;
    NaiveDate::from_ymd_opt(y, m, d).expect("default origin date is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_round_trip() {
        let origin = default_origin();
        let dt = date_time_from_parts(2011, 6, 15, 12, 0, 0.0).unwrap();
        let serial = to_serial(origin, dt);
        assert_eq!(serial, 40709.5);
        assert_eq!(from_serial(origin, serial), dt);
    }

    #[test]
    fn test_serial_of_origin_is_zero() {
        let origin = default_origin();
        let dt = date_time_from_parts(1899, 12, 30, 0, 0, 0.0).unwrap();
        assert_eq!(to_serial(origin, dt), 0.0);
    }

    #[test]
    fn test_serial_honors_custom_origin() {
        // ODS documents commonly use 1904-01-01.
        let origin = NaiveDate::from_ymd_opt(1904, 1, 1).unwrap();
        let dt = date_time_from_parts(1904, 1, 2, 0, 0, 0.0).unwrap();
        assert_eq!(to_serial(origin, dt), 1.0);
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(date_time_from_parts(2020, 2, 30, 0, 0, 0.0).is_err());
        assert!(date_time_from_parts(2020, 13, 1, 0, 0, 0.0).is_err());
        assert!(date_time_from_parts(2020, 1, 1, 24, 0, 0.0).is_err());
    }

    #[test]
    fn test_fractional_seconds() {
        let origin = default_origin();
        let dt = date_time_from_parts(2000, 1, 1, 0, 0, 30.5).unwrap();
        let serial = to_serial(origin, dt);
        let back = from_serial(origin, serial);
        assert_eq!(back, dt);
    }
}
