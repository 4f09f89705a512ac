//! Lenient parsing of the date strings found in stored tasks.
//!
//! Tasks written by different versions carry plain dates (`2024-06-01`),
//! `datetime-local` values (`2024-06-01T14:30`), full RFC 3339 timestamps and
//! free-form times of day (`9:00 AM`). Everything is interpreted in local time.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 5] = ["%I:%M %p", "%I:%M%p", "%H:%M:%S", "%H:%M", "%I:%M:%S %p"];

/// The current local time without offset.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Formats a local timestamp the way tasks store them (RFC 3339).
pub fn timestamp(now: NaiveDateTime) -> String {
    match Local.from_local_datetime(&now).earliest() {
        Some(dt) => dt.to_rfc3339(),
        None => now.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

/// Parses a date or datetime string into a local date.
///
/// Empty and unparseable strings yield `None`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    parse_datetime(s).map(|dt| dt.date())
}

/// Parses a string carrying both a date and a time of day.
///
/// Plain dates return `None`: they do not pin a moment.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parses a time of day such as `9:00 AM`, `9 pm` or `21:30`.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let candidates = [s.to_string(), with_minutes(s)];
    candidates.iter().find_map(|c| {
        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(c, fmt).ok())
    })
}

/// "9 AM" -> "9:00 AM", "9pm" -> "9:00pm", "21" -> "21:00".
fn with_minutes(s: &str) -> String {
    if s.contains(':') {
        return s.to_string();
    }
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    let rest = &s[digits.len()..];
    format!("{}:00{}", digits, rest)
}

/// The next local midnight strictly after `now`.
pub fn next_midnight(now: NaiveDateTime) -> NaiveDateTime {
    let tomorrow = now.date().succ_opt().unwrap_or(NaiveDate::MAX);
    tomorrow.and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_and_local_dates() {
        assert_eq!(parse_date("2024-06-01"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date("2024-06-01T14:30"), Some(date(2024, 6, 1)));
        assert_eq!(parse_date(" 2024-06-01 09:00 "), Some(date(2024, 6, 1)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("next tuesday"), None);
    }

    #[test]
    fn test_plain_date_is_not_a_datetime() {
        assert_eq!(parse_datetime("2024-06-01"), None);
        assert_eq!(
            parse_datetime("2024-06-01T14:30"),
            Some(date(2024, 6, 1).and_hms_opt(14, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_time_of_day() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(parse_time_of_day("9:00 AM"), Some(t(9, 0)));
        assert_eq!(parse_time_of_day("12:00 PM"), Some(t(12, 0)));
        assert_eq!(parse_time_of_day("7 PM"), Some(t(19, 0)));
        assert_eq!(parse_time_of_day("21:30"), Some(t(21, 30)));
        assert_eq!(parse_time_of_day("after lunch"), None);
    }

    #[test]
    fn test_next_midnight() {
        let now = date(2024, 12, 31).and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(next_midnight(now), date(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap());

        let midnight = date(2024, 6, 1).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(next_midnight(midnight), date(2024, 6, 2).and_hms_opt(0, 0, 0).unwrap());
    }
}
