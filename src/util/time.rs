use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Calendar date at a fixed UTC offset, formatted `YYYY-MM-DD`.
pub fn today_at_offset(now: DateTime<Utc>, offset_hours: i32) -> String {
    let shifted = now + Duration::hours(offset_hours as i64);
    shifted.format("%Y-%m-%d").to_string()
}

// Parse a free-form record date. Accepts "YYYY-MM-DD", "YYYY-MM-DD HH:MM:SS[.f]",
// "YYYY-MM-DDTHH:MM:SS[.f]" and RFC3339. Returns None if unparseable.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() { return None; }
    // "YYYY-MM-DD"
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    // naive timestamps, either separator
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // RFC3339 keeps the local calendar date
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_rolls_over_with_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 18, 30, 0).unwrap();
        assert_eq!(today_at_offset(now, 7), "2024-04-01");
        assert_eq!(today_at_offset(now, 0), "2024-03-31");
    }

    #[test]
    fn parses_supported_forms() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(parse_calendar_date("2024-02-15"), Some(d));
        assert_eq!(parse_calendar_date(" 2024-02-15 "), Some(d));
        assert_eq!(parse_calendar_date("2024-02-15 08:00:00"), Some(d));
        assert_eq!(parse_calendar_date("2024-02-15T23:59:59.5"), Some(d));
        assert_eq!(parse_calendar_date("2024-02-15T23:00:00+07:00"), Some(d));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_calendar_date("not-a-date"), None);
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("2024-02-30"), None);
        assert_eq!(parse_calendar_date("15/02/2024"), None);
    }
}
