use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Current wall-clock time as epoch milliseconds.
///
/// Last-sync timestamps and retention thresholds are all epoch millis; this
/// is the single place the pipeline reads the clock.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parses a feed date string to epoch milliseconds.
///
/// Feeds are inconsistent about date formats: Atom mandates RFC 3339, RSS
/// mandates RFC 2822, and plenty of feeds ship something slightly off-spec.
/// Tries the two standard formats first, then a couple of common naive
/// fallbacks (interpreted as UTC). Returns `None` for anything that still
/// does not parse; callers store such items with no publish date.
pub fn parse_date_millis(date: &str) -> Option<i64> {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.timestamp_millis());
    }

    // Off-spec feeds often drop the timezone entirely
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }
    if let Ok(date_only) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date_only.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
    }

    None
}

/// Formats epoch milliseconds as a short human-readable UTC date string.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn format_date(millis: i64) -> Option<String> {
    let dt = Utc.timestamp_millis_opt(millis).single()?;
    Some(dt.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(
            parse_date_millis("2024-05-01T12:00:00Z"),
            Some(1_714_564_800_000)
        );
    }

    #[test]
    fn test_parse_rfc2822() {
        assert_eq!(
            parse_date_millis("Wed, 01 May 2024 12:00:00 GMT"),
            Some(1_714_564_800_000)
        );
    }

    #[test]
    fn test_parse_naive_fallback() {
        assert_eq!(
            parse_date_millis("2024-05-01 12:00:00"),
            Some(1_714_564_800_000)
        );
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(
            parse_date_millis("2024-05-01"),
            Some(1_714_521_600_000)
        );
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_date_millis("yesterday-ish"), None);
        assert_eq!(parse_date_millis(""), None);
        assert_eq!(parse_date_millis("   "), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date(1_714_564_800_000).as_deref(),
            Some("2024-05-01 12:00")
        );
    }

    #[test]
    fn test_format_round_trips_parse() {
        let millis = parse_date_millis("2023-11-05T08:30:00Z").unwrap();
        assert_eq!(format_date(millis).as_deref(), Some("2023-11-05 08:30"));
    }
}
