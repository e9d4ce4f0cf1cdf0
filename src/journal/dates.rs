use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// Parses a client-supplied entry date.
///
/// Accepts RFC 3339 (`2024-03-15T14:30:00+07:00`), a naive timestamp
/// (`2024-03-15T14:30:00`, read as UTC) or a bare day (`2024-03-15`).
pub fn parse_entry_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}

/// Drops the time of day, keeping the calendar day as seen in the date's own
/// offset.
pub fn truncate_to_midnight(date: DateTime<FixedOffset>) -> NaiveDateTime {
    date.date_naive().and_time(NaiveTime::MIN)
}
