//! Timestamp normalization for feed entries and persisted stories.
//!
//! Feeds disagree about date formats: RFC 2822 (`Tue, 02 Jan 2024 15:04:05
//! GMT`), RFC 3339 with `Z` or `+00:00`, and the colon-less `+0000` variant.
//! Everything funnels into epoch seconds so collections can be totally
//! ordered; anything unparseable degrades to a sentinel that sorts last in
//! descending order. Nothing in here returns an error.

use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

/// Sentinel for missing/unparseable timestamps. Descending sorts put it last,
/// which matches "treat as earliest possible".
pub const EPOCH_SENTINEL: i64 = i64::MIN;

/// Parse an arbitrary timestamp string into epoch seconds (UTC).
///
/// Returns [`EPOCH_SENTINEL`] for `None`, empty input, or any format we do
/// not recognize.
pub fn normalize(ts: Option<&str>) -> i64 {
    let Some(raw) = ts else {
        return EPOCH_SENTINEL;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return EPOCH_SENTINEL;
    }

    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return dt.to_offset(UtcOffset::UTC).unix_timestamp();
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc2822) {
        return dt.to_offset(UtcOffset::UTC).unix_timestamp();
    }
    // chrono is more forgiving about RFC 2822 obsolete zone names.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(raw) {
        return dt.timestamp();
    }
    // Colon-less numeric offsets ("2024-01-02T15:04:05+0000") are not valid
    // RFC 3339; chrono's %z accepts both spellings.
    if let Ok(dt) = chrono::DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return dt.timestamp();
    }

    EPOCH_SENTINEL
}

/// Format epoch seconds as the legacy UTC shape used in the persisted files:
/// `%Y-%m-%dT%H:%M:%SZ`.
pub fn format_utc(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Current wall-clock time in the legacy UTC shape.
pub fn now_utc_string() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Current epoch seconds.
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Format a legacy UTC timestamp string as RFC 822 for RSS `pubDate` fields.
/// Unparseable input falls back to the current time.
pub fn to_rfc822(ts: &str) -> String {
    let epoch = match normalize(Some(ts)) {
        EPOCH_SENTINEL => now_epoch(),
        e => e,
    };
    chrono::DateTime::from_timestamp(epoch, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2822_and_rfc3339_agree_on_the_same_instant() {
        let a = normalize(Some("Tue, 02 Jan 2024 15:04:05 GMT"));
        let b = normalize(Some("2024-01-02T15:04:05Z"));
        let c = normalize(Some("2024-01-02T15:04:05+00:00"));
        let d = normalize(Some("2024-01-02T15:04:05+0000"));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c, d);
        assert_eq!(a, 1704207845);
    }

    #[test]
    fn offsets_shift_to_utc() {
        let utc = normalize(Some("2024-01-02T15:04:05Z"));
        let plus_two = normalize(Some("2024-01-02T17:04:05+02:00"));
        assert_eq!(utc, plus_two);
    }

    #[test]
    fn garbage_and_absent_yield_sentinel() {
        assert_eq!(normalize(None), EPOCH_SENTINEL);
        assert_eq!(normalize(Some("")), EPOCH_SENTINEL);
        assert_eq!(normalize(Some("   ")), EPOCH_SENTINEL);
        assert_eq!(normalize(Some("not a date")), EPOCH_SENTINEL);
        assert_eq!(normalize(Some("2024-13-99")), EPOCH_SENTINEL);
    }

    #[test]
    fn normalized_values_order_chronologically() {
        let older = normalize(Some("Mon, 01 Jan 2024 00:00:00 GMT"));
        let newer = normalize(Some("2024-01-02T00:00:00Z"));
        assert!(newer > older);
        assert!(EPOCH_SENTINEL < older);
    }

    #[test]
    fn format_round_trips_through_normalize() {
        let s = format_utc(1704207845);
        assert_eq!(s, "2024-01-02T15:04:05Z");
        assert_eq!(normalize(Some(&s)), 1704207845);
    }

    #[test]
    fn rfc822_formatting_matches_rss_expectations() {
        assert_eq!(
            to_rfc822("2024-01-02T15:04:05Z"),
            "Tue, 02 Jan 2024 15:04:05 GMT"
        );
    }
}
