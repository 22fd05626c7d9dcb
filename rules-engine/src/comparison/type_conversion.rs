//! Best-effort coercion of raw trait and condition values.
//!
//! Rule data comes from semi-trusted input, so none of these conversions fail:
//! anything that can't be read degrades to `false`, `0` or no date.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

// JavaScript's Date.toString() spells out US zone names; map them onto the
// abbreviations the zone table understands.
const LONG_ZONE_NAMES: &[(&str, &str)] = &[
    ("Alaska Standard Time", "AKST"),
    ("Central Standard Time", "CST"),
    ("Eastern Standard Time", "EST"),
    ("Hawaii Standard Time", "HST"),
    ("Mountain Standard Time", "MST"),
    ("Pacific Standard Time", "PST"),
];

const ZONE_OFFSET_HOURS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
    ("AKST", -9),
    ("AKDT", -8),
    ("HST", -10),
];

const ZONED_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%a %b %d %Y %H:%M:%S"];

pub fn string_to_bool(value: &str) -> bool {
    value == "true"
}

pub fn string_to_i64(value: &str) -> i64 {
    value.parse::<i64>().unwrap_or(0)
}

/// Parses the date formats rule authors and SDKs are known to send:
///
/// - ISO-8601 / RFC 3339, with or without fractional seconds
/// - `YYYY-MM-DD`
/// - `YYYY-MM-DD HH:MM:SS <ZONE>`
/// - JavaScript `Date.toString()` output, e.g.
///   `Tue Jan 16 2024 12:44:18 GMT-0500 (Eastern Standard Time)`, and its
///   date-only and abbreviated-zone variants
///
/// Returns `None` for empty or unrecognised input.
pub fn string_to_date(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_known_formats(value) {
        return Some(date);
    }

    let mut replaced = value.to_string();
    for (name, abbreviation) in LONG_ZONE_NAMES {
        replaced = replaced.replace(name, abbreviation);
    }
    if replaced == value {
        return None;
    }
    parse_known_formats(&replaced)
}

fn parse_known_formats(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d", "%a %b %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_time(NaiveTime::MIN).and_utc());
        }
    }

    let (body, zone_name) = split_zone_parenthetical(value);
    if let Some(zone_name) = zone_name {
        if !is_zone_abbreviation(zone_name) {
            return None;
        }
    }

    if let Ok(date) = DateTime::parse_from_str(body, "%a %b %d %Y %H:%M:%S GMT%z") {
        return Some(date.with_timezone(&Utc));
    }

    // A parenthesised zone is only valid after an explicit GMT offset
    if zone_name.is_some() {
        return None;
    }

    let (naive_part, abbreviation) = body.rsplit_once(' ')?;
    let offset = zone_offset(abbreviation)?;
    ZONED_DATETIME_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(naive_part, format).ok()?;
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|date| date.with_timezone(&Utc))
    })
}

fn split_zone_parenthetical(value: &str) -> (&str, Option<&str>) {
    match value.strip_suffix(')').and_then(|rest| rest.rsplit_once(" (")) {
        Some((body, zone_name)) => (body, Some(zone_name)),
        None => (value, None),
    }
}

fn is_zone_abbreviation(value: &str) -> bool {
    (3..=5).contains(&value.len()) && value.chars().all(|c| c.is_ascii_uppercase())
}

/// Known abbreviations resolve to their offset; any other abbreviation-shaped
/// zone is read as UTC.
fn zone_offset(abbreviation: &str) -> Option<FixedOffset> {
    if !is_zone_abbreviation(abbreviation) {
        return None;
    }
    let hours = ZONE_OFFSET_HOURS
        .iter()
        .find(|(name, _)| *name == abbreviation)
        .map(|(_, hours)| *hours)
        .unwrap_or(0);
    FixedOffset::east_opt(hours * 3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use test_case::test_case;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_empty_string_is_no_date() {
        assert_eq!(string_to_date(""), None);
    }

    #[test]
    fn test_iso_string() {
        let parsed = string_to_date("2024-01-15T21:59:40.162Z").unwrap();
        assert_eq!(parsed.timestamp(), utc(2024, 1, 15, 21, 59, 40).timestamp());
        assert_eq!(parsed.nanosecond(), 162_000_000);
    }

    #[test]
    fn test_iso_string_with_offset() {
        assert_eq!(
            string_to_date("2024-01-15T21:59:40-05:00"),
            Some(utc(2024, 1, 16, 2, 59, 40))
        );
    }

    #[test]
    fn test_plain_date() {
        assert_eq!(string_to_date("2024-01-15"), Some(utc(2024, 1, 15, 0, 0, 0)));
    }

    #[test]
    fn test_javascript_to_string() {
        assert_eq!(
            string_to_date("Tue Jan 16 2024 12:44:18 GMT-0500 (Eastern Standard Time)"),
            Some(utc(2024, 1, 16, 17, 44, 18))
        );
    }

    #[test_case("Tue Jan 16 2024 12:44:18 GMT-0800 (PST)", utc(2024, 1, 16, 20, 44, 18); "abbreviated zone in parens")]
    #[test_case("Tue Jan 16 2024 12:44:18 GMT+0100", utc(2024, 1, 16, 11, 44, 18); "offset without zone name")]
    #[test_case("Tue Jan 16 2024 12:44:18 CST", utc(2024, 1, 16, 18, 44, 18); "abbreviated zone suffix")]
    #[test_case("Tue Jan 16 2024", utc(2024, 1, 16, 0, 0, 0); "date only")]
    #[test_case("2023-09-18 13:52:16 UTC", utc(2023, 9, 18, 13, 52, 16); "space separated utc")]
    #[test_case("2023-09-18 13:52:16 EST", utc(2023, 9, 18, 18, 52, 16); "space separated eastern")]
    fn test_supported_formats(input: &str, expected: DateTime<Utc>) {
        assert_eq!(string_to_date(input), Some(expected));
    }

    #[test_case("not a date"; "garbage")]
    #[test_case("2024-13-45"; "out of range")]
    #[test_case("Tue Jan 16 2024 12:44:18 GMT-0100 (Central European Standard Time)"; "unmapped zone name")]
    fn test_unparsable_dates(input: &str) {
        assert_eq!(string_to_date(input), None);
    }

    #[test]
    fn test_string_to_i64_defaults_to_zero() {
        assert_eq!(string_to_i64("42"), 42);
        assert_eq!(string_to_i64("-7"), -7);
        assert_eq!(string_to_i64(""), 0);
        assert_eq!(string_to_i64("4.5"), 0);
        assert_eq!(string_to_i64("abc"), 0);
    }

    #[test]
    fn test_string_to_bool_is_exact() {
        assert!(string_to_bool("true"));
        assert!(!string_to_bool("True"));
        assert!(!string_to_bool("1"));
        assert!(!string_to_bool(""));
    }
}
