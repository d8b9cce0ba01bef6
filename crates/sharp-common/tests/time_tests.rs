//! Tests for TAI timestamp parsing and formatting.

use sharp_common::time::{TaiTimestamp, TimeRange};

// ============================================================================
// Positional parse tests
// ============================================================================

#[test]
fn test_parse_fields() {
    let ts = TaiTimestamp::parse("2017.09.03_00:00_TAI").unwrap();
    assert_eq!(
        (ts.year(), ts.month(), ts.day(), ts.hour(), ts.minute()),
        (2017, 9, 3, 0, 0)
    );
}

#[test]
fn test_parse_minute_resolution() {
    let ts = TaiTimestamp::parse("2011.02.15_01:48_TAI").unwrap();
    assert_eq!(ts.hour(), 1);
    assert_eq!(ts.minute(), 48);
}

#[test]
fn test_parse_rejects_truncated_input() {
    // One character short of the minute field.
    assert!(TaiTimestamp::parse("2017.09.03_00:0").is_err());
}

#[test]
fn test_parse_rejects_shuffled_separators() {
    assert!(TaiTimestamp::parse("2017_09.03.00:00_TAI").is_err());
}

// ============================================================================
// Formatting round trips
// ============================================================================

#[test]
fn test_parse_format_idempotent() {
    // Parsing then reformatting reproduces the positional layout exactly.
    let inputs = [
        "2017.09.03_00:00_TAI",
        "2017.09.06_00:00_TAI",
        "2010.05.01_08:24_TAI",
        "2000.12.31_23:59_TAI",
    ];
    for input in inputs {
        let once = TaiTimestamp::parse(input).unwrap().to_string();
        assert_eq!(once, input);
        let twice = TaiTimestamp::parse(&once).unwrap().to_string();
        assert_eq!(twice, once);
    }
}

#[test]
fn test_format_zero_pads() {
    let ts = TaiTimestamp::new(987, 1, 2, 3, 4).unwrap();
    assert_eq!(ts.to_string(), "0987.01.02_03:04_TAI");
}

// ============================================================================
// Range tests
// ============================================================================

#[test]
fn test_range_display_matches_query_clause() {
    let start = TaiTimestamp::parse("2017.09.03_00:00_TAI").unwrap();
    let end = TaiTimestamp::parse("2017.09.06_00:00_TAI").unwrap();
    let range = TimeRange::new(start, end).unwrap();
    assert_eq!(
        range.to_string(),
        "2017.09.03_00:00_TAI-2017.09.06_00:00_TAI"
    );
}
