//! Unit tests for timestamp resolution.
//!
//! Run with: cargo test --test timestamp_unit_test

mod common;

use chrono::{FixedOffset, TimeZone, Utc};
use satoyama_db::error::AppError;
use satoyama_db::services::timestamp::DEFAULT_DATETIME_FORMATS;
use satoyama_db::services::{ResolveTimestamp, TimestampInput, TimestampResolver};

use common::at;

#[test]
fn date_only_format_resolves_to_midnight() {
    let resolver = TimestampResolver::new(["%Y-%m-%d", "%Y-%m-%dT%H:%M:%S"]);

    let resolved = resolver.resolve(Some("2023-05-01".into())).unwrap();
    assert_eq!(resolved, at(2023, 5, 1, 0, 0, 0));
}

#[test]
fn later_formats_are_tried_in_order() {
    let resolver = TimestampResolver::new(["%Y-%m-%d", "%Y-%m-%dT%H:%M:%S"]);

    let resolved = resolver.resolve(Some("2023-05-01T08:15:30".into())).unwrap();
    assert_eq!(resolved, at(2023, 5, 1, 8, 15, 30));
}

#[test]
fn first_matching_format_wins_for_ambiguous_text() {
    let day_first = TimestampResolver::new(["%d/%m/%Y", "%m/%d/%Y"]);
    let month_first = TimestampResolver::new(["%m/%d/%Y", "%d/%m/%Y"]);

    assert_eq!(
        day_first.resolve(Some("04/05/2023".into())).unwrap(),
        at(2023, 5, 4, 0, 0, 0)
    );
    assert_eq!(
        month_first.resolve(Some("04/05/2023".into())).unwrap(),
        at(2023, 4, 5, 0, 0, 0)
    );
}

#[test]
fn structured_input_passes_through() {
    let resolver = TimestampResolver::new(Vec::<String>::new());
    let moment = at(2020, 1, 2, 3, 4, 5);

    assert_eq!(resolver.resolve(Some(moment.into())).unwrap(), moment);

    let utc = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(resolver.resolve(Some(TimestampInput::from(utc))).unwrap(), moment);
}

#[test]
fn unmatched_text_is_an_error_not_now() {
    let resolver = TimestampResolver::default();

    let err = resolver.resolve(Some("yesterday-ish".into())).unwrap_err();
    match err {
        AppError::TimestampResolution { input } => assert_eq!(input, "yesterday-ish"),
        other => panic!("expected TimestampResolution, got {other:?}"),
    }
}

#[test]
fn absent_or_blank_timestamp_is_missing() {
    let resolver = TimestampResolver::default();

    assert!(matches!(
        resolver.resolve(None),
        Err(AppError::MissingField("timestamp"))
    ));
    assert!(matches!(
        resolver.resolve(Some("   ".into())),
        Err(AppError::MissingField("timestamp"))
    ));
}

#[test]
fn default_formats_cover_common_layouts() {
    let resolver = TimestampResolver::default();
    assert_eq!(resolver.formats().len(), DEFAULT_DATETIME_FORMATS.len());

    assert_eq!(
        resolver.resolve(Some("2024-02-29 23:59:58".into())).unwrap(),
        at(2024, 2, 29, 23, 59, 58)
    );
    assert_eq!(
        resolver.resolve(Some("2024-02-29T23:59:58".into())).unwrap(),
        at(2024, 2, 29, 23, 59, 58)
    );
    assert_eq!(
        resolver.resolve(Some(" 2024-02-29 23:59 ".into())).unwrap(),
        at(2024, 2, 29, 23, 59, 0)
    );
    assert_eq!(
        resolver.resolve(Some("2024-02-29".into())).unwrap(),
        at(2024, 2, 29, 0, 0, 0)
    );

    let fractional = resolver.resolve(Some("2024-02-29 23:59:58.250".into())).unwrap();
    assert_eq!(fractional.and_utc().timestamp_subsec_millis(), 250);
}

#[test]
fn hour_only_format_keeps_the_hour() {
    let resolver = TimestampResolver::new(["%Y-%m-%dT%H"]);

    assert_eq!(
        resolver.resolve(Some("2023-05-01T15".into())).unwrap(),
        at(2023, 5, 1, 15, 0, 0)
    );
}

#[test]
fn offset_text_matches_structured_input() {
    let resolver = TimestampResolver::new(["%Y-%m-%dT%H:%M:%S%z"]);
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let structured = tokyo.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();

    let from_text = resolver.resolve(Some("2023-05-01T12:00:00+0900".into())).unwrap();
    let from_structured = resolver.resolve(Some(structured.into())).unwrap();

    assert_eq!(from_text, at(2023, 5, 1, 3, 0, 0));
    assert_eq!(from_text, from_structured);
}
