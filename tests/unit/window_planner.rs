//! Unit tests for the window planner

use chrono::{NaiveDateTime, TimeDelta};
use retail_traffic_extractor::window::{next_window, plan_next};
use retail_traffic_extractor::{parse_timestamp, Granularity};

fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

fn days(d: f64) -> TimeDelta {
    TimeDelta::milliseconds((d * 86_400_000.0) as i64)
}

#[test]
fn test_window_is_contained_in_range() {
    let watermark = ts("2023-03-10T06:30:00");
    let boundary = ts("2023-03-20T00:00:00");
    let window = next_window(watermark, boundary, days(3.0)).unwrap();

    assert_eq!(window.from, watermark);
    assert!(window.to <= boundary);
    assert!(window.from < window.to);
}

#[test]
fn test_exhaustive_tiling_without_gaps_or_overlaps() {
    let start = ts("2023-01-01T00:00:00");
    let boundary = ts("2023-02-01T00:00:00");

    for interval_days in [0.25, 1.0, 2.5, 7.0, 45.0] {
        let interval = days(interval_days);
        let mut watermark = start;
        let mut previous_to = None;
        let mut iterations = 0;

        while let Some(window) = next_window(watermark, boundary, interval) {
            if let Some(previous) = previous_to {
                assert_eq!(window.from, previous, "gap or overlap at {window}");
            } else {
                assert_eq!(window.from, start);
            }
            assert!(window.to <= boundary);
            previous_to = Some(window.to);
            watermark = window.to;

            iterations += 1;
            assert!(iterations < 1000, "planner did not terminate");
        }

        assert_eq!(previous_to, Some(boundary), "range not fully covered");
        assert_eq!(next_window(watermark, boundary, interval), None);
    }
}

#[test]
fn test_interval_wider_than_range_yields_single_window() {
    let window = next_window(
        ts("2023-01-01T00:00:00"),
        ts("2023-01-02T00:00:00"),
        days(30.0),
    )
    .unwrap();
    assert_eq!(window.to, ts("2023-01-02T00:00:00"));
}

#[test]
fn test_granularity_annotation_recomputed_per_window() {
    let cutover = Some(ts("2023-04-27T00:00:00"));
    let boundary = ts("2023-05-07T00:00:00");
    let interval = days(5.0);

    let mut watermark = ts("2023-04-17T00:00:00");
    let mut granularities = Vec::new();
    while let Some(planned) = plan_next(watermark, boundary, interval, cutover) {
        granularities.push(planned.granularity);
        watermark = planned.window.to;
    }

    // 04-17 and 04-22 start before the cutover, 04-27 and 05-02 after.
    assert_eq!(
        granularities,
        vec![
            Granularity::Hour,
            Granularity::Hour,
            Granularity::FifteenMinutes,
            Granularity::FifteenMinutes,
        ]
    );
}
