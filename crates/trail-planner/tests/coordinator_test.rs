//! Provider fallback and per-day resolution tests.

mod common;

use common::*;
use std::time::Duration;
use trail_core::{ActivityType, Severity};
use trail_planner::{DayOutcome, RoutingCoordinator};

/// Test that a failing first provider hands the day to the next one.
#[tokio::test]
async fn test_fallback_reports_second_provider() {
    let log = CallLog::default();
    let coordinator = RoutingCoordinator::new(vec![
        Scripted::new("first", 1, &log, |_| Err(server_error())),
        Scripted::new("second", 2, &log, |wps| Ok(Some(route(wps, 9.0)))),
        Scripted::new("third", 3, &log, |wps| Ok(Some(route(wps, 1.0)))),
    ]);

    let outcome = coordinator.resolve_day(&day(0), ActivityType::Hiking).await;
    match outcome {
        DayOutcome::Resolved { route, .. } => {
            assert_eq!(route.source_provider, "second");
            assert_eq!(route.distance_km, 9.0);
        }
        other => panic!("expected a route, got {other:?}"),
    }

    let names: Vec<_> = log.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(names, vec!["first", "second"]);
}

/// Test that "no route" is treated like a failure for fallback purposes.
#[tokio::test]
async fn test_empty_answer_falls_through() {
    let log = CallLog::default();
    let coordinator = RoutingCoordinator::new(vec![
        Scripted::new("empty", 1, &log, |_| Ok(None)),
        Scripted::new("last", 3, &log, |wps| Ok(Some(route(wps, 6.0)))),
    ]);
    let outcome = coordinator.resolve_day(&day(0), ActivityType::Cycling).await;
    assert!(matches!(
        outcome,
        DayOutcome::Resolved { ref route, .. } if route.source_provider == "last"
    ));
}

/// Test that one unroutable day does not affect its neighbours.
#[tokio::test]
async fn test_unrouted_day_is_isolated() {
    let log = CallLog::default();
    let broken_day = first_lat(1);
    let reply = move |wps: &[trail_core::Coordinate]| {
        if wps[0].lat == broken_day {
            Err(server_error())
        } else {
            Ok(Some(route(wps, 8.0)))
        }
    };
    let coordinator = RoutingCoordinator::new(vec![
        Scripted::new("a", 1, &log, reply),
        Scripted::new("b", 2, &log, reply),
    ]);

    let outcome = coordinator
        .resolve_itinerary(&itinerary(ActivityType::Cycling, 3))
        .await;

    let routed: Vec<_> = outcome.routes.iter().map(|r| r.day_index).collect();
    assert_eq!(routed, vec![0, 2]);
    assert_eq!(outcome.unrouted_days, vec![1]);
    assert!(outcome.report.errors.is_empty());
}

/// Test that every day tries providers strictly in priority order.
#[tokio::test]
async fn test_provider_order_per_day() {
    let log = CallLog::default();
    let coordinator = RoutingCoordinator::new(vec![
        Scripted::new("osrm", 3, &log, |wps| Ok(Some(route(wps, 7.0)))),
        Scripted::new("brouter", 1, &log, |_| Ok(None)),
        Scripted::new("ors", 2, &log, |_| Err(server_error())),
    ]);

    coordinator
        .resolve_itinerary(&itinerary(ActivityType::Cycling, 3))
        .await;

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls.len(), 9);
    for day_index in 0..3 {
        let order: Vec<_> = calls
            .iter()
            .filter(|(_, lat)| *lat == first_lat(day_index))
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(order, vec!["brouter", "ors", "osrm"], "day {}", day_index + 1);
    }
}

/// Test that days are routed concurrently but reported in day order.
#[tokio::test(start_paused = true)]
async fn test_days_resolve_concurrently() {
    let log = CallLog::default();
    let coordinator = RoutingCoordinator::new(vec![Scripted::slow(
        "slow",
        1,
        Duration::from_secs(2),
        &log,
        20.0,
    )]);

    let started = tokio::time::Instant::now();
    let outcome = coordinator
        .resolve_itinerary(&itinerary(ActivityType::Cycling, 4))
        .await;

    assert!(started.elapsed() < Duration::from_secs(3));
    let days: Vec<_> = outcome.summaries.iter().map(|s| s.day).collect();
    assert_eq!(days, vec![1, 2, 3, 4]);
}

/// Test that resolved distances feed the validation report.
#[tokio::test]
async fn test_short_hiking_day_warns() {
    let log = CallLog::default();
    let coordinator = RoutingCoordinator::new(vec![Scripted::new("a", 1, &log, |wps| {
        Ok(Some(route(wps, 3.2)))
    })]);

    let outcome = coordinator.resolve_itinerary(&hiking_loop()).await;
    assert_eq!(outcome.report.warnings.len(), 1);
    assert_eq!(outcome.report.warnings[0].severity, Severity::Warning);
    assert_eq!(
        outcome.report.warnings[0].message,
        "Day 1: Route is 3.2km (below 5km minimum for hiking)"
    );
    assert!(outcome.report.is_valid);
}

/// Test that a long cycling day is an error and flips validity.
#[tokio::test]
async fn test_long_cycling_day_errors() {
    let log = CallLog::default();
    let coordinator = RoutingCoordinator::new(vec![Scripted::new("a", 1, &log, |wps| {
        Ok(Some(route(wps, 75.0)))
    })]);

    let outcome = coordinator
        .resolve_itinerary(&itinerary(ActivityType::Cycling, 1))
        .await;
    assert_eq!(outcome.report.errors.len(), 1);
    assert!(!outcome.report.is_valid);
}

/// Test that an exhausted chain leaves every day unrouted without panicking.
#[tokio::test]
async fn test_all_providers_failing() {
    let log = CallLog::default();
    let coordinator = RoutingCoordinator::new(vec![Scripted::new("a", 1, &log, |_| {
        Err(server_error())
    })]);
    let outcome = coordinator
        .resolve_itinerary(&itinerary(ActivityType::Cycling, 2))
        .await;
    assert!(outcome.routes.is_empty());
    assert_eq!(outcome.unrouted_days, vec![0, 1]);
    assert_eq!(log.lock().unwrap().len(), 2);
}
