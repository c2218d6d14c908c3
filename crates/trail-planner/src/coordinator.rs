//! Per-day route resolution with provider fallback.
//!
//! Each routable day walks the provider chain in priority order until one
//! returns a usable path. Days are resolved concurrently and independently;
//! a day that no provider can route is reported, never fatal.

use std::sync::{Arc, Mutex, Weak};

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use trail_core::{
    validate_day_distance, validate_loop_closure, ActivityType, DayPlan, Itinerary, ResolvedRoute,
    ValidationReport,
};
use trail_routing::{LineStyle, RoutingProvider};

use crate::artifacts::ArtifactSet;
use crate::surface::{DisplaySurface, RouteArtifact};

/// How a single day ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    Resolved { route: ResolvedRoute, style: LineStyle },
    /// Every provider was tried and none produced a path.
    Unrouted { day_index: usize },
    /// Fewer than two waypoints; nothing to route.
    Skipped { day_index: usize },
}

impl DayOutcome {
    pub fn day_index(&self) -> usize {
        match self {
            DayOutcome::Resolved { route, .. } => route.day_index,
            DayOutcome::Unrouted { day_index } | DayOutcome::Skipped { day_index } => *day_index,
        }
    }
}

/// One line per routed day, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: usize,
    pub distance_km: f64,
    pub provider: String,
}

/// Result of routing a whole itinerary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoutingOutcome {
    /// Ordered by day index
    pub routes: Vec<ResolvedRoute>,
    pub report: ValidationReport,
    pub unrouted_days: Vec<usize>,
    pub skipped_days: Vec<usize>,
    pub summaries: Vec<DaySummary>,
}

impl RoutingOutcome {
    pub fn total_distance_km(&self) -> f64 {
        self.routes.iter().map(|route| route.distance_km).sum()
    }
}

pub struct RoutingCoordinator {
    providers: Vec<Arc<dyn RoutingProvider>>,
}

impl RoutingCoordinator {
    /// Providers are ordered by priority; ties keep their given order.
    pub fn new(mut providers: Vec<Arc<dyn RoutingProvider>>) -> Self {
        providers.sort_by_key(|provider| provider.priority());
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Try each provider in turn for one day.
    ///
    /// # Arguments
    /// * `day` - The day to route; its waypoints are used in order
    /// * `activity` - Profile passed to every provider
    ///
    /// # Returns
    /// The first usable route, or `Unrouted` once the chain is exhausted
    pub async fn resolve_day(&self, day: &DayPlan, activity: ActivityType) -> DayOutcome {
        self.resolve_day_while(day, activity, &|| true).await
    }

    /// Like [`resolve_day`](Self::resolve_day), but stops walking the chain
    /// before the next provider once `is_current` turns false.
    async fn resolve_day_while<C>(
        &self,
        day: &DayPlan,
        activity: ActivityType,
        is_current: &C,
    ) -> DayOutcome
    where
        C: Fn() -> bool,
    {
        let waypoints = day.coordinates();
        if waypoints.len() < 2 {
            debug!("Day {}: fewer than two waypoints, skipping", day.day_number());
            return DayOutcome::Skipped {
                day_index: day.day_index,
            };
        }

        for provider in &self.providers {
            if !is_current() {
                debug!(
                    "Day {}: pass superseded, not trying {}",
                    day.day_number(),
                    provider.name()
                );
                return DayOutcome::Unrouted {
                    day_index: day.day_index,
                };
            }
            debug!("Day {}: trying {}", day.day_number(), provider.name());
            match provider.resolve(&waypoints, activity).await {
                Ok(Some(geometry)) => {
                    info!(
                        "Day {}: {} returned {:.2}km",
                        day.day_number(),
                        provider.name(),
                        geometry.distance_km
                    );
                    return DayOutcome::Resolved {
                        route: ResolvedRoute {
                            day_index: day.day_index,
                            geometry: geometry.geometry,
                            distance_km: geometry.distance_km,
                            source_provider: provider.name().to_string(),
                        },
                        style: provider.line_style(activity),
                    };
                }
                Ok(None) => debug!("Day {}: {} found no route", day.day_number(), provider.name()),
                Err(err) => warn!(
                    "Day {}: {} routing failed: {}",
                    day.day_number(),
                    provider.name(),
                    err
                ),
            }
        }

        warn!("Day {}: all routing services failed", day.day_number());
        DayOutcome::Unrouted {
            day_index: day.day_index,
        }
    }

    /// Route every day without drawing anything.
    pub async fn resolve_itinerary(&self, itinerary: &Itinerary) -> RoutingOutcome {
        self.run(itinerary, || true, |_, _| {})
            .await
            .unwrap_or_default()
    }

    /// Route every day and draw each route on `surface` as it arrives.
    ///
    /// `is_current` is polled before each provider attempt and as results
    /// come in. Once it turns false no further provider is tried, calls
    /// already in flight finish and are ignored, anything this pass drew is
    /// removed and `None` is returned.
    pub async fn route_itinerary<S, C>(
        &self,
        itinerary: &Itinerary,
        surface: &Weak<S>,
        artifacts: &Mutex<ArtifactSet>,
        generation: u64,
        is_current: C,
    ) -> Option<RoutingOutcome>
    where
        S: DisplaySurface + ?Sized,
        C: Fn() -> bool,
    {
        let draw = |route: &ResolvedRoute, style: LineStyle| {
            let mut set = artifacts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if !is_current() {
                return;
            }
            let Some(surface) = surface.upgrade() else {
                debug!("Day {}: surface gone, not drawing", route.day_index + 1);
                return;
            };
            if let Err(err) = set.add(&*surface, generation, RouteArtifact::for_route(route, style)) {
                warn!("Day {}: failed to draw route: {}", route.day_index + 1, err);
            }
        };

        let outcome = self.run(itinerary, &is_current, draw).await;
        if outcome.is_none() {
            let surface = surface.upgrade();
            let removed = artifacts
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear_generation(surface.as_deref(), generation);
            debug!(
                "Routing pass {} superseded, removed {} stale artifacts",
                generation, removed
            );
        }
        outcome
    }

    async fn run<C, F>(&self, itinerary: &Itinerary, is_current: C, mut on_route: F) -> Option<RoutingOutcome>
    where
        C: Fn() -> bool,
        F: FnMut(&ResolvedRoute, LineStyle),
    {
        let is_current = &is_current;
        let mut pending: FuturesUnordered<_> = itinerary
            .days
            .iter()
            .map(|day| self.resolve_day_while(day, itinerary.activity, is_current))
            .collect();

        let mut outcomes = Vec::with_capacity(itinerary.days.len());
        let mut superseded = false;
        while let Some(outcome) = pending.next().await {
            if superseded || !is_current() {
                superseded = true;
                continue;
            }
            if let DayOutcome::Resolved { route, style } = &outcome {
                on_route(route, *style);
            }
            outcomes.push(outcome);
        }
        if superseded {
            return None;
        }

        outcomes.sort_by_key(DayOutcome::day_index);
        Some(assemble(itinerary, outcomes))
    }
}

/// Fold day outcomes, already in day order, into the caller-facing result.
fn assemble(itinerary: &Itinerary, outcomes: Vec<DayOutcome>) -> RoutingOutcome {
    let mut result = RoutingOutcome::default();
    result
        .report
        .merge_issues(validate_loop_closure(itinerary).issues);

    for outcome in outcomes {
        match outcome {
            DayOutcome::Resolved { route, .. } => {
                let day = route.day_index + 1;
                result.report.merge_issues(validate_day_distance(
                    route.distance_km,
                    itinerary.activity,
                    day,
                ));
                result.summaries.push(DaySummary {
                    day,
                    distance_km: route.distance_km,
                    provider: route.source_provider.clone(),
                });
                result.routes.push(route);
            }
            DayOutcome::Unrouted { day_index } => result.unrouted_days.push(day_index),
            DayOutcome::Skipped { day_index } => result.skipped_days.push(day_index),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use trail_core::{Coordinate, Waypoint};
    use trail_routing::{ProviderError, RouteGeometry};

    struct Fixed {
        name: &'static str,
        priority: u8,
        km: Option<f64>,
    }

    #[async_trait]
    impl RoutingProvider for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        async fn resolve(
            &self,
            waypoints: &[Coordinate],
            _profile: ActivityType,
        ) -> Result<Option<RouteGeometry>, ProviderError> {
            Ok(self.km.map(|distance_km| RouteGeometry {
                geometry: waypoints.to_vec(),
                distance_km,
            }))
        }
    }

    fn day(day_index: usize, points: &[(f64, f64)]) -> DayPlan {
        DayPlan {
            day_index,
            waypoints: points
                .iter()
                .enumerate()
                .map(|(i, (lat, lng))| Waypoint {
                    name: format!("wp{i}"),
                    coordinate: Coordinate::new(*lat, *lng).unwrap(),
                })
                .collect(),
            declared_distance_km: None,
            description: None,
        }
    }

    #[test]
    fn providers_are_sorted_stably_by_priority() {
        let coordinator = RoutingCoordinator::new(vec![
            Arc::new(Fixed { name: "c", priority: 3, km: None }),
            Arc::new(Fixed { name: "a", priority: 1, km: None }),
            Arc::new(Fixed { name: "b1", priority: 2, km: None }),
            Arc::new(Fixed { name: "b2", priority: 2, km: None }),
        ]);
        assert_eq!(coordinator.provider_names(), vec!["a", "b1", "b2", "c"]);
    }

    #[tokio::test]
    async fn single_waypoint_day_is_skipped() {
        let coordinator = RoutingCoordinator::new(vec![Arc::new(Fixed {
            name: "a",
            priority: 1,
            km: Some(3.0),
        })]);
        let outcome = coordinator
            .resolve_day(&day(2, &[(33.0, 35.0)]), ActivityType::Hiking)
            .await;
        assert_eq!(outcome, DayOutcome::Skipped { day_index: 2 });
    }

    #[tokio::test]
    async fn outcome_lists_days_in_order() {
        let coordinator = RoutingCoordinator::new(vec![Arc::new(Fixed {
            name: "a",
            priority: 1,
            km: Some(20.0),
        })]);
        let itinerary = Itinerary {
            activity: ActivityType::Cycling,
            days: vec![
                day(0, &[(33.0, 35.0), (33.1, 35.1)]),
                day(1, &[(33.1, 35.1)]),
                day(2, &[(33.1, 35.1), (33.2, 35.2)]),
            ],
            all_spots: Vec::new(),
            name: None,
            country: None,
        };

        let outcome = coordinator.resolve_itinerary(&itinerary).await;
        let days: Vec<_> = outcome.routes.iter().map(|r| r.day_index).collect();
        assert_eq!(days, vec![0, 2]);
        assert_eq!(outcome.skipped_days, vec![1]);
        assert!(outcome.unrouted_days.is_empty());
        assert_eq!(outcome.summaries[1].day, 3);
        assert!((outcome.total_distance_km() - 40.0).abs() < 1e-9);
        assert!(outcome.report.is_empty());
    }
}
