//! Scripted providers and itinerary builders shared by the planner tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trail_core::{ActivityType, Coordinate, DayPlan, Itinerary, Waypoint};
use trail_routing::{ProviderError, RouteGeometry, RoutingProvider};

pub type Reply = dyn Fn(&[Coordinate]) -> Result<Option<RouteGeometry>, ProviderError> + Send + Sync;

/// Calls made to scripted providers: (provider name, latitude of first waypoint).
pub type CallLog = Arc<Mutex<Vec<(String, f64)>>>;

pub struct Scripted {
    pub name: &'static str,
    pub priority: u8,
    pub delay: Duration,
    pub log: CallLog,
    pub reply: Box<Reply>,
}

impl Scripted {
    pub fn new(
        name: &'static str,
        priority: u8,
        log: &CallLog,
        reply: impl Fn(&[Coordinate]) -> Result<Option<RouteGeometry>, ProviderError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<dyn RoutingProvider> {
        Arc::new(Self {
            name,
            priority,
            delay: Duration::ZERO,
            log: log.clone(),
            reply: Box::new(reply),
        })
    }

    pub fn slow(
        name: &'static str,
        priority: u8,
        delay: Duration,
        log: &CallLog,
        km: f64,
    ) -> Arc<dyn RoutingProvider> {
        Arc::new(Self {
            name,
            priority,
            delay,
            log: log.clone(),
            reply: Box::new(move |waypoints| Ok(Some(route(waypoints, km)))),
        })
    }
}

#[async_trait]
impl RoutingProvider for Scripted {
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
        self.log
            .lock()
            .unwrap()
            .push((self.name.to_string(), waypoints[0].lat));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.reply)(waypoints)
    }
}

pub fn route(waypoints: &[Coordinate], km: f64) -> RouteGeometry {
    RouteGeometry {
        geometry: waypoints.to_vec(),
        distance_km: km,
    }
}

pub fn server_error() -> ProviderError {
    ProviderError::Api {
        status: 500,
        message: "internal error".to_string(),
    }
}

pub fn waypoint(lat: f64, lng: f64) -> Waypoint {
    Waypoint {
        name: format!("{lat:.3},{lng:.3}"),
        coordinate: Coordinate::new(lat, lng).unwrap(),
    }
}

/// Day `day_index` starts at latitude `33.0 + day_index` so providers can tell
/// days apart by their first waypoint.
pub fn day(day_index: usize) -> DayPlan {
    day_at(day_index, first_lat(day_index))
}

pub fn day_at(day_index: usize, lat: f64) -> DayPlan {
    DayPlan {
        day_index,
        waypoints: vec![
            waypoint(lat, 35.0),
            waypoint(lat + 0.02, 35.01),
            waypoint(lat + 0.0001, 35.0001),
        ],
        declared_distance_km: None,
        description: None,
    }
}

pub fn itinerary(activity: ActivityType, days: usize) -> Itinerary {
    itinerary_at(activity, days, first_lat(0))
}

/// Like [`itinerary`] with day `i` starting at `base_lat + i`.
pub fn itinerary_at(activity: ActivityType, days: usize, base_lat: f64) -> Itinerary {
    let days: Vec<_> = (0..days)
        .map(|i| day_at(i, base_lat + i as f64))
        .collect();
    let all_spots = days
        .iter()
        .flat_map(|day| day.waypoints.clone())
        .collect();
    Itinerary {
        activity,
        days,
        all_spots,
        name: Some("Test trip".to_string()),
        country: None,
    }
}

/// One-day hike that starts and ends at the same trailhead.
pub fn hiking_loop() -> Itinerary {
    let trailhead = waypoint(32.7, 35.3);
    let day = DayPlan {
        day_index: 0,
        waypoints: vec![
            trailhead.clone(),
            waypoint(32.715, 35.32),
            waypoint(32.71, 35.29),
            trailhead.clone(),
        ],
        declared_distance_km: Some(7.0),
        description: None,
    };
    Itinerary {
        activity: ActivityType::Hiking,
        all_spots: day.waypoints.clone(),
        days: vec![day],
        name: Some("Loop".to_string()),
        country: Some("Israel".to_string()),
    }
}

pub fn first_lat(day_index: usize) -> f64 {
    33.0 + day_index as f64
}
