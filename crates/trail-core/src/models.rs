//! Core data models for itineraries and resolved routes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::spatial::{validate_coordinate, GeoError};

/// A validated WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Wire shape of a coordinate before range checks.
#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GeoError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Build a coordinate, rejecting NaN and out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        validate_coordinate(lat, lng)?;
        Ok(Self { lat, lng })
    }

    /// `[lng, lat]` pair as used by GeoJSON and most routing APIs.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// A named stop produced by the itinerary source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    /// Round-trip day hikes
    #[default]
    Hiking,
    /// City-to-city rides
    Cycling,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Hiking => "hiking",
            ActivityType::Cycling => "cycling",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Zero-based position in the itinerary
    pub day_index: usize,
    pub waypoints: Vec<Waypoint>,
    /// Distance claimed by the itinerary author, kept next to the computed one
    pub declared_distance_km: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl DayPlan {
    /// One-based day number used in user-facing messages.
    pub fn day_number(&self) -> usize {
        self.day_index + 1
    }

    /// A day needs at least two waypoints before there is a path to resolve.
    pub fn is_routable(&self) -> bool {
        self.waypoints.len() >= 2
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.waypoints.iter().map(|wp| wp.coordinate).collect()
    }
}

/// A full trip as consumed by the routing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub activity: ActivityType,
    pub days: Vec<DayPlan>,
    /// Full-trip overview, used for the initial bounds fit and the loop check
    pub all_spots: Vec<Waypoint>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Itinerary {
    /// Parse an itinerary-source JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ItineraryError> {
        let document: ItineraryDocument = serde_json::from_str(raw)?;
        Self::try_from(document)
    }

    pub fn spot_coordinates(&self) -> Vec<Coordinate> {
        self.all_spots.iter().map(|wp| wp.coordinate).collect()
    }

    pub fn routable_days(&self) -> impl Iterator<Item = &DayPlan> {
        self.days.iter().filter(|day| day.is_routable())
    }
}

/// Path produced by a routing provider for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRoute {
    pub day_index: usize,
    pub geometry: Vec<Coordinate>,
    /// Computed from the provider response, authoritative over the declared distance
    pub distance_km: f64,
    pub source_provider: String,
}

#[derive(Debug, Error)]
pub enum ItineraryError {
    #[error("invalid itinerary JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid coordinate for {context}: {source}")]
    Coordinate {
        context: String,
        #[source]
        source: GeoError,
    },
}

// ==== Itinerary source document ====
// Shape of the JSON returned by the generator and the saved-route store.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItineraryDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logistics: Option<String>,
    #[serde(default)]
    pub spots_names: Vec<String>,
    #[serde(default)]
    pub spots: Vec<LocationRecord>,
    #[serde(default)]
    pub daily_info: Vec<DailyInfo>,
    #[serde(default)]
    pub total_distance_km: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, rename = "type")]
    pub activity: Option<ActivityType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyInfo {
    /// Free-form day label, generators emit both numbers and strings here
    #[serde(default)]
    pub day: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub day_locations: Option<Vec<LocationRecord>>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

fn to_waypoint(record: &LocationRecord, context: impl FnOnce() -> String) -> Result<Waypoint, ItineraryError> {
    let coordinate = Coordinate::new(record.lat, record.lng).map_err(|source| {
        ItineraryError::Coordinate {
            context: context(),
            source,
        }
    })?;
    Ok(Waypoint {
        name: record.name.clone(),
        coordinate,
    })
}

impl TryFrom<ItineraryDocument> for Itinerary {
    type Error = ItineraryError;

    fn try_from(document: ItineraryDocument) -> Result<Self, Self::Error> {
        let all_spots = document
            .spots
            .iter()
            .enumerate()
            .map(|(i, spot)| to_waypoint(spot, || format!("spot {} ({})", i, spot.name)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut days = Vec::with_capacity(document.daily_info.len());
        for (day_index, info) in document.daily_info.iter().enumerate() {
            let waypoints = info
                .day_locations
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|loc| {
                    to_waypoint(loc, || format!("day {} location {}", day_index + 1, loc.name))
                })
                .collect::<Result<Vec<_>, _>>()?;

            days.push(DayPlan {
                day_index,
                waypoints,
                declared_distance_km: info.distance_km,
                description: info.description.clone(),
            });
        }

        Ok(Itinerary {
            activity: document.activity.unwrap_or_default(),
            days,
            all_spots,
            name: document.name,
            country: document.country,
        })
    }
}
