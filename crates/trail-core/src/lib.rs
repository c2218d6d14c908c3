//! trailmap core: itinerary model, geodesy and route validation.
//!
//! Everything here is synchronous and free of I/O; the routing crates build on it.

pub mod models;
pub mod rules;
pub mod spatial;
pub mod validation;

pub use models::{
    ActivityType, Coordinate, DailyInfo, DayPlan, Itinerary, ItineraryDocument, ItineraryError,
    LocationRecord, ResolvedRoute, Waypoint,
};
pub use rules::ActivityRules;
pub use spatial::{
    bounds, checked_distance_km, haversine_km, path_distance_km, validate_coordinate, Bounds,
    GeoError, EARTH_RADIUS_KM,
};
pub use validation::{
    validate_day_distance, validate_itinerary, validate_loop_closure, DayDistance, IssueCategory,
    LoopCheck, Severity, ValidationIssue, ValidationReport,
};
