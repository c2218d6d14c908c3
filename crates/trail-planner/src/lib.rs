//! trailmap planner: turns an itinerary into routed, validated map layers.
//!
//! - [`RoutingCoordinator`] walks the provider chain for each day
//! - [`MapRouteLifecycleController`] owns the artifacts on a [`DisplaySurface`]
//!   and discards work for itineraries that are no longer shown

pub mod artifacts;
pub mod config;
pub mod coordinator;
pub mod lifecycle;
pub mod surface;

pub use artifacts::{day_color, ArtifactSet, DAY_COLORS};
pub use config::{ConfigError, PlannerConfig, ProviderKind};
pub use coordinator::{DayOutcome, DaySummary, RoutingCoordinator, RoutingOutcome};
pub use lifecycle::{LifecycleState, MapRouteLifecycleController};
pub use surface::{
    ArtifactId, DisplaySurface, FramedBounds, HeadlessSurface, RouteArtifact, BOUNDS_PADDING_PX,
};
