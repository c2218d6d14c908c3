//! The slice of the display surface a surface-bound router needs.

use thiserror::Error;
use tokio::sync::mpsc;
use trail_core::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("display surface has been torn down")]
    Gone,

    #[error("unknown surface handle {0}")]
    UnknownHandle(u64),

    #[error("{0}")]
    Rejected(String),
}

/// Handle for a routing control attached to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub u64);

/// Events a routing control reports back once its request settles.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingEvent {
    RoutesFound {
        geometry: Vec<Coordinate>,
        /// Route summary distance in meters, when the control reports one
        total_distance_m: Option<f64>,
    },
    RoutingError(String),
}

/// Request handed to the surface when a control is attached.
///
/// The surface issues the routing request bound to its own map state and
/// reports the outcome on `events`.
#[derive(Debug, Clone)]
pub struct RoutingControl {
    pub waypoints: Vec<Coordinate>,
    pub service_url: String,
    pub profile: &'static str,
    pub events: mpsc::UnboundedSender<RoutingEvent>,
}

/// A live map surface able to host routing controls.
pub trait RoutingSurface: Send + Sync {
    fn attach_routing_control(&self, control: RoutingControl) -> Result<ControlId, SurfaceError>;

    fn detach_routing_control(&self, id: ControlId) -> Result<(), SurfaceError>;
}
