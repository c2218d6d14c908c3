//! trailmap routing providers.
//!
//! Every backend is normalized to [`RouteGeometry`] behind the
//! [`RoutingProvider`] trait, so the fallback loop never branches on which
//! backend answered.

mod geojson;

pub mod brouter;
pub mod openroute;
pub mod provider;
pub mod surface;
pub mod turn_by_turn;

pub use brouter::{BRouterProvider, BROUTER_DEFAULT_URL};
pub use openroute::{OpenRouteProvider, OPENROUTE_DEFAULT_URL};
pub use provider::{LineStyle, ProviderError, RouteGeometry, RoutingProvider};
pub use surface::{ControlId, RoutingControl, RoutingEvent, RoutingSurface, SurfaceError};
pub use turn_by_turn::{TurnByTurnProvider, CONTROL_TIMEOUT, OSRM_DEFAULT_URL};
