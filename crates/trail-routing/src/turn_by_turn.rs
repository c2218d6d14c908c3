//! Last-resort router that runs through a routing control on the live map.
//!
//! The control reports back through events rather than a response body, so
//! the outcome is awaited on a channel with a hard timeout. A control that
//! never answers resolves to "no route" instead of hanging the day.

use async_trait::async_trait;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use trail_core::{path_distance_km, ActivityType, Coordinate};

use crate::provider::{meters_to_km, LineStyle, ProviderError, RouteGeometry, RoutingProvider};
use crate::surface::{ControlId, RoutingControl, RoutingEvent, RoutingSurface};

pub const OSRM_DEFAULT_URL: &str = "https://router.project-osrm.org/route/v1";
pub const CONTROL_TIMEOUT: Duration = Duration::from_secs(10);

pub fn osrm_profile(profile: ActivityType) -> &'static str {
    match profile {
        ActivityType::Hiking => "foot",
        ActivityType::Cycling => "driving",
    }
}

/// Surface-bound router. Holds the surface weakly so a torn-down map is
/// detected instead of kept alive.
pub struct TurnByTurnProvider<S: ?Sized> {
    surface: Weak<S>,
    service_url: String,
    timeout: Duration,
}

impl<S: RoutingSurface + ?Sized> TurnByTurnProvider<S> {
    pub fn new(surface: Weak<S>, service_url: impl Into<String>) -> Self {
        Self {
            surface,
            service_url: service_url.into(),
            timeout: CONTROL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

}

/// Detaches its control when dropped, including when the caller abandons
/// the `resolve` future mid-await.
struct AttachedControl<'a, S: RoutingSurface + ?Sized> {
    surface: &'a Weak<S>,
    id: ControlId,
}

impl<S: RoutingSurface + ?Sized> Drop for AttachedControl<'_, S> {
    fn drop(&mut self) {
        let Some(surface) = self.surface.upgrade() else {
            return;
        };
        if let Err(err) = surface.detach_routing_control(self.id) {
            debug!("TurnByTurn: detaching control {:?} failed: {}", self.id, err);
        }
    }
}

fn to_route(geometry: Vec<Coordinate>, total_distance_m: Option<f64>) -> Option<RouteGeometry> {
    if geometry.len() < 2 {
        return None;
    }
    let distance_km = total_distance_m
        .filter(|meters| meters.is_finite() && *meters > 0.0)
        .map(meters_to_km)
        .unwrap_or_else(|| path_distance_km(&geometry));
    Some(RouteGeometry {
        geometry,
        distance_km,
    })
}

#[async_trait]
impl<S: RoutingSurface + ?Sized> RoutingProvider for TurnByTurnProvider<S> {
    fn name(&self) -> &str {
        "OSRM"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn line_style(&self, _profile: ActivityType) -> LineStyle {
        LineStyle::solid(5, 0.8)
    }

    async fn resolve(
        &self,
        waypoints: &[Coordinate],
        profile: ActivityType,
    ) -> Result<Option<RouteGeometry>, ProviderError> {
        if waypoints.len() < 2 {
            return Ok(None);
        }

        let (events, mut outcome) = mpsc::unbounded_channel();
        let control = RoutingControl {
            waypoints: waypoints.to_vec(),
            service_url: self.service_url.clone(),
            profile: osrm_profile(profile),
            events,
        };

        // Strong handle only for the attach call, never across the await.
        let attached = {
            let surface = self.surface.upgrade().ok_or(ProviderError::SurfaceUnavailable)?;
            surface.attach_routing_control(control)
        };
        let _control = match attached {
            Ok(id) => AttachedControl {
                surface: &self.surface,
                id,
            },
            Err(err) => {
                warn!("TurnByTurn: error adding routing control to surface: {}", err);
                return Ok(None);
            }
        };

        let event = tokio::time::timeout(self.timeout, outcome.recv()).await;

        match event {
            Ok(Some(RoutingEvent::RoutesFound {
                geometry,
                total_distance_m,
            })) => Ok(to_route(geometry, total_distance_m)),
            Ok(Some(RoutingEvent::RoutingError(message))) => {
                debug!("TurnByTurn: routing error: {}", message);
                Ok(None)
            }
            Ok(None) => {
                debug!("TurnByTurn: control dropped without reporting");
                Ok(None)
            }
            Err(_) => {
                warn!(
                    "TurnByTurn: no answer within {}s, giving up",
                    self.timeout.as_secs_f64()
                );
                Ok(None)
            }
        }
    }
}
