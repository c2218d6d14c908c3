//! Display surface contract and an in-memory implementation.
//!
//! A surface draws route artifacts, frames coordinates and hosts routing
//! controls for the turn-by-turn router. [`HeadlessSurface`] keeps all of that
//! in memory and, when given an HTTP client, answers routing controls by
//! querying the OSRM route service itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use trail_core::Coordinate;
use trail_routing::{ControlId, LineStyle, RoutingControl, RoutingEvent, RoutingSurface, SurfaceError};

/// Padding, in pixels, applied when framing an itinerary.
pub const BOUNDS_PADDING_PX: u32 = 50;

/// Handle for a polyline drawn on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactId(pub u64);

/// A day's path as drawn on the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteArtifact {
    pub day_index: usize,
    pub geometry: Vec<Coordinate>,
    pub color: &'static str,
    pub style: LineStyle,
    pub provider: String,
}

/// Map surface the planner renders into.
///
/// Readiness is published on a watch channel; the channel closing means the
/// surface went away.
pub trait DisplaySurface: RoutingSurface {
    fn readiness(&self) -> watch::Receiver<bool>;

    fn fit_bounds(&self, points: &[Coordinate], padding_px: u32) -> Result<(), SurfaceError>;

    fn add_artifact(&self, artifact: RouteArtifact) -> Result<ArtifactId, SurfaceError>;

    fn remove_artifact(&self, id: ArtifactId) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FramedBounds {
    pub points: Vec<Coordinate>,
    pub padding_px: u32,
}

#[derive(Default)]
struct SurfaceState {
    artifacts: HashMap<ArtifactId, RouteArtifact>,
    controls: HashMap<ControlId, JoinHandle<()>>,
    framed: Option<FramedBounds>,
}

/// In-memory surface used by the CLI and tests.
pub struct HeadlessSurface {
    ready: watch::Sender<bool>,
    next_id: AtomicU64,
    state: Mutex<SurfaceState>,
    control_client: Option<Client>,
}

impl HeadlessSurface {
    /// A surface that is not ready yet and rejects routing controls.
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            ready,
            next_id: AtomicU64::new(1),
            state: Mutex::new(SurfaceState::default()),
            control_client: None,
        }
    }

    /// Answer routing controls by calling their OSRM service over `client`.
    pub fn with_control_client(mut self, client: Client) -> Self {
        self.control_client = Some(client);
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.send_replace(ready);
    }

    pub fn artifacts(&self) -> Vec<RouteArtifact> {
        let state = self.lock();
        let mut artifacts: Vec<_> = state
            .artifacts
            .iter()
            .map(|(id, artifact)| (*id, artifact.clone()))
            .collect();
        artifacts.sort_by_key(|(id, _)| id.0);
        artifacts.into_iter().map(|(_, artifact)| artifact).collect()
    }

    pub fn artifact_count(&self) -> usize {
        self.lock().artifacts.len()
    }

    pub fn attached_controls(&self) -> usize {
        self.lock().controls.len()
    }

    pub fn framed_bounds(&self) -> Option<FramedBounds> {
        self.lock().framed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_handle(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingSurface for HeadlessSurface {
    fn attach_routing_control(&self, control: RoutingControl) -> Result<ControlId, SurfaceError> {
        let Some(client) = self.control_client.clone() else {
            return Err(SurfaceError::Rejected(
                "headless surface has no routing backend".to_string(),
            ));
        };
        let id = ControlId(self.next_handle());
        let task = tokio::runtime::Handle::try_current()
            .map_err(|err| SurfaceError::Rejected(err.to_string()))?
            .spawn(run_control(client, control));
        self.lock().controls.insert(id, task);
        debug!("Surface: attached routing control {:?}", id);
        Ok(id)
    }

    fn detach_routing_control(&self, id: ControlId) -> Result<(), SurfaceError> {
        match self.lock().controls.remove(&id) {
            Some(task) => {
                task.abort();
                Ok(())
            }
            None => Err(SurfaceError::UnknownHandle(id.0)),
        }
    }
}

impl DisplaySurface for HeadlessSurface {
    fn readiness(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    fn fit_bounds(&self, points: &[Coordinate], padding_px: u32) -> Result<(), SurfaceError> {
        self.lock().framed = Some(FramedBounds {
            points: points.to_vec(),
            padding_px,
        });
        Ok(())
    }

    fn add_artifact(&self, artifact: RouteArtifact) -> Result<ArtifactId, SurfaceError> {
        let id = ArtifactId(self.next_handle());
        self.lock().artifacts.insert(id, artifact);
        Ok(id)
    }

    fn remove_artifact(&self, id: ArtifactId) -> Result<(), SurfaceError> {
        self.lock()
            .artifacts
            .remove(&id)
            .map(|_| ())
            .ok_or(SurfaceError::UnknownHandle(id.0))
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

fn osrm_route_url(control: &RoutingControl) -> String {
    let coords = control
        .waypoints
        .iter()
        .map(|wp| format!("{},{}", wp.lng, wp.lat))
        .collect::<Vec<_>>()
        .join(";");
    format!(
        "{}/{}/{}?overview=full&geometries=geojson",
        control.service_url.trim_end_matches('/'),
        control.profile,
        coords
    )
}

async fn query_osrm(client: &Client, control: &RoutingControl) -> Result<RoutingEvent, String> {
    let response = client
        .get(osrm_route_url(control))
        .send()
        .await
        .map_err(|err| err.to_string())?;
    let body: OsrmResponse = response.json().await.map_err(|err| err.to_string())?;
    if body.code != "Ok" {
        return Err(body.message.unwrap_or(body.code));
    }
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| "no routes in response".to_string())?;
    let geometry = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| Coordinate::new(lat, lng))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.to_string())?;
    Ok(RoutingEvent::RoutesFound {
        geometry,
        total_distance_m: Some(route.distance),
    })
}

async fn run_control(client: Client, control: RoutingControl) {
    let event = match query_osrm(&client, &control).await {
        Ok(event) => event,
        Err(message) => {
            warn!("Surface: routing control failed: {}", message);
            RoutingEvent::RoutingError(message)
        }
    };
    // The router may already have given up and dropped its receiver.
    let _ = control.events.send(event);
}
