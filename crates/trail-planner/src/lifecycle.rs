//! Keeps the map's route artifacts in step with the itinerary being shown.
//!
//! Every call to [`MapRouteLifecycleController::show_itinerary`] starts a new
//! generation. A pass only touches the surface while its generation is still
//! the newest one, so a fast sequence of itinerary changes never leaves stale
//! polylines behind and never renders an older itinerary over a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};
use trail_core::{Coordinate, Itinerary};

use crate::artifacts::ArtifactSet;
use crate::config::{ConfigError, PlannerConfig};
use crate::coordinator::{RoutingCoordinator, RoutingOutcome};
use crate::surface::{DisplaySurface, BOUNDS_PADDING_PX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Clearing,
    WaitingForSurface,
    Routing,
}

pub struct MapRouteLifecycleController<S: DisplaySurface + ?Sized> {
    surface: Weak<S>,
    coordinator: RoutingCoordinator,
    artifacts: Mutex<ArtifactSet>,
    generation: AtomicU64,
    superseded: Notify,
    state: watch::Sender<LifecycleState>,
    settle_delay: Duration,
}

impl<S: DisplaySurface + ?Sized + 'static> MapRouteLifecycleController<S> {
    /// Controller with the provider chain described by `config`.
    pub fn from_config(surface: &Arc<S>, config: &PlannerConfig) -> Result<Self, ConfigError> {
        let providers = config.build_providers(surface)?;
        Ok(Self::new(
            surface,
            RoutingCoordinator::new(providers),
            config.settle_delay,
        ))
    }
}

impl<S: DisplaySurface + ?Sized> MapRouteLifecycleController<S> {
    pub fn new(surface: &Arc<S>, coordinator: RoutingCoordinator, settle_delay: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self {
            surface: Arc::downgrade(surface),
            coordinator,
            artifacts: Mutex::new(ArtifactSet::new()),
            generation: AtomicU64::new(0),
            superseded: Notify::new(),
            state,
            settle_delay,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn coordinator(&self) -> &RoutingCoordinator {
        &self.coordinator
    }

    /// Number of route artifacts currently drawn by this controller.
    pub fn artifact_count(&self) -> usize {
        self.lock_artifacts().len()
    }

    /// Replace whatever is on the map with `itinerary`'s routes.
    ///
    /// Returns `None` when a newer call or [`teardown`](Self::teardown)
    /// superseded this one, or when the surface went away before routing.
    pub async fn show_itinerary(&self, itinerary: &Itinerary) -> Option<RoutingOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.superseded.notify_waiters();

        self.set_state(generation, LifecycleState::Clearing);
        let removed = self.clear_artifacts();
        debug!(
            "Pass {}: cleared {} artifacts from previous itinerary",
            generation, removed
        );

        if itinerary.days.is_empty() {
            debug!("Pass {}: itinerary has no days, nothing to route", generation);
            self.set_state(generation, LifecycleState::Idle);
            return Some(RoutingOutcome::default());
        }

        self.set_state(generation, LifecycleState::WaitingForSurface);
        if !self.wait_until_settled(generation).await {
            if self.is_current(generation) {
                warn!("Pass {}: display surface went away before routing", generation);
                self.set_state(generation, LifecycleState::Idle);
            }
            return None;
        }

        self.frame(itinerary);
        self.set_state(generation, LifecycleState::Routing);
        let outcome = self
            .coordinator
            .route_itinerary(
                itinerary,
                &self.surface,
                &self.artifacts,
                generation,
                || self.is_current(generation),
            )
            .await;
        self.set_state(generation, LifecycleState::Idle);

        match &outcome {
            Some(outcome) => info!(
                "Pass {}: routed {} days ({} unrouted), {} warnings, {} errors",
                generation,
                outcome.routes.len(),
                outcome.unrouted_days.len(),
                outcome.report.warnings.len(),
                outcome.report.errors.len()
            ),
            None => debug!("Pass {}: superseded while routing", generation),
        }
        outcome
    }

    /// Remove every artifact and invalidate any pass still in flight.
    /// Calling it more than once is harmless.
    pub fn teardown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.superseded.notify_waiters();
        let removed = self.clear_artifacts();
        self.state.send_replace(LifecycleState::Idle);
        if removed > 0 {
            info!("Teardown: removed {} route artifacts", removed);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn set_state(&self, generation: u64, state: LifecycleState) {
        if self.is_current(generation) {
            self.state.send_replace(state);
        }
    }

    fn lock_artifacts(&self) -> MutexGuard<'_, ArtifactSet> {
        self.artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_artifacts(&self) -> usize {
        let surface = self.surface.upgrade();
        self.lock_artifacts().clear(surface.as_deref())
    }

    /// Wait for the surface to report ready, then for the settle delay.
    /// Gives up early when superseded or when the surface is dropped.
    async fn wait_until_settled(&self, generation: u64) -> bool {
        let superseded = self.superseded.notified();
        tokio::pin!(superseded);
        superseded.as_mut().enable();
        if !self.is_current(generation) {
            return false;
        }

        let Some(mut ready) = self.surface.upgrade().map(|surface| surface.readiness()) else {
            return false;
        };
        let settle = async {
            let closed = ready.wait_for(|ready| *ready).await.is_err();
            if closed {
                return false;
            }
            tokio::time::sleep(self.settle_delay).await;
            true
        };

        tokio::select! {
            _ = &mut superseded => {
                debug!("Pass {}: superseded while waiting for the surface", generation);
                false
            }
            settled = settle => settled && self.is_current(generation),
        }
    }

    fn frame(&self, itinerary: &Itinerary) {
        let mut points = itinerary.spot_coordinates();
        if points.is_empty() {
            points = itinerary
                .days
                .iter()
                .flat_map(|day| day.coordinates())
                .collect::<Vec<Coordinate>>();
        }
        if points.is_empty() {
            return;
        }
        let Some(surface) = self.surface.upgrade() else {
            return;
        };
        if let Err(err) = surface.fit_bounds(&points, BOUNDS_PADDING_PX) {
            warn!("Could not frame itinerary: {}", err);
        }
    }
}

impl<S: DisplaySurface + ?Sized> Drop for MapRouteLifecycleController<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
