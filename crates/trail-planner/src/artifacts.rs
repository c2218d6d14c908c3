//! Bookkeeping for polylines drawn on the surface.

use tracing::{debug, warn};
use trail_core::ResolvedRoute;
use trail_routing::{LineStyle, SurfaceError};

use crate::surface::{ArtifactId, DisplaySurface, RouteArtifact};

/// Colors cycled by day index.
pub const DAY_COLORS: [&str; 5] = ["#2563eb", "#ff4433", "#4bff33", "#ffff33", "#ee33ff"];

pub fn day_color(day_index: usize) -> &'static str {
    DAY_COLORS[day_index % DAY_COLORS.len()]
}

impl RouteArtifact {
    pub fn for_route(route: &ResolvedRoute, style: LineStyle) -> Self {
        Self {
            day_index: route.day_index,
            geometry: route.geometry.clone(),
            color: day_color(route.day_index),
            style,
            provider: route.source_provider.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tracked {
    id: ArtifactId,
    generation: u64,
    day_index: usize,
}

/// Every artifact the planner currently owns on its surface.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    entries: Vec<Tracked>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn days(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.day_index).collect()
    }

    /// Draw `artifact` and remember it under `generation`.
    pub fn add<S: DisplaySurface + ?Sized>(
        &mut self,
        surface: &S,
        generation: u64,
        artifact: RouteArtifact,
    ) -> Result<ArtifactId, SurfaceError> {
        let day_index = artifact.day_index;
        let id = surface.add_artifact(artifact)?;
        self.entries.push(Tracked {
            id,
            generation,
            day_index,
        });
        Ok(id)
    }

    /// Remove everything. Safe to call repeatedly and with no surface left;
    /// removal failures are logged and the entry is forgotten anyway.
    pub fn clear<S: DisplaySurface + ?Sized>(&mut self, surface: Option<&S>) -> usize {
        let entries = std::mem::take(&mut self.entries);
        Self::remove_all(surface, entries)
    }

    /// Remove only what one routing pass drew.
    pub fn clear_generation<S: DisplaySurface + ?Sized>(
        &mut self,
        surface: Option<&S>,
        generation: u64,
    ) -> usize {
        let (stale, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.generation == generation);
        self.entries = kept;
        Self::remove_all(surface, stale)
    }

    fn remove_all<S: DisplaySurface + ?Sized>(surface: Option<&S>, entries: Vec<Tracked>) -> usize {
        let count = entries.len();
        let Some(surface) = surface else {
            if count > 0 {
                debug!("Artifacts: surface gone, forgetting {} artifacts", count);
            }
            return count;
        };
        for entry in entries {
            if let Err(err) = surface.remove_artifact(entry.id) {
                warn!(
                    "Artifacts: failed to remove route for day {}: {}",
                    entry.day_index + 1,
                    err
                );
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use trail_core::Coordinate;

    fn route(day_index: usize) -> ResolvedRoute {
        ResolvedRoute {
            day_index,
            geometry: vec![
                Coordinate::new(33.0, 35.0).unwrap(),
                Coordinate::new(33.02, 35.01).unwrap(),
            ],
            distance_km: 2.4,
            source_provider: "BRouter".to_string(),
        }
    }

    #[test]
    fn palette_wraps_by_day_index() {
        assert_eq!(day_color(0), "#2563eb");
        assert_eq!(day_color(4), "#ee33ff");
        assert_eq!(day_color(5), day_color(0));
        assert_eq!(day_color(7), "#4bff33");
    }

    #[test]
    fn artifact_carries_route_identity() {
        let artifact = RouteArtifact::for_route(&route(1), LineStyle::dashed(6, 0.9, "8, 4"));
        assert_eq!(artifact.color, "#ff4433");
        assert_eq!(artifact.provider, "BRouter");
        assert_eq!(artifact.style.dash_array, Some("8, 4"));
    }

    #[test]
    fn clear_is_idempotent() {
        let surface = HeadlessSurface::new();
        let mut set = ArtifactSet::new();
        for day in 0..3 {
            set.add(&surface, 1, RouteArtifact::for_route(&route(day), LineStyle::solid(5, 0.8)))
                .unwrap();
        }
        assert_eq!(surface.artifact_count(), 3);

        assert_eq!(set.clear(Some(&surface)), 3);
        assert_eq!(surface.artifact_count(), 0);
        assert_eq!(set.clear(Some(&surface)), 0);
        assert_eq!(surface.artifact_count(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn clear_survives_externally_removed_artifacts() {
        let surface = HeadlessSurface::new();
        let mut set = ArtifactSet::new();
        let id = set
            .add(&surface, 1, RouteArtifact::for_route(&route(0), LineStyle::solid(5, 0.8)))
            .unwrap();
        surface.remove_artifact(id).unwrap();

        assert_eq!(set.clear(Some(&surface)), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn clear_generation_keeps_newer_passes() {
        let surface = HeadlessSurface::new();
        let mut set = ArtifactSet::new();
        let style = LineStyle::solid(5, 0.8);
        set.add(&surface, 1, RouteArtifact::for_route(&route(0), style)).unwrap();
        set.add(&surface, 2, RouteArtifact::for_route(&route(1), style)).unwrap();

        assert_eq!(set.clear_generation(Some(&surface), 1), 1);
        assert_eq!(set.days(), vec![1]);
        assert_eq!(surface.artifacts()[0].day_index, 1);
    }

    #[test]
    fn clear_without_surface_forgets_entries() {
        let surface = HeadlessSurface::new();
        let mut set = ArtifactSet::new();
        set.add(&surface, 1, RouteArtifact::for_route(&route(0), LineStyle::solid(5, 0.8)))
            .unwrap();
        assert_eq!(set.clear::<HeadlessSurface>(None), 1);
        assert!(set.is_empty());
    }
}
