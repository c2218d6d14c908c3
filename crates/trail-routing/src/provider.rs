//! Shared contract for routing backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trail_core::{ActivityType, Coordinate};

use crate::surface::SurfaceError;

/// Path returned by a provider, normalized to one shape for every backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub geometry: Vec<Coordinate>,
    pub distance_km: f64,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("invalid geometry in response: {0}")]
    InvalidGeometry(String),

    #[error("display surface is no longer available")]
    SurfaceUnavailable,

    #[error("display surface rejected routing control: {0}")]
    Surface(#[from] SurfaceError),
}

/// Line style a provider's routes are drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    pub weight: u8,
    pub opacity: f32,
    /// `None` draws a solid line
    pub dash_array: Option<&'static str>,
}

impl LineStyle {
    pub const fn solid(weight: u8, opacity: f32) -> Self {
        Self {
            weight,
            opacity,
            dash_array: None,
        }
    }

    pub const fn dashed(weight: u8, opacity: f32, dash_array: &'static str) -> Self {
        Self {
            weight,
            opacity,
            dash_array: Some(dash_array),
        }
    }
}

/// A backend that can turn ordered waypoints into a followable path.
///
/// One call is one attempt. Retrying and falling back to another backend is
/// the coordinator's job. `Ok(None)` means the backend answered but had no
/// usable route.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Identifier reported as the route's source.
    fn name(&self) -> &str;

    /// Lower values are tried first.
    fn priority(&self) -> u8;

    fn line_style(&self, _profile: ActivityType) -> LineStyle {
        LineStyle::solid(5, 0.8)
    }

    async fn resolve(
        &self,
        waypoints: &[Coordinate],
        profile: ActivityType,
    ) -> Result<Option<RouteGeometry>, ProviderError>;
}

pub(crate) fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}
