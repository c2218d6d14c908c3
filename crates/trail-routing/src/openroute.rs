//! General-purpose directions API client (OpenRouteService GeoJSON endpoint).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trail_core::{path_distance_km, ActivityType, Coordinate};

use crate::geojson::FeatureCollection;
use crate::provider::{meters_to_km, LineStyle, ProviderError, RouteGeometry, RoutingProvider};

pub const OPENROUTE_DEFAULT_URL: &str = "https://api.openrouteservice.org";
pub const OPENROUTE_DIRECTIONS_PATH: &str = "/v2/directions";

pub fn openroute_profile(profile: ActivityType) -> &'static str {
    match profile {
        ActivityType::Hiking => "foot-hiking",
        ActivityType::Cycling => "cycling-regular",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionsRequestBody {
    /// `[lng, lat]` pairs in travel order
    pub coordinates: Vec<[f64; 2]>,
    pub instructions: bool,
    pub preference: String,
}

impl DirectionsRequestBody {
    pub fn new(waypoints: &[Coordinate]) -> Self {
        Self {
            coordinates: waypoints.iter().map(|wp| wp.to_lng_lat()).collect(),
            instructions: false,
            preference: "recommended".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DirectionsProperties {
    #[serde(default)]
    segments: Option<Vec<Segment>>,
    #[serde(default)]
    summary: Option<Summary>,
}

impl DirectionsProperties {
    /// Segment breakdown wins over the summary; `None` means neither was sent.
    fn distance_m(&self) -> Option<f64> {
        if let Some(segments) = self.segments.as_ref().filter(|s| !s.is_empty()) {
            return Some(segments.iter().filter_map(|s| s.distance).sum());
        }
        self.summary
            .as_ref()
            .map(|summary| summary.distance.unwrap_or(0.0))
    }
}

pub struct OpenRouteProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouteProvider {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn parse_response(body: &str) -> Result<Option<RouteGeometry>, ProviderError> {
        let collection: FeatureCollection<DirectionsProperties> = serde_json::from_str(body)?;
        let Some(feature) = collection.features.into_iter().next() else {
            return Ok(None);
        };

        let geometry = match &feature.geometry {
            Some(geometry) => geometry.to_coordinates()?,
            None => Vec::new(),
        };
        if geometry.len() < 2 {
            return Ok(None);
        }

        let distance_km = feature
            .properties
            .as_ref()
            .and_then(DirectionsProperties::distance_m)
            .map(meters_to_km)
            .unwrap_or_else(|| path_distance_km(&geometry));

        Ok(Some(RouteGeometry {
            geometry,
            distance_km,
        }))
    }
}

#[async_trait]
impl RoutingProvider for OpenRouteProvider {
    fn name(&self) -> &str {
        "OpenRouteService"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn line_style(&self, profile: ActivityType) -> LineStyle {
        match profile {
            ActivityType::Hiking => LineStyle::dashed(6, 0.9, "12, 6"),
            ActivityType::Cycling => LineStyle::dashed(6, 0.9, "16, 6"),
        }
    }

    async fn resolve(
        &self,
        waypoints: &[Coordinate],
        profile: ActivityType,
    ) -> Result<Option<RouteGeometry>, ProviderError> {
        if waypoints.len() < 2 {
            return Ok(None);
        }

        let url = format!(
            "{}{}/{}/geojson",
            self.base_url,
            OPENROUTE_DIRECTIONS_PATH,
            openroute_profile(profile)
        );
        debug!(
            "OpenRouteService: requesting {} waypoints with profile {}",
            waypoints.len(),
            openroute_profile(profile)
        );

        let mut request = self
            .client
            .post(url)
            .json(&DirectionsRequestBody::new(waypoints));
        if let Some(key) = self.api_key.as_deref() {
            request = request.header("Authorization", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message });
        }

        let body = response.text().await?;
        Self::parse_response(&body)
    }
}
