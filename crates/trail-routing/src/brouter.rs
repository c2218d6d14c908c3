//! Trail-aware router client (BRouter GeoJSON endpoint).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use trail_core::{path_distance_km, ActivityType, Coordinate};

use crate::geojson::FeatureCollection;
use crate::provider::{meters_to_km, LineStyle, ProviderError, RouteGeometry, RoutingProvider};

pub const BROUTER_DEFAULT_URL: &str = "https://brouter.de";
pub const BROUTER_API_PATH: &str = "/brouter";

pub fn brouter_profile(profile: ActivityType) -> &'static str {
    match profile {
        ActivityType::Hiking => "hiking",
        ActivityType::Cycling => "fastbike",
    }
}

/// Pipe-delimited `lng,lat` list expected by the `lonlats` parameter.
pub fn build_lonlats(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|wp| format!("{},{}", wp.lng, wp.lat))
        .collect::<Vec<String>>()
        .join("|")
}

/// BRouter reports lengths as strings, some forks as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Meters {
    Number(f64),
    Text(String),
}

impl Meters {
    fn value(&self) -> Option<f64> {
        match self {
            Meters::Number(value) => Some(*value),
            Meters::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BRouterProperties {
    #[serde(default)]
    distance: Option<Meters>,
    #[serde(default, rename = "track-length")]
    track_length: Option<Meters>,
}

impl BRouterProperties {
    fn distance_m(&self) -> Option<f64> {
        let usable = |field: &Option<Meters>| {
            field
                .as_ref()
                .and_then(Meters::value)
                .filter(|meters| meters.is_finite() && *meters > 0.0)
        };
        usable(&self.distance).or_else(|| usable(&self.track_length))
    }
}

pub struct BRouterProvider {
    client: Client,
    base_url: String,
}

impl BRouterProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn parse_response(body: &str) -> Result<Option<RouteGeometry>, ProviderError> {
        let collection: FeatureCollection<BRouterProperties> = serde_json::from_str(body)?;
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
            .and_then(BRouterProperties::distance_m)
            .map(meters_to_km)
            .unwrap_or_else(|| path_distance_km(&geometry));

        Ok(Some(RouteGeometry {
            geometry,
            distance_km,
        }))
    }
}

#[async_trait]
impl RoutingProvider for BRouterProvider {
    fn name(&self) -> &str {
        "BRouter"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn line_style(&self, profile: ActivityType) -> LineStyle {
        match profile {
            ActivityType::Hiking => LineStyle::dashed(6, 0.9, "8, 4"),
            ActivityType::Cycling => LineStyle::dashed(6, 0.9, "12, 8"),
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

        let url = format!("{}{}", self.base_url, BROUTER_API_PATH);
        let lonlats = build_lonlats(waypoints);
        debug!(
            "BRouter: requesting {} waypoints with profile {}",
            waypoints.len(),
            brouter_profile(profile)
        );

        let response = self
            .client
            .get(url)
            .query(&[
                ("lonlats", lonlats.as_str()),
                ("profile", brouter_profile(profile)),
                ("alternativeidx", "0"),
                ("format", "geojson"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message });
        }

        let body = response.text().await?;
        Self::parse_response(&body)
    }
}
