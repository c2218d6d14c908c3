//! Minimal GeoJSON response model shared by the HTTP routers.

use serde::Deserialize;
use trail_core::Coordinate;

use crate::provider::ProviderError;

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection<P> {
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature<P> {
    pub properties: Option<P>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum Geometry {
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Flatten to `Coordinate`s. Positions are `[lng, lat]` with an optional elevation.
    pub fn to_coordinates(&self) -> Result<Vec<Coordinate>, ProviderError> {
        match self {
            Geometry::LineString { coordinates } => positions_to_coordinates(coordinates),
            Geometry::MultiLineString { coordinates } => {
                let mut points = Vec::new();
                for line in coordinates {
                    points.extend(positions_to_coordinates(line)?);
                }
                Ok(points)
            }
            Geometry::Unsupported => Ok(Vec::new()),
        }
    }
}

fn positions_to_coordinates(positions: &[Vec<f64>]) -> Result<Vec<Coordinate>, ProviderError> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [lng, lat, ..] => Coordinate::new(*lat, *lng)
                .map_err(|err| ProviderError::InvalidGeometry(err.to_string())),
            _ => Err(ProviderError::InvalidGeometry(format!(
                "position with {} components",
                position.len()
            ))),
        })
        .collect()
}
