//! GeoJSON subset returned by the inference backend.
//!
//! Geometries keep their raw `type` tag and raw `coordinates` so that feeds
//! containing kinds or shapes we do not render still decode; interpretation
//! happens at projection time.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

/// Risk assumed for features that carry no usable `risk` property.
pub const DEFAULT_RISK: f64 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Polygon,
    MultiPolygon,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    pub fn new(type_name: impl Into<String>, coordinates: Value) -> Self {
        Self {
            type_name: type_name.into(),
            coordinates,
        }
    }

    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new("Point", json!([lon, lat]))
    }

    /// Polygon from `[lon, lat]` rings; the first ring is the outer boundary.
    pub fn polygon(rings: &[Vec<[f64; 2]>]) -> Self {
        Self::new("Polygon", json!(rings))
    }

    pub fn multi_polygon(polygons: &[Vec<Vec<[f64; 2]>>]) -> Self {
        Self::new("MultiPolygon", json!(polygons))
    }

    pub fn kind(&self) -> GeometryKind {
        match self.type_name.as_str() {
            "Point" => GeometryKind::Point,
            "Polygon" => GeometryKind::Polygon,
            "MultiPolygon" => GeometryKind::MultiPolygon,
            _ => GeometryKind::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_risk(self, risk: f64) -> Self {
        self.with_property("risk", risk)
    }

    /// Risk in `[0, 1]`: the `risk` property clamped, or [`DEFAULT_RISK`] when
    /// it is missing, non-numeric or not finite.
    pub fn risk(&self) -> f64 {
        normalize_risk(self.properties.get("risk"))
    }
}

pub fn normalize_risk(raw: Option<&Value>) -> f64 {
    match raw.and_then(Value::as_f64) {
        Some(r) if r.is_finite() => r.clamp(0.0, 1.0),
        _ => DEFAULT_RISK,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_tag")]
    pub type_name: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            type_name: feature_collection_tag(),
            features,
        }
    }
}

fn feature_collection_tag() -> String {
    "FeatureCollection".to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
