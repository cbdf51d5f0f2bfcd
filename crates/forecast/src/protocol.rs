//! Wire contract of the inference backend.
//!
//! Request: `POST {apiBase}/api/ai/infer` with
//! `{ "disaster": "fires", "horizonHours": 6, "options": {} }`.
//! Success bodies are either `{ "geojson": FeatureCollection }` or a bare
//! `FeatureCollection`; both are accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::disaster::{DisasterKind, Horizon, RequestKey};
use crate::geojson::{Feature, FeatureCollection};

/// Path of the inference endpoint, relative to the api base.
pub const INFER_PATH: &str = "/api/ai/infer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferRequest {
    pub disaster: DisasterKind,
    pub horizon_hours: u32,
    #[serde(default)]
    pub options: Value,
}

impl InferRequest {
    pub fn new(key: RequestKey, options: Value) -> Self {
        Self {
            disaster: key.disaster,
            horizon_hours: key.horizon.hours(),
            options,
        }
    }

    pub fn key(&self) -> Option<RequestKey> {
        Horizon::new(self.horizon_hours).map(|h| RequestKey::new(self.disaster, h))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InferResponse {
    Wrapped { geojson: FeatureCollection },
    Bare(FeatureCollection),
}

impl InferResponse {
    pub fn into_features(self) -> Vec<Feature> {
        match self {
            InferResponse::Wrapped { geojson } => geojson.features,
            InferResponse::Bare(collection) => collection.features,
        }
    }
}

pub fn decode_infer_response(body: &[u8]) -> Result<Vec<Feature>, serde_json::Error> {
    let response: InferResponse = serde_json::from_slice(body)?;
    Ok(response.into_features())
}
