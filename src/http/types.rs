//! HTTP API Request/Response Types
//!
//! JSON-serializable types for the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::arcgis::{LayerData, DEFAULT_WHERE};
use crate::discovery::LayerCatalogue;

fn default_where() -> String {
    DEFAULT_WHERE.to_string()
}

/// Discovery response: grouped entries, or an error message
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayersResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<LayerCatalogue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayersResponse {
    pub fn ok(layers: LayerCatalogue) -> Self {
        Self {
            layers: Some(layers),
            error: None,
        }
    }

    pub fn error(message: impl ToString) -> Self {
        Self {
            layers: None,
            error: Some(message.to_string()),
        }
    }
}

/// Layer response: metadata plus GeoJSON text, or an error message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// GeoJSON FeatureCollection text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayerResponse {
    pub fn error(message: impl ToString) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }
}

impl From<LayerData> for LayerResponse {
    fn from(layer: LayerData) -> Self {
        Self {
            metadata: Some(layer.metadata),
            data: Some(layer.data),
            error: None,
        }
    }
}

/// Query parameters of a directory endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryQuery {
    pub url: String,
    pub token: Option<String>,
}

/// Query parameters of a layer endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LayerQuery {
    pub url: String,
    pub token: Option<String>,
    #[serde(rename = "where", default = "default_where")]
    pub where_clause: String,
}

/// Query parameters of a clone discovery route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Query parameters of a clone route; the URL is fixed by the route
#[derive(Debug, Clone, Deserialize)]
pub struct CloneQuery {
    pub token: Option<String>,
    #[serde(rename = "where", default = "default_where")]
    pub where_clause: String,
}

impl Default for CloneQuery {
    fn default() -> Self {
        Self {
            token: None,
            where_clause: default_where(),
        }
    }
}

/// Batch request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiUrlRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Batch discovery response, keyed by requested URL
#[derive(Debug, Clone, Serialize)]
pub struct MultiLayersResponse {
    pub layers: BTreeMap<String, LayersResponse>,
}

/// Batch layer response, keyed by requested URL under `gdfs`
#[derive(Debug, Clone, Serialize)]
pub struct MultiLayerResponse {
    pub gdfs: BTreeMap<String, LayerResponse>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// An empty string token counts as absent
pub fn effective_token<'a>(token: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    token.filter(|t| !t.is_empty()).or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_falls_back() {
        assert_eq!(effective_token(Some(""), Some("default")), Some("default"));
        assert_eq!(effective_token(None, Some("default")), Some("default"));
        assert_eq!(effective_token(Some("override"), Some("default")), Some("override"));
        assert_eq!(effective_token(None, None), None);
    }

    #[test]
    fn error_responses_omit_payload_fields() {
        let json = serde_json::to_value(LayerResponse::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom"}));

        let json = serde_json::to_value(LayersResponse::error("down")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "down"}));
    }

    #[test]
    fn batch_envelopes_use_their_own_keys() {
        let mut gdfs = BTreeMap::new();
        gdfs.insert("https://h/0".to_string(), LayerResponse::error("boom"));
        let json = serde_json::to_value(MultiLayerResponse { gdfs }).unwrap();
        assert_eq!(json, serde_json::json!({"gdfs": {"https://h/0": {"error": "boom"}}}));

        let mut layers = BTreeMap::new();
        layers.insert("https://h".to_string(), LayersResponse::error("down"));
        let json = serde_json::to_value(MultiLayersResponse { layers }).unwrap();
        assert_eq!(json, serde_json::json!({"layers": {"https://h": {"error": "down"}}}));
    }

    #[test]
    fn clone_query_defaults_where() {
        let query: CloneQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.where_clause, "1=1");
        assert!(query.token.is_none());
    }
}
