//! HTTP API Request Handlers
//!
//! Thin handlers over the discovery and ArcGIS client layers.

mod directory;
mod discovery;
mod layer;
mod system;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use std::fmt::Display;
use std::sync::Arc;
use tracing::error;

use super::types::{LayerResponse, LayersResponse};
use crate::arcgis::{DirectoryClient, FeatureLayerClient, LayerData};
use crate::discovery::{CrawlOptions, DiscoveryError, LayerCatalogue};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn DirectoryClient>,
    pub layers: Arc<dyn FeatureLayerClient>,
    pub crawl: CrawlOptions,
}

// Re-export all handlers
pub use directory::{directory, directory_multiple, feature_layers, rasters};
pub use discovery::{discovery, discovery_multiple};
pub use layer::{layer, layer_multiple};
pub use system::health;

/// Render a discovery result; upstream failures become 502 `{error}`
pub(crate) fn layers_reply(result: Result<LayerCatalogue, DiscoveryError>) -> Response {
    match result {
        Ok(catalogue) => (StatusCode::OK, Json(LayersResponse::ok(catalogue))).into_response(),
        Err(err) => {
            error!("Discovery failed: {}", err);
            (StatusCode::BAD_GATEWAY, Json(LayersResponse::error(err))).into_response()
        }
    }
}

/// Render a layer result; upstream failures become 502 `{error}`
pub(crate) fn layer_reply<E: Display>(result: Result<LayerData, E>) -> Response {
    match result {
        Ok(layer) => (StatusCode::OK, Json(LayerResponse::from(layer))).into_response(),
        Err(err) => {
            error!("Layer request failed: {}", err);
            (StatusCode::BAD_GATEWAY, Json(LayerResponse::error(err))).into_response()
        }
    }
}

/// Per-entry body of a batch discovery response
pub(crate) fn layers_entry(result: Result<LayerCatalogue, DiscoveryError>) -> LayersResponse {
    result.map_or_else(LayersResponse::error, LayersResponse::ok)
}

/// Per-entry body of a batch layer response
pub(crate) fn layer_entry<E: Display>(result: Result<LayerData, E>) -> LayerResponse {
    result.map_or_else(|e| LayerResponse::error(e), LayerResponse::from)
}
