//! Per-layer clone routes
//!
//! Each [`LayerRoute`] owns its relative path and remote URL. The router
//! hands the route to one shared handler as state, so no handler ever reads
//! a path that belongs to another layer.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::relativize::{is_under_root, join_remote, relativize};
use crate::arcgis::{ArcGisError, FeatureLayerClient, LayerData, LayerDescriptor};
use crate::http::types::{effective_token, CloneQuery};

/// Discovery paths every clone registers before its layer routes
pub const DISCOVERY_PATHS: [&str; 3] = ["/", "/featurelayers/", "/rasters/"];

/// A discovered layer that cannot be mounted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelativizationError {
    #[error("{url} is not under {root}")]
    OutsideRoot { url: String, root: String },
    #[error("{url} resolves to the clone root")]
    EmptyPath { url: String },
    #[error("{path} collides with a reserved route")]
    Reserved { path: String },
    #[error("{path} is already registered")]
    Duplicate { path: String },
}

/// Serving a clone route failed
#[derive(Debug, Error)]
#[error("Error retrieving layer {url}: {source}")]
pub struct LayerFetchError {
    pub url: String,
    #[source]
    pub source: ArcGisError,
}

/// One synthesized route
#[derive(Clone)]
pub struct LayerRoute {
    relative_path: String,
    name: String,
    remote_url: String,
    default_token: Option<String>,
    client: Arc<dyn FeatureLayerClient>,
}

impl fmt::Debug for LayerRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRoute")
            .field("relative_path", &self.relative_path)
            .field("name", &self.name)
            .field("remote_url", &self.remote_url)
            .finish_non_exhaustive()
    }
}

impl LayerRoute {
    /// Build the route for `descriptor`, mounted relative to `root_url`
    pub fn synthesize(
        descriptor: &LayerDescriptor,
        root_url: &str,
        default_token: Option<&str>,
        client: Arc<dyn FeatureLayerClient>,
    ) -> Result<Self, RelativizationError> {
        if !is_under_root(&descriptor.url, root_url) {
            return Err(RelativizationError::OutsideRoot {
                url: descriptor.url.clone(),
                root: root_url.to_string(),
            });
        }

        let relative_path = relativize(&descriptor.url, root_url);
        if relative_path == "/" {
            return Err(RelativizationError::EmptyPath {
                url: descriptor.url.clone(),
            });
        }
        // `:name` and `*rest` segments would be read as path parameters
        let has_pattern_segment = relative_path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'));
        if has_pattern_segment || DISCOVERY_PATHS.contains(&relative_path.as_str()) {
            return Err(RelativizationError::Reserved {
                path: relative_path,
            });
        }

        let remote_url = join_remote(root_url, &relative_path);
        Ok(Self {
            relative_path,
            name: descriptor.name.clone(),
            remote_url,
            default_token: default_token.map(str::to_string),
            client,
        })
    }

    /// Mount path relative to the clone prefix, e.g. `/Parks/MapServer/0/`
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Display name of the layer
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Fetch this route's layer, applying the token override and filter
    pub async fn invoke(&self, query: &CloneQuery) -> Result<LayerData, LayerFetchError> {
        let token = effective_token(query.token.as_deref(), self.default_token.as_deref());
        debug!(
            "Clone route {} -> {} (where={})",
            self.relative_path, self.remote_url, query.where_clause
        );

        self.client
            .fetch_layer(&self.remote_url, token, &query.where_clause)
            .await
            .map_err(|source| LayerFetchError {
                url: self.remote_url.clone(),
                source,
            })
    }
}
