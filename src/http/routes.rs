//! HTTP API Route Definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};
use crate::clone::CloneTable;

/// Path prefixes owned by the static API; clones may not mount under them
pub const RESERVED_PREFIXES: [&str; 4] = ["/health", "/directory", "/discovery", "/layer"];

/// Create the API router: static routes plus every clone table
pub fn create_router(app_state: AppState, clones: Vec<CloneTable>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        // Crawled directory views
        .route("/directory/", get(handlers::directory))
        .route("/directory/featurelayers/", get(handlers::feature_layers))
        .route("/directory/rasters/", get(handlers::rasters))
        .route("/directory/multiple/", post(handlers::directory_multiple))
        // Single listings
        .route("/discovery/", post(handlers::discovery))
        .route("/discovery/multiple/", post(handlers::discovery_multiple))
        // Layers
        .route("/layer/", get(handlers::layer))
        .route("/layer/multiple/", post(handlers::layer_multiple))
        .with_state(app_state);

    clones
        .into_iter()
        .fold(api, |router, clone| router.merge(clone.into_router()))
}
