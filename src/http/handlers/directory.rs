//! Crawled directory handlers

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use futures::future::join_all;
use tracing::debug;

use super::{layers_entry, layers_reply, AppState};
use crate::arcgis::LayerType;
use crate::discovery::crawl_catalogue;
use crate::http::types::{DirectoryQuery, MultiLayersResponse, MultiUrlRequest};

async fn crawl_reply(
    state: &AppState,
    query: DirectoryQuery,
    type_filter: Option<&str>,
) -> Response {
    debug!("HTTP directory request: url={}, filter={:?}", query.url, type_filter);
    layers_reply(
        crawl_catalogue(
            state.directory.as_ref(),
            &query.url,
            query.token.as_deref().filter(|t| !t.is_empty()),
            state.crawl,
            type_filter,
        )
        .await,
    )
}

/// Everything in a services directory
pub async fn directory(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Response {
    crawl_reply(&state, query, None).await
}

/// Feature layers in a services directory
pub async fn feature_layers(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Response {
    crawl_reply(&state, query, Some(LayerType::FEATURE_LAYER)).await
}

/// Rasters in a services directory
pub async fn rasters(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Response {
    crawl_reply(&state, query, Some(LayerType::RASTER_LAYER)).await
}

/// Crawl several directories concurrently
pub async fn directory_multiple(
    State(state): State<AppState>,
    Json(request): Json<MultiUrlRequest>,
) -> Json<MultiLayersResponse> {
    debug!("HTTP directory batch: {} urls", request.urls.len());
    let state = &state;
    let token = request.token.as_deref().filter(|t| !t.is_empty());

    let results = join_all(request.urls.iter().map(|url| async move {
        let result = crawl_catalogue(state.directory.as_ref(), url, token, state.crawl, None).await;
        (url.clone(), layers_entry(result))
    }))
    .await;

    Json(MultiLayersResponse {
        layers: results.into_iter().collect(),
    })
}
