//! Layer handlers

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use futures::future::join_all;
use tracing::debug;

use super::{layer_entry, layer_reply, AppState};
use crate::arcgis::{LayerData, DEFAULT_WHERE};
use crate::clone::LayerFetchError;
use crate::http::types::{LayerQuery, MultiLayerResponse, MultiUrlRequest};

async fn fetch(
    state: &AppState,
    url: &str,
    token: Option<&str>,
    where_clause: &str,
) -> Result<LayerData, LayerFetchError> {
    state
        .layers
        .fetch_layer(url, token, where_clause)
        .await
        .map_err(|source| LayerFetchError {
            url: url.to_string(),
            source,
        })
}

/// Retrieve one layer by URL
pub async fn layer(State(state): State<AppState>, Query(query): Query<LayerQuery>) -> Response {
    debug!("HTTP layer request: url={}, where={}", query.url, query.where_clause);
    let token = query.token.as_deref().filter(|t| !t.is_empty());
    layer_reply(fetch(&state, &query.url, token, &query.where_clause).await)
}

/// Retrieve several layers concurrently, unfiltered
pub async fn layer_multiple(
    State(state): State<AppState>,
    Json(request): Json<MultiUrlRequest>,
) -> Json<MultiLayerResponse> {
    debug!("HTTP layer batch: {} urls", request.urls.len());
    let state = &state;
    let token = request.token.as_deref().filter(|t| !t.is_empty());

    let results = join_all(request.urls.iter().map(|url| async move {
        let result = fetch(state, url, token, DEFAULT_WHERE).await;
        (url.clone(), layer_entry(result))
    }))
    .await;

    Json(MultiLayerResponse {
        gdfs: results.into_iter().collect(),
    })
}
