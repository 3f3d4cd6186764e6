//! Single-listing discovery handlers

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use futures::future::join_all;

use super::{layers_entry, layers_reply, AppState};
use crate::discovery::list_directory;
use crate::http::types::{DirectoryQuery, MultiLayersResponse, MultiUrlRequest};

/// Top-level listing of a services directory, without crawling
pub async fn discovery(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Response {
    let token = query.token.as_deref().filter(|t| !t.is_empty());
    layers_reply(list_directory(state.directory.as_ref(), &query.url, token).await)
}

/// Top-level listings of several directories, fetched concurrently
pub async fn discovery_multiple(
    State(state): State<AppState>,
    Json(request): Json<MultiUrlRequest>,
) -> Json<MultiLayersResponse> {
    let state = &state;
    let token = request.token.as_deref().filter(|t| !t.is_empty());

    let results = join_all(request.urls.iter().map(|url| async move {
        let result = list_directory(state.directory.as_ref(), url, token).await;
        (url.clone(), layers_entry(result))
    }))
    .await;

    Json(MultiLayersResponse {
        layers: results.into_iter().collect(),
    })
}
