//! Attach a [`CloneTable`] to axum

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;

use super::builder::{mount_path, CloneDirectory, CloneTable};
use super::route::LayerRoute;
use crate::arcgis::LayerType;
use crate::discovery::crawl_catalogue;
use crate::http::handlers::{layer_reply, layers_reply};
use crate::http::types::{effective_token, CloneQuery, TokenQuery};

impl CloneTable {
    /// Convert the table into routes mounted under the clone prefix
    pub fn into_router(self) -> Router {
        let prefix = self.prefix;
        let directory = self.directory;

        let mut router = Router::new()
            .route(
                &mount_path(&prefix, "/"),
                get(list_all).with_state(directory.clone()),
            )
            .route(
                &mount_path(&prefix, "/featurelayers/"),
                get(list_feature_layers).with_state(directory.clone()),
            )
            .route(
                &mount_path(&prefix, "/rasters/"),
                get(list_rasters).with_state(directory),
            );

        for route in self.routes {
            let path = mount_path(&prefix, route.relative_path());
            router = router.route(
                &path,
                get(serve_layer).post(serve_layer).with_state(Arc::new(route)),
            );
        }

        router
    }
}

async fn discover(
    directory: &CloneDirectory,
    query: &TokenQuery,
    type_filter: Option<&str>,
) -> Response {
    let token = effective_token(query.token.as_deref(), directory.default_token.as_deref());
    layers_reply(
        crawl_catalogue(
            directory.client.as_ref(),
            &directory.root_url,
            token,
            directory.crawl,
            type_filter,
        )
        .await,
    )
}

/// Everything in the cloned directory
async fn list_all(
    State(directory): State<Arc<CloneDirectory>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    discover(&directory, &query, None).await
}

/// Feature layers in the cloned directory
async fn list_feature_layers(
    State(directory): State<Arc<CloneDirectory>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    discover(&directory, &query, Some(LayerType::FEATURE_LAYER)).await
}

/// Rasters in the cloned directory
async fn list_rasters(
    State(directory): State<Arc<CloneDirectory>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    discover(&directory, &query, Some(LayerType::RASTER_LAYER)).await
}

/// Shared handler for every synthesized layer route
async fn serve_layer(
    State(route): State<Arc<LayerRoute>>,
    Query(query): Query<CloneQuery>,
) -> Response {
    layer_reply(route.invoke(&query).await)
}
