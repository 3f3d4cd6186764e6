//! Services-directory discovery
//!
//! Crawls a remote ArcGIS Services Directory into a [`ServiceDirectoryNode`]
//! tree and offers grouped, type-filtered views over it.

pub mod crawler;
pub mod filter;

pub use crawler::{crawl, CrawlOptions, DiscoveryError, ServiceDirectoryNode, DEFAULT_MAX_DEPTH};
pub use filter::{catalogue, filter_layers_by_type, LayerCatalogue, LayerGroup};

use crate::arcgis::{DirectoryClient, LayerDescriptor};

/// Crawl `url` and return its catalogue, optionally keeping only one layer type
pub async fn crawl_catalogue(
    client: &dyn DirectoryClient,
    url: &str,
    token: Option<&str>,
    options: CrawlOptions,
    type_filter: Option<&str>,
) -> Result<LayerCatalogue, DiscoveryError> {
    let tree = crawl(client, url, token, options).await?;
    Ok(match type_filter {
        Some(type_name) => filter_layers_by_type(&tree, type_name),
        None => catalogue(&tree),
    })
}

/// Single listing of `url` without descending into folders or services,
/// grouped under the URL itself
pub async fn list_directory(
    client: &dyn DirectoryClient,
    url: &str,
    token: Option<&str>,
) -> Result<LayerCatalogue, DiscoveryError> {
    let entries = client
        .fetch_directory_listing(url, token)
        .await
        .map_err(|source| DiscoveryError {
            url: url.to_string(),
            source,
        })?;
    Ok(LayerCatalogue::single(
        url,
        entries.into_iter().map(LayerDescriptor::from).collect(),
    ))
}
