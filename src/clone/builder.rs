//! Clone table assembly
//!
//! [`build_clone_router`] crawls the remote directory once and returns a
//! finished [`CloneTable`]. A failed crawl returns an error and no table.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::relativize::{normalize_prefix, trim_path};
use super::route::{LayerRoute, RelativizationError, DISCOVERY_PATHS};
use crate::arcgis::{DirectoryClient, FeatureLayerClient, LayerType};
use crate::discovery::{crawl, filter_layers_by_type, CrawlOptions, DiscoveryError};

/// Default mount prefix for a clone
pub const DEFAULT_PREFIX: &str = "/clone";

/// What to clone and where to mount it
#[derive(Debug, Clone)]
pub struct CloneOptions {
    pub root_url: String,
    pub default_token: Option<String>,
    pub prefix: String,
    pub crawl: CrawlOptions,
}

impl CloneOptions {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            default_token: None,
            prefix: DEFAULT_PREFIX.to_string(),
            crawl: CrawlOptions::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_token(mut self, token: Option<String>) -> Self {
        self.default_token = token;
        self
    }

    pub fn with_crawl(mut self, crawl: CrawlOptions) -> Self {
        self.crawl = crawl;
        self
    }
}

/// Everything the discovery routes of one clone need at request time
pub(crate) struct CloneDirectory {
    pub(crate) root_url: String,
    pub(crate) default_token: Option<String>,
    pub(crate) client: Arc<dyn DirectoryClient>,
    pub(crate) crawl: CrawlOptions,
}

/// Finished route table of one clone
pub struct CloneTable {
    pub(crate) prefix: String,
    pub(crate) directory: Arc<CloneDirectory>,
    pub(crate) routes: Vec<LayerRoute>,
    skipped: Vec<RelativizationError>,
}

impl std::fmt::Debug for CloneTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneTable")
            .field("prefix", &self.prefix)
            .field("root_url", &self.directory.root_url)
            .field("routes", &self.routes)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

impl CloneTable {
    /// Normalized mount prefix (`""` when mounted at the root)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root_url(&self) -> &str {
        &self.directory.root_url
    }

    /// Layer routes, in crawl order
    pub fn routes(&self) -> &[LayerRoute] {
        &self.routes
    }

    pub fn route(&self, relative_path: &str) -> Option<&LayerRoute> {
        self.routes.iter().find(|r| r.relative_path() == relative_path)
    }

    /// Layers that were discovered but could not be mounted
    pub fn skipped(&self) -> &[RelativizationError] {
        &self.skipped
    }

    /// Full mount paths: the discovery routes first, then one per layer
    pub fn paths(&self) -> Vec<String> {
        DISCOVERY_PATHS
            .iter()
            .copied()
            .chain(self.routes.iter().map(LayerRoute::relative_path))
            .map(|path| mount_path(&self.prefix, path))
            .collect()
    }
}

pub(crate) fn mount_path(prefix: &str, relative_path: &str) -> String {
    format!("{}{}", prefix, relative_path)
}

/// Crawl `options.root_url` and synthesize one route per feature layer.
///
/// Layers whose URL cannot be mounted are skipped with a warning; a crawl
/// failure fails the whole build.
pub async fn build_clone_router(
    directory: Arc<dyn DirectoryClient>,
    layers: Arc<dyn FeatureLayerClient>,
    options: CloneOptions,
) -> Result<CloneTable, DiscoveryError> {
    let prefix = normalize_prefix(&options.prefix);
    let root_url = trim_path(&options.root_url).to_string();
    let default_token = options.default_token.as_deref();

    info!("Cloning {} under {}/", root_url, prefix);

    let tree = crawl(directory.as_ref(), &root_url, default_token, options.crawl).await?;
    let features = filter_layers_by_type(&tree, LayerType::FEATURE_LAYER);

    let mut routes = Vec::with_capacity(features.len());
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for descriptor in features.descriptors() {
        let synthesized =
            LayerRoute::synthesize(descriptor, &root_url, default_token, layers.clone());
        let error = match synthesized {
            Ok(route) if seen.insert(route.relative_path().to_string()) => {
                debug!(
                    "Registered {} ({})",
                    mount_path(&prefix, route.relative_path()),
                    route.name()
                );
                routes.push(route);
                continue;
            }
            Ok(route) => RelativizationError::Duplicate {
                path: route.relative_path().to_string(),
            },
            Err(error) => error,
        };
        warn!("Skipping layer {}: {}", descriptor.name, error);
        skipped.push(error);
    }

    info!(
        "Clone of {} ready: {} layer routes, {} skipped",
        root_url,
        routes.len(),
        skipped.len()
    );

    Ok(CloneTable {
        prefix,
        directory: Arc::new(CloneDirectory {
            root_url,
            default_token: options.default_token,
            client: directory,
            crawl: options.crawl,
        }),
        routes,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcgis::DirectoryEntry;
    use crate::http::types::CloneQuery;
    use crate::test_support::{MockDirectory, MockLayers, ROOT};

    fn map_server(layers: Vec<DirectoryEntry>) -> MockDirectory {
        MockDirectory::new()
            .listing(
                ROOT,
                vec![DirectoryEntry::new(
                    "Parks/MapServer",
                    "MapServer",
                    format!("{}/Parks/MapServer", ROOT),
                )],
            )
            .listing(&format!("{}/Parks/MapServer", ROOT), layers)
    }

    fn layer(name: &str, layer_type: &str, id: u32) -> DirectoryEntry {
        DirectoryEntry::new(name, layer_type, format!("{}/Parks/MapServer/{}", ROOT, id))
    }

    #[tokio::test]
    async fn parks_scenario() {
        let directory = Arc::new(map_server(vec![layer("Parks", "Feature Layer", 0)]));
        let layers = Arc::new(MockLayers::new());

        let table = build_clone_router(directory, layers.clone(), CloneOptions::new(ROOT))
            .await
            .unwrap();

        let route = table.route("/Parks/MapServer/0/").expect("route registered");
        assert_eq!(route.name(), "Parks");

        let data = route.invoke(&CloneQuery::default()).await.unwrap();
        assert_eq!(data.metadata["url"], format!("{}/Parks/MapServer/0", ROOT));
        assert_eq!(layers.calls()[0].url, format!("{}/Parks/MapServer/0", ROOT));
    }

    #[tokio::test]
    async fn each_route_fetches_its_own_layer() {
        let directory = Arc::new(map_server(vec![
            layer("Parks", "Feature Layer", 0),
            layer("Trails", "Feature Layer", 1),
            layer("Benches", "Feature Layer", 2),
        ]));
        let layers = Arc::new(MockLayers::new());
        let table = build_clone_router(directory, layers.clone(), CloneOptions::new(ROOT))
            .await
            .unwrap();
        assert_eq!(table.routes().len(), 3);

        // Invoke in reverse registration order
        for id in [2, 0, 1] {
            let path = format!("/Parks/MapServer/{}/", id);
            table.route(&path).unwrap().invoke(&CloneQuery::default()).await.unwrap();
        }

        let urls: Vec<String> = layers.calls().into_iter().map(|c| c.url).collect();
        assert_eq!(
            urls,
            vec![
                format!("{}/Parks/MapServer/2", ROOT),
                format!("{}/Parks/MapServer/0", ROOT),
                format!("{}/Parks/MapServer/1", ROOT),
            ]
        );
    }

    #[tokio::test]
    async fn only_feature_layers_get_routes() {
        let directory = Arc::new(map_server(vec![
            layer("Parks", "Feature Layer", 0),
            layer("Hillshade", "Raster Layer", 1),
            layer("Group", "Group Layer", 2),
        ]));
        let layers = Arc::new(MockLayers::new());
        let table = build_clone_router(directory, layers, CloneOptions::new(ROOT))
            .await
            .unwrap();

        let paths: Vec<&str> = table.routes().iter().map(|r| r.relative_path()).collect();
        assert_eq!(paths, vec!["/Parks/MapServer/0/"]);
    }

    #[tokio::test]
    async fn build_fails_when_second_folder_fetch_fails() {
        let directory = Arc::new(
            MockDirectory::new()
                .listing(
                    ROOT,
                    vec![
                        DirectoryEntry::new("Parks", "Folder", format!("{}/Parks", ROOT)),
                        DirectoryEntry::new("Roads", "Folder", format!("{}/Roads", ROOT)),
                    ],
                )
                .listing(&format!("{}/Parks", ROOT), vec![])
                .failing(&format!("{}/Roads", ROOT)),
        );

        let layers = Arc::new(MockLayers::new());
        let result = build_clone_router(directory, layers, CloneOptions::new(ROOT)).await;
        match result {
            Err(err) => assert_eq!(err.url, format!("{}/Roads", ROOT)),
            Ok(_) => panic!("build must fail when any listing fails"),
        }
    }

    #[tokio::test]
    async fn foreign_and_duplicate_layers_are_skipped() {
        let directory = Arc::new(map_server(vec![
            layer("Parks", "Feature Layer", 0),
            DirectoryEntry::new(
                "Mirror",
                "Feature Layer",
                "https://mirror.example.org/Parks/MapServer/0",
            ),
            DirectoryEntry::new("Again", "Feature Layer", format!("{}/Parks/MapServer/0/", ROOT)),
        ]));
        let layers = Arc::new(MockLayers::new());
        let table = build_clone_router(directory, layers, CloneOptions::new(ROOT))
            .await
            .unwrap();

        assert_eq!(table.routes().len(), 1);
        assert_eq!(table.skipped().len(), 2);
        assert!(matches!(table.skipped()[0], RelativizationError::OutsideRoot { .. }));
        assert!(matches!(table.skipped()[1], RelativizationError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn paths_include_prefix_and_discovery_routes() {
        let directory = Arc::new(map_server(vec![layer("Parks", "Feature Layer", 0)]));
        let options = CloneOptions::new(format!("{}/", ROOT)).with_prefix("vcgov/");
        let table = build_clone_router(directory, Arc::new(MockLayers::new()), options)
            .await
            .unwrap();

        assert_eq!(table.prefix(), "/vcgov");
        assert_eq!(table.root_url(), ROOT);
        assert_eq!(
            table.paths(),
            vec![
                "/vcgov/".to_string(),
                "/vcgov/featurelayers/".to_string(),
                "/vcgov/rasters/".to_string(),
                "/vcgov/Parks/MapServer/0/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn repeated_builds_are_independent_and_identical() {
        let directory = Arc::new(map_server(vec![
            layer("Parks", "Feature Layer", 0),
            layer("Trails", "Feature Layer", 1),
        ]));
        let layers = Arc::new(MockLayers::new());

        let first = build_clone_router(directory.clone(), layers.clone(), CloneOptions::new(ROOT))
            .await
            .unwrap();
        let second = build_clone_router(directory.clone(), layers, CloneOptions::new(ROOT))
            .await
            .unwrap();

        assert_eq!(first.paths(), second.paths());
        assert_eq!(directory.requested().len(), 4, "each build re-crawls");
    }
}
