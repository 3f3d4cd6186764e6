//! Recursive services-directory crawler
//!
//! Walks folders and layer-bearing services one listing at a time. Any
//! failure aborts the whole crawl; there is no partial tree.

use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::arcgis::{ArcGisError, DirectoryClient, EntryKind, LayerDescriptor};

/// Default limit on folder/service nesting below the root
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Crawl of a remote directory failed
#[derive(Debug, Error)]
#[error("Failed to crawl {url}: {source}")]
pub struct DiscoveryError {
    /// URL whose listing could not be fetched or decoded
    pub url: String,
    #[source]
    pub source: ArcGisError,
}

/// One folder or service of the remote tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDirectoryNode {
    pub url: String,
    pub name: String,
    pub children: Vec<ServiceDirectoryNode>,
    pub layers: Vec<LayerDescriptor>,
}

impl ServiceDirectoryNode {
    /// Depth-first walk over every node, parents before children
    pub fn walk(&self) -> Vec<&ServiceDirectoryNode> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children.iter().rev());
        }
        nodes
    }

    /// Total number of leaf descriptors in the tree
    pub fn layer_count(&self) -> usize {
        self.walk().iter().map(|n| n.layers.len()).sum()
    }
}

/// Crawl options
#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    pub max_depth: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Crawl the directory rooted at `root_url`.
pub async fn crawl(
    client: &dyn DirectoryClient,
    root_url: &str,
    token: Option<&str>,
    options: CrawlOptions,
) -> Result<ServiceDirectoryNode, DiscoveryError> {
    let root_url = root_url.trim().trim_end_matches('/');
    let mut crawler = Crawler {
        client,
        token,
        max_depth: options.max_depth,
        visited: HashSet::new(),
    };

    let root = crawler
        .crawl_node(root_url.to_string(), root_name(root_url), 0)
        .await?;
    debug!("Crawled {}: {} layers", root_url, root.layer_count());
    Ok(root)
}

/// Last path segment of the root URL, used as the root group name
fn root_name(root_url: &str) -> String {
    root_url
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(root_url)
        .to_string()
}

struct Crawler<'a> {
    client: &'a dyn DirectoryClient,
    token: Option<&'a str>,
    max_depth: usize,
    visited: HashSet<String>,
}

impl<'a> Crawler<'a> {
    fn crawl_node<'s>(
        &'s mut self,
        url: String,
        name: String,
        depth: usize,
    ) -> BoxFuture<'s, Result<ServiceDirectoryNode, DiscoveryError>> {
        Box::pin(async move {
            self.visited.insert(url.clone());

            let entries = self
                .client
                .fetch_directory_listing(&url, self.token)
                .await
                .map_err(|source| DiscoveryError {
                    url: url.clone(),
                    source,
                })?;

            let mut node = ServiceDirectoryNode {
                url,
                name,
                children: Vec::new(),
                layers: Vec::new(),
            };

            for entry in entries {
                match entry.kind() {
                    EntryKind::Layer => node.layers.push(LayerDescriptor::from(entry)),
                    EntryKind::Folder | EntryKind::Service => {
                        if self.visited.contains(&entry.url) {
                            warn!("Skipping already crawled {}", entry.url);
                            continue;
                        }
                        if depth + 1 > self.max_depth {
                            warn!(
                                "Not descending into {}: depth limit {} reached",
                                entry.url, self.max_depth
                            );
                            continue;
                        }
                        let child = self.crawl_node(entry.url, entry.name, depth + 1).await?;
                        node.children.push(child);
                    }
                }
            }

            Ok(node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockDirectory, ROOT};
    use crate::arcgis::DirectoryEntry;

    fn sample_directory() -> MockDirectory {
        MockDirectory::new()
            .listing(
                ROOT,
                vec![
                    DirectoryEntry::new("Parks", "Folder", format!("{}/Parks", ROOT)),
                    DirectoryEntry::new(
                        "Basemap/MapServer",
                        "MapServer",
                        format!("{}/Basemap/MapServer", ROOT),
                    ),
                    DirectoryEntry::new(
                        "Elevation/ImageServer",
                        "ImageServer",
                        format!("{}/Elevation/ImageServer", ROOT),
                    ),
                ],
            )
            .listing(
                &format!("{}/Parks", ROOT),
                vec![DirectoryEntry::new(
                    "Parks/Trails/FeatureServer",
                    "FeatureServer",
                    format!("{}/Parks/Trails/FeatureServer", ROOT),
                )],
            )
            .listing(
                &format!("{}/Parks/Trails/FeatureServer", ROOT),
                vec![DirectoryEntry::new(
                    "Trails",
                    "Feature Layer",
                    format!("{}/Parks/Trails/FeatureServer/0", ROOT),
                )
                .with_geometry("esriGeometryPolyline")],
            )
            .listing(
                &format!("{}/Basemap/MapServer", ROOT),
                vec![
                    DirectoryEntry::new(
                        "Roads",
                        "Feature Layer",
                        format!("{}/Basemap/MapServer/0", ROOT),
                    ),
                    DirectoryEntry::new(
                        "Hillshade",
                        "Raster Layer",
                        format!("{}/Basemap/MapServer/1", ROOT),
                    ),
                ],
            )
    }

    #[tokio::test]
    async fn crawl_builds_tree() {
        let client = sample_directory();
        let root = crawl(&client, ROOT, None, CrawlOptions::default()).await.unwrap();

        assert_eq!(root.name, "services");
        assert_eq!(root.url, ROOT);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.layers.len(), 1, "ImageServer is a leaf");

        let parks = &root.children[0];
        assert_eq!(parks.name, "Parks");
        assert_eq!(parks.children[0].name, "Parks/Trails/FeatureServer");
        assert_eq!(parks.children[0].layers[0].name, "Trails");

        assert_eq!(root.layer_count(), 4);
    }

    #[tokio::test]
    async fn crawl_is_sequential_and_in_listing_order() {
        let client = sample_directory();
        crawl(&client, ROOT, None, CrawlOptions::default()).await.unwrap();

        assert_eq!(
            client.requested(),
            vec![
                ROOT.to_string(),
                format!("{}/Parks", ROOT),
                format!("{}/Parks/Trails/FeatureServer", ROOT),
                format!("{}/Basemap/MapServer", ROOT),
            ]
        );
    }

    #[tokio::test]
    async fn crawl_passes_token() {
        let client = sample_directory();
        crawl(&client, ROOT, Some("secret"), CrawlOptions::default()).await.unwrap();
        assert!(client.tokens().iter().all(|t| t.as_deref() == Some("secret")));
    }

    #[tokio::test]
    async fn crawl_failure_discards_partial_results() {
        let client = sample_directory().failing(&format!("{}/Parks/Trails/FeatureServer", ROOT));
        let err = crawl(&client, ROOT, None, CrawlOptions::default()).await.unwrap_err();

        assert_eq!(err.url, format!("{}/Parks/Trails/FeatureServer", ROOT));
        assert!(err.to_string().contains("Failed to crawl"));
    }

    #[tokio::test]
    async fn crawl_respects_depth_limit() {
        let client = sample_directory();
        let root = crawl(&client, ROOT, None, CrawlOptions { max_depth: 1 })
            .await
            .unwrap();

        let parks = &root.children[0];
        assert!(parks.children.is_empty());
        assert!(!client.requested().contains(&format!("{}/Parks/Trails/FeatureServer", ROOT)));
    }

    #[tokio::test]
    async fn crawl_skips_cycles() {
        let client = MockDirectory::new()
            .listing(ROOT, vec![DirectoryEntry::new("Loop", "Folder", format!("{}/Loop", ROOT))])
            .listing(
                &format!("{}/Loop", ROOT),
                vec![DirectoryEntry::new("Back", "Folder", ROOT)],
            );

        let root = crawl(&client, &format!("{}/", ROOT), None, CrawlOptions::default())
            .await
            .unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(root.children[0].children.is_empty());
        assert_eq!(client.requested().len(), 2);
    }

    #[test]
    fn root_name_uses_last_segment() {
        assert_eq!(root_name("https://example.org/arcgis/rest/services"), "services");
        assert_eq!(root_name("https://example.org/arcgis/rest/services/Parks"), "Parks");
    }
}
