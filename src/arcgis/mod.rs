//! ArcGIS REST client
//!
//! The rest of the crate only talks to ArcGIS through the [`DirectoryClient`]
//! and [`FeatureLayerClient`] traits. [`ArcGisClient`] implements both on top
//! of a single pooled `reqwest::Client`.

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::{ArcGisClient, ArcGisClientConfig};
pub use error::ArcGisError;
pub use types::{
    DirectoryEntry, EntryKind, LayerData, LayerDescriptor, LayerType, DEFAULT_WHERE,
};

/// Lists the entries of one services-directory node
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch the listing at `url`: folders, services, layers and tables,
    /// each with an absolute URL.
    async fn fetch_directory_listing(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>, ArcGisError>;
}

/// Fetches one layer's metadata and rows
#[async_trait]
pub trait FeatureLayerClient: Send + Sync {
    async fn fetch_layer(
        &self,
        url: &str,
        token: Option<&str>,
        where_clause: &str,
    ) -> Result<LayerData, ArcGisError>;
}
