//! ArcGIS Services-Directory façade
//!
//! A REST front for ArcGIS Services Directories, featuring:
//! - Recursive crawling of folders and services into a layer catalogue
//! - Layer retrieval as metadata plus GeoJSON features
//! - Clone routers that mirror a remote directory under a local prefix

pub mod arcgis;
pub mod clone;
pub mod config;
pub mod discovery;
pub mod http;

#[cfg(test)]
mod test_support;

pub use arcgis::{ArcGisClient, ArcGisError, DirectoryEntry, LayerData, LayerDescriptor};
pub use clone::{build_clone_router, CloneOptions, CloneTable};
pub use config::Config;
pub use discovery::{crawl, DiscoveryError, LayerCatalogue, ServiceDirectoryNode};
