//! Directory and layer data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter expression that matches every row
pub const DEFAULT_WHERE: &str = "1=1";

/// `type` value ArcGIS uses for folder entries in a listing
pub const FOLDER_TYPE: &str = "Folder";

/// Service types whose listing enumerates layers
pub const LAYER_BEARING_SERVICES: &[&str] = &["MapServer", "FeatureServer"];

/// How the crawler should treat a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Sub-folder of the services directory
    Folder,
    /// Service that lists its own layers
    Service,
    /// Leaf entry (a layer, table, or a service without sub-layers)
    Layer,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<String>,
}

impl DirectoryEntry {
    pub fn new(
        name: impl Into<String>,
        entry_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entry_type: Some(entry_type.into()),
            url: url.into(),
            geometry_type: None,
        }
    }

    pub fn with_geometry(mut self, geometry_type: impl Into<String>) -> Self {
        self.geometry_type = Some(geometry_type.into());
        self
    }

    pub fn kind(&self) -> EntryKind {
        match self.entry_type.as_deref() {
            Some(FOLDER_TYPE) => EntryKind::Folder,
            Some(t) if LAYER_BEARING_SERVICES.contains(&t) => EntryKind::Service,
            _ => EntryKind::Layer,
        }
    }
}

/// Layer type reported by a map or feature service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerType {
    FeatureLayer,
    RasterLayer,
    Other(String),
}

impl LayerType {
    pub const FEATURE_LAYER: &'static str = "Feature Layer";
    pub const RASTER_LAYER: &'static str = "Raster Layer";

    pub fn as_str(&self) -> &str {
        match self {
            Self::FeatureLayer => Self::FEATURE_LAYER,
            Self::RasterLayer => Self::RASTER_LAYER,
            Self::Other(other) => other,
        }
    }
}

impl From<String> for LayerType {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::FEATURE_LAYER => Self::FeatureLayer,
            Self::RASTER_LAYER => Self::RasterLayer,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for LayerType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<LayerType> for String {
    fn from(value: LayerType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf discovered while crawling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    /// Absolute remote URL
    pub url: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<LayerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<String>,
}

impl LayerDescriptor {
    pub fn is_type(&self, type_name: &str) -> bool {
        self.layer_type
            .as_ref()
            .is_some_and(|t| t.as_str() == type_name)
    }
}

impl From<DirectoryEntry> for LayerDescriptor {
    fn from(entry: DirectoryEntry) -> Self {
        Self {
            url: entry.url,
            name: entry.name,
            layer_type: entry.entry_type.map(LayerType::from),
            geometry_type: entry.geometry_type,
        }
    }
}

/// Layer metadata plus its rows as a GeoJSON document
#[derive(Debug, Clone, PartialEq)]
pub struct LayerData {
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// GeoJSON FeatureCollection text
    pub data: String,
}
