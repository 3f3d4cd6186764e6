//! In-memory ArcGIS clients for unit tests

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::arcgis::{
    ArcGisError, DirectoryClient, DirectoryEntry, FeatureLayerClient, LayerData,
};

pub const ROOT: &str = "https://example.org/arcgis/rest/services";

/// Directory client backed by a url → listing map
#[derive(Default)]
pub struct MockDirectory {
    listings: HashMap<String, Vec<DirectoryEntry>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(mut self, url: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.listings.insert(url.to_string(), entries);
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl DirectoryClient for MockDirectory {
    async fn fetch_directory_listing(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>, ArcGisError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), token.map(str::to_string)));

        if self.failing.contains(url) {
            return Err(ArcGisError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        self.listings.get(url).cloned().ok_or_else(|| ArcGisError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Feature-layer client that echoes the requested URL back as metadata
#[derive(Default)]
pub struct MockLayers {
    failing: HashSet<String>,
    calls: Mutex<Vec<LayerCall>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCall {
    pub url: String,
    pub token: Option<String>,
    pub where_clause: String,
}

impl MockLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<LayerCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeatureLayerClient for MockLayers {
    async fn fetch_layer(
        &self,
        url: &str,
        token: Option<&str>,
        where_clause: &str,
    ) -> Result<LayerData, ArcGisError> {
        self.calls.lock().unwrap().push(LayerCall {
            url: url.to_string(),
            token: token.map(str::to_string),
            where_clause: where_clause.to_string(),
        });

        if self.failing.contains(url) {
            return Err(ArcGisError::EmptyResult(url.to_string()));
        }

        let metadata = match json!({ "url": url, "name": url.rsplit('/').next() }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        Ok(LayerData {
            metadata,
            data: r#"{"type":"FeatureCollection","features":[]}"#.to_string(),
        })
    }
}
