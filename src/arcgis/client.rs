//! reqwest-backed ArcGIS client
//!
//! Directory listings are read from `<url>?f=json`; layer rows come from
//! `<layer>/query?f=geojson`. The GeoJSON body is passed through untouched.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::ArcGisError;
use super::types::{DirectoryEntry, LayerData, FOLDER_TYPE};
use super::{DirectoryClient, FeatureLayerClient};

/// Configuration for the ArcGIS client
#[derive(Debug, Clone)]
pub struct ArcGisClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
}

impl Default for ArcGisClientConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
        }
    }
}

/// Shared HTTP session for all directory and layer requests
#[derive(Debug, Clone)]
pub struct ArcGisClient {
    http_client: reqwest::Client,
}

impl ArcGisClient {
    pub fn new(config: ArcGisClientConfig) -> Result<Self, ArcGisError> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { http_client })
    }

    /// GET `url` with `f=<format>` and an optional token, returning both the
    /// parsed document and its raw text.
    async fn get_document(
        &self,
        url: &str,
        token: Option<&str>,
        format: &str,
        params: &[(&str, &str)],
    ) -> Result<(Value, String), ArcGisError> {
        let parsed =
            Url::parse(url).map_err(|e| ArcGisError::InvalidUrl(format!("{}: {}", url, e)))?;

        let mut request = self.http_client.get(parsed).query(&[("f", format)]);
        if let Some(token) = token {
            request = request.query(&[("token", token)]);
        }
        if !params.is_empty() {
            request = request.query(params);
        }

        debug!("GET {} (f={})", url, format);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArcGisError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| ArcGisError::decode(url, e))?;
        check_error_envelope(&value)?;

        Ok((value, body))
    }
}

#[async_trait]
impl DirectoryClient for ArcGisClient {
    async fn fetch_directory_listing(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>, ArcGisError> {
        let (body, _) = self.get_document(url, token, "json", &[]).await?;
        parse_listing(url, &body)
    }
}

#[async_trait]
impl FeatureLayerClient for ArcGisClient {
    async fn fetch_layer(
        &self,
        url: &str,
        token: Option<&str>,
        where_clause: &str,
    ) -> Result<LayerData, ArcGisError> {
        let metadata = match self.get_document(url, token, "json", &[]).await?.0 {
            Value::Object(map) => map,
            _ => return Err(ArcGisError::decode(url, "layer metadata is not a JSON object")),
        };

        let query_url = format!("{}/query", url.trim_end_matches('/'));
        let params = [
            ("where", where_clause),
            ("outFields", "*"),
            ("returnGeometry", "true"),
        ];
        let (collection, data) = self.get_document(&query_url, token, "geojson", &params).await?;

        let count = collection
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::len)
            .ok_or_else(|| ArcGisError::decode(&query_url, "missing features array"))?;
        if count == 0 {
            return Err(ArcGisError::EmptyResult(url.to_string()));
        }
        if exceeded_transfer_limit(&collection) {
            debug!("{} truncated at {} features by the server", url, count);
        }

        Ok(LayerData { metadata, data })
    }
}

/// ArcGIS reports failures as `{"error": {"code": .., "message": ..}}`,
/// usually with HTTP 200.
fn check_error_envelope(value: &Value) -> Result<(), ArcGisError> {
    let Some(error) = value.get("error") else {
        return Ok(());
    };
    let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    Err(ArcGisError::Remote { code, message })
}

fn exceeded_transfer_limit(collection: &Value) -> bool {
    collection
        .get("exceededTransferLimit")
        .or_else(|| collection.pointer("/properties/exceededTransferLimit"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Flatten a directory document into entries with absolute URLs.
pub(crate) fn parse_listing(url: &str, body: &Value) -> Result<Vec<DirectoryEntry>, ArcGisError> {
    let object = body
        .as_object()
        .ok_or_else(|| ArcGisError::decode(url, "expected a JSON object"))?;

    if !["folders", "services", "layers", "tables"]
        .iter()
        .any(|key| object.contains_key(*key))
    {
        return Err(ArcGisError::decode(url, "response is not a directory listing"));
    }

    let base = url.trim_end_matches('/');
    let array = |key: &str| array_field(object, key);

    let mut entries = Vec::new();

    for folder in array("folders").iter().filter_map(Value::as_str) {
        entries.push(DirectoryEntry::new(folder, FOLDER_TYPE, child_url(base, folder)));
    }

    for service in array("services") {
        let Some(name) = service.get("name").and_then(Value::as_str) else {
            continue;
        };
        let service_type = service.get("type").and_then(Value::as_str).unwrap_or_default();
        let service_url = match service.get("url").and_then(Value::as_str) {
            Some(explicit) => explicit.to_string(),
            None => format!("{}/{}", child_url(base, name), service_type),
        };
        entries.push(DirectoryEntry {
            name: format!("{}/{}", name, service_type),
            entry_type: Some(service_type.to_string()),
            url: service_url,
            geometry_type: None,
        });
    }

    for layer in array("layers").iter().chain(array("tables")) {
        let Some(id) = layer.get("id").and_then(Value::as_i64) else {
            continue;
        };
        let str_field = |key: &str| layer.get(key).and_then(Value::as_str).map(str::to_string);
        entries.push(DirectoryEntry {
            name: str_field("name").unwrap_or_else(|| id.to_string()),
            entry_type: str_field("type"),
            url: format!("{}/{}", base, id),
            geometry_type: str_field("geometryType"),
        });
    }

    Ok(entries)
}

fn array_field<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Absolute URL of a folder or service listed under `listing_url`.
///
/// Names inside a folder listing carry the folder prefix (`Parks/Trails`
/// listed under `.../services/Parks`), so the prefix is not repeated.
pub(crate) fn child_url(listing_url: &str, name: &str) -> String {
    let base = listing_url.trim_end_matches('/');
    match name.rsplit_once('/') {
        Some((folder, _)) if base.ends_with(&format!("/{}", folder)) => {
            format!("{}/{}", &base[..base.len() - folder.len() - 1], name)
        }
        _ => format!("{}/{}", base, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ROOT: &str = "https://example.org/arcgis/rest/services";

    #[test]
    fn child_url_at_root() {
        assert_eq!(child_url(ROOT, "Parks"), format!("{}/Parks", ROOT));
        assert_eq!(child_url(&format!("{}/", ROOT), "Parks"), format!("{}/Parks", ROOT));
    }

    #[test]
    fn child_url_strips_repeated_folder_prefix() {
        let folder = format!("{}/Parks", ROOT);
        assert_eq!(child_url(&folder, "Parks/Trails"), format!("{}/Parks/Trails", ROOT));
    }

    #[test]
    fn parse_root_listing() {
        let body = json!({
            "currentVersion": 10.91,
            "folders": ["Parks", "Utilities"],
            "services": [{"name": "Basemap", "type": "MapServer"}]
        });
        let entries = parse_listing(ROOT, &body).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], DirectoryEntry::new("Parks", "Folder", format!("{}/Parks", ROOT)));
        assert_eq!(entries[1].name, "Utilities");
        assert_eq!(entries[2].name, "Basemap/MapServer");
        assert_eq!(entries[2].url, format!("{}/Basemap/MapServer", ROOT));
    }

    #[test]
    fn parse_folder_listing_builds_service_urls() {
        let body = json!({
            "folders": [],
            "services": [
                {"name": "Parks/Trails", "type": "FeatureServer"},
                {
                    "name": "Parks/Imagery",
                    "type": "ImageServer",
                    "url": "https://cdn.example.org/Imagery/ImageServer"
                }
            ]
        });
        let entries = parse_listing(&format!("{}/Parks", ROOT), &body).unwrap();

        assert_eq!(entries[0].url, format!("{}/Parks/Trails/FeatureServer", ROOT));
        assert_eq!(entries[0].entry_type.as_deref(), Some("FeatureServer"));
        assert_eq!(entries[1].url, "https://cdn.example.org/Imagery/ImageServer");
    }

    #[test]
    fn parse_service_listing_includes_layers_and_tables() {
        let service = format!("{}/Parks/MapServer", ROOT);
        let body = json!({
            "layers": [
                {
                    "id": 0,
                    "name": "Parks",
                    "type": "Feature Layer",
                    "geometryType": "esriGeometryPolygon"
                },
                {"id": 1, "name": "Hillshade", "type": "Raster Layer"}
            ],
            "tables": [{"id": 2, "name": "Inspections", "type": "Table"}]
        });
        let entries = parse_listing(&service, &body).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].url, format!("{}/0", service));
        assert_eq!(entries[0].geometry_type.as_deref(), Some("esriGeometryPolygon"));
        assert_eq!(entries[1].entry_type.as_deref(), Some("Raster Layer"));
        assert_eq!(entries[2].url, format!("{}/2", service));
    }

    #[test]
    fn parse_rejects_non_listing_documents() {
        let err = parse_listing(ROOT, &json!({"name": "not a directory"})).unwrap_err();
        assert!(matches!(err, ArcGisError::Decode { .. }));

        let err = parse_listing(ROOT, &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ArcGisError::Decode { .. }));
    }

    #[test]
    fn error_envelope_is_detected() {
        let body = json!({"error": {"code": 498, "message": "Invalid Token", "details": []}});
        match check_error_envelope(&body) {
            Err(ArcGisError::Remote { code, message }) => {
                assert_eq!(code, 498);
                assert_eq!(message, "Invalid Token");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
        assert!(check_error_envelope(&json!({"folders": []})).is_ok());
    }

    #[test]
    fn transfer_limit_flag_in_either_location() {
        assert!(exceeded_transfer_limit(&json!({"exceededTransferLimit": true})));
        assert!(exceeded_transfer_limit(&json!({"properties": {"exceededTransferLimit": true}})));
        assert!(!exceeded_transfer_limit(&json!({"features": []})));
    }

    #[test]
    fn client_builds_with_default_config() {
        assert!(ArcGisClient::new(ArcGisClientConfig::default()).is_ok());
    }
}
