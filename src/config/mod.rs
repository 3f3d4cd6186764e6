//! Configuration for the façade

mod arcgis;
mod http;
mod logging;

pub use arcgis::{ArcGisConfig, CloneConfig};
pub use http::HttpConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clone::normalize_prefix;
use crate::http::RESERVED_PREFIXES;

/// Default user agent for outbound ArcGIS requests
pub const DEFAULT_USER_AGENT: &str =
    concat!("arcgis-facade/", env!("CARGO_PKG_VERSION"));

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API server configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Outbound ArcGIS client configuration
    #[serde(default)]
    pub arcgis: ArcGisConfig,
    /// Directories mirrored at startup
    #[serde(default)]
    pub clones: Vec<CloneConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects every error and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // HTTP
        match self.http.listen_addr.rsplit_once(':') {
            Some((_, port_str)) => match port_str.parse::<u32>() {
                Ok(port) if port == 0 || port > 65535 => errors.push(format!(
                    "HTTP listen port must be between 1 and 65535, got {}",
                    port
                )),
                Ok(_) => {}
                Err(_) => errors.push(format!(
                    "HTTP listen address '{}' has an invalid port",
                    self.http.listen_addr
                )),
            },
            None => errors.push(format!(
                "HTTP listen address '{}' must be host:port",
                self.http.listen_addr
            )),
        }

        // ArcGIS client
        if self.arcgis.timeout_secs == 0 {
            errors.push("arcgis timeout_secs must be positive".to_string());
        }
        if self.arcgis.connect_timeout_secs == 0 {
            errors.push("arcgis connect_timeout_secs must be positive".to_string());
        }
        if self.arcgis.max_crawl_depth == 0 {
            errors.push("arcgis max_crawl_depth must be positive".to_string());
        }

        // Clones
        let mut prefixes: Vec<String> = Vec::new();
        for clone in &self.clones {
            match url::Url::parse(&clone.url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(parsed) => errors.push(format!(
                    "clone url '{}' must use http or https, got {}",
                    clone.url,
                    parsed.scheme()
                )),
                Err(e) => errors.push(format!("clone url '{}' is invalid: {}", clone.url, e)),
            }

            let prefix = normalize_prefix(&clone.prefix);
            if prefix.is_empty() {
                errors.push(format!("clone prefix for '{}' must not be the root", clone.url));
                continue;
            }
            if let Some(reserved) = RESERVED_PREFIXES.iter().find(|r| is_within(&prefix, r)) {
                errors.push(format!(
                    "clone prefix '{}' collides with reserved path '{}'",
                    prefix, reserved
                ));
            }
            // Nested clones register overlapping routes and axum panics on merge
            let overlap = prefixes
                .iter()
                .find(|other| is_within(&prefix, other) || is_within(other, &prefix))
                .cloned();
            match overlap {
                Some(other) if other == prefix => {
                    errors.push(format!("clone prefix '{}' is used more than once", prefix));
                }
                Some(other) => errors.push(format!(
                    "clone prefix '{}' overlaps clone prefix '{}'",
                    prefix, other
                )),
                None => prefixes.push(prefix),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

/// Whether `path` is `base` or lies below it
fn is_within(path: &str, base: &str) -> bool {
    path.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
