//! ArcGIS client and clone configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::DEFAULT_USER_AGENT;
use crate::arcgis::ArcGisClientConfig;
use crate::clone::{CloneOptions, DEFAULT_PREFIX};
use crate::discovery::{CrawlOptions, DEFAULT_MAX_DEPTH};

/// Outbound ArcGIS request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcGisConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Total request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Folder/service nesting the crawler descends into
    #[serde(default = "default_max_crawl_depth")]
    pub max_crawl_depth: usize,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

fn default_max_crawl_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ArcGisConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_redirects: default_max_redirects(),
            max_crawl_depth: default_max_crawl_depth(),
        }
    }
}

impl ArcGisConfig {
    pub fn client_config(&self) -> ArcGisClientConfig {
        ArcGisClientConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_redirects: self.max_redirects,
        }
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            max_depth: self.max_crawl_depth,
        }
    }
}

/// One remote directory to mirror at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneConfig {
    /// Services directory root, e.g. "https://host/arcgis/rest/services"
    pub url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Token used when a request does not supply one
    #[serde(default)]
    pub default_token: Option<String>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl CloneConfig {
    pub fn new(url: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: prefix.into(),
            default_token: None,
        }
    }

    /// Parse a `PREFIX=URL` command-line spec
    pub fn parse_spec(spec: &str) -> Option<Self> {
        let (prefix, url) = spec.split_once('=')?;
        let (prefix, url) = (prefix.trim(), url.trim());
        if prefix.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self::new(url, prefix))
    }

    pub fn options(&self, crawl: CrawlOptions) -> CloneOptions {
        CloneOptions::new(&self.url)
            .with_prefix(&self.prefix)
            .with_default_token(self.default_token.clone())
            .with_crawl(crawl)
    }
}
