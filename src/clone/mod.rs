//! Clone routers
//!
//! Mirrors a remote ArcGIS Services Directory as local routes: one discovery
//! route set per clone plus one route per discovered feature layer.

pub mod builder;
pub mod relativize;
pub mod route;
mod router;

pub use builder::{build_clone_router, CloneOptions, CloneTable, DEFAULT_PREFIX};
pub use relativize::{join_remote, normalize_prefix, relativize, trim_path};
pub use route::{LayerFetchError, LayerRoute, RelativizationError, DISCOVERY_PATHS};
