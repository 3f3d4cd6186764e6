//! HTTP API Server Module
//!
//! REST surface over the ArcGIS client: directory crawls, single listings,
//! layer fetches, and the mounted clone routers.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::{create_router, RESERVED_PREFIXES};
pub use server::HttpServer;
