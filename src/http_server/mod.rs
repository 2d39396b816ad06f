//! # HTTP Server
//!
//! Exposes the API handler over HTTP.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /epidata/:source` - Query a source
//! - `GET /api.php?source=...` - Legacy form of the same

pub mod config;
pub mod routes;
pub mod server;

pub use config::HttpServerConfig;
pub use routes::{epidata_routes, health_routes};
pub use server::HttpServer;
