//! # HTTP Server
//!
//! Combines the health and epidata routers behind CORS and request tracing.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::ApiHandler;

use super::config::HttpServerConfig;
use super::routes::{epidata_routes, health_routes};

/// HTTP server for the epidata API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, handler: ApiHandler) -> Self {
        let router = Self::build_router(&config, Arc::new(handler));
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, handler: Arc<ApiHandler>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new().allow_origin(Any).allow_methods(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
        };

        Router::new()
            .merge(health_routes(handler.clone()))
            .merge(epidata_routes(handler))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds and serves until the process is stopped.
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "epidata server listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
