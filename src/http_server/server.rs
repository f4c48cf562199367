//! # HTTP Server
//!
//! Combines the realtime and observability routers and serves them.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::observability_routes::{health_routes, observability_routes};
use super::realtime_routes::{realtime_routes, RealtimeState};
use crate::config::ServerConfig;
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::realtime::ChatService;

/// HTTP + WebSocket server
pub struct HttpServer {
    config: ServerConfig,
    service: ChatService,
    router: Router,
}

impl HttpServer {
    /// Create a server with a fresh clock and registry
    pub fn new(config: ServerConfig) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let service = ChatService::new(Arc::clone(&metrics));
        let router = Self::build_router(&config, service.clone(), metrics);
        Self {
            config,
            service,
            router,
        }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &ServerConfig, service: ChatService, metrics: Arc<MetricsRegistry>) -> Router {
        let realtime_state = Arc::new(RealtimeState::new(service));

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .nest("/observability", observability_routes(metrics))
            .nest("/realtime", realtime_routes(realtime_state))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// The service behind the routes
    pub fn service(&self) -> &ChatService {
        &self.service
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind the configured address and serve until ctrl-c
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        info!(event = %Event::Serving, addr = %local, "listening");
        info!("join stream: ws://{}/realtime/ws?channel=<name>&sender=<name>", local);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        log_event(Event::ShutdownComplete);
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until killed
        std::future::pending::<()>().await;
    }
    log_event(Event::ShutdownStart);
}
