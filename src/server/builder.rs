//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use crate::core::service::OrderService;
use crate::core::store::OrderStore;
use anyhow::Result;
use axum::Router;
use axum::http::{HeaderName, Request};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builder for creating the order HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryOrderStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn OrderStore>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            store: None,
            custom_routes: Vec::new(),
        }
    }

    /// Set the order store (required)
    pub fn with_store(mut self, store: impl OrderStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Add custom routes to the server
    ///
    /// # Example
    ///
    /// ```ignore
    /// let admin_routes = Router::new().route("/admin/ping", get(ping));
    ///
    /// ServerBuilder::new()
    ///     .with_store(store)
    ///     .with_custom_routes(admin_routes)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the final REST router
    ///
    /// Every request gets an `x-request-id` (generated when absent, echoed on
    /// the response) and a tracing span carrying it.
    pub fn build(self) -> Result<Router> {
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("OrderStore is required. Call .with_store()"))?;

        tracing::debug!(backend = store.backend(), "building order router");
        let service = OrderService::new(store);
        let app = RestExposure::build_router(service, self.custom_routes);

        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                    let id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default();
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(request_id));

        Ok(app.layer(layers))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
