//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router with proxy, health and introspection routes
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Route each `/proxy/` request and forward it upstream
//! - Record request and rejection metrics

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Path, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::admin_router;
use crate::config::ProxyConfig;
use crate::http::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::request::{self, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::Components;
use crate::observability::metrics;
use crate::routing::{RequestRouter, RouteError};
use crate::schema::SchemaCache;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RequestRouter>,
    pub cache: Option<Arc<SchemaCache>>,
    pub forwarder: Arc<Forwarder>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server over the components produced by startup.
    pub fn new(components: &Components) -> Result<Self, ProxyError> {
        let state = AppState {
            router: Arc::clone(&components.router),
            cache: components.cache.clone(),
            forwarder: Arc::new(Forwarder::new(&components.config.upstream)?),
        };
        Ok(Self::with_state(&components.config, state))
    }

    pub fn with_state(config: &ProxyConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .map_response(|res: Response<_>| res.map(Body::new))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size));

        Router::new()
            .route("/proxy/{*path}", any(proxy_handler))
            .route("/health", get(health_handler))
            .merge(admin_router())
            .with_state(state)
            .layer(middleware)
    }

    /// The assembled router, for serving on a custom listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Main proxy handler.
/// Routes the logical path, then forwards to the data API.
async fn proxy_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request::request_id(request.headers());
    let method = request.method().clone();

    let routed = match state.router.route(&method, &path) {
        Ok(routed) => routed,
        Err(e) => {
            let mode = state.router.mode();
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                mode = mode.as_str(),
                error = %e,
                "Request rejected"
            );
            let reason = match &e {
                RouteError::Rejected(v) => v.code(),
                RouteError::UnresolvedLegacyAlias { .. } => "UNKNOWN_LINK_FIELD",
            };
            metrics::record_rejection(reason);
            metrics::record_request(mode.as_str(), "rejected", start);
            return ProxyError::from(e).into_response();
        }
    };

    let mode = routed.mode.as_str();
    let target = match state.forwarder.target_url(
        &routed.upstream_path,
        routed.base_id.as_deref(),
        request.uri().query(),
    ) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Could not build upstream URL");
            metrics::record_request(mode, "invalid", start);
            return e.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        target = %target,
        mode,
        "Forwarding request"
    );

    match state.forwarder.forward(request, &target).await {
        Ok(response) => {
            metrics::record_request(mode, "forwarded", start);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, target = %target, error = %e, "Upstream error");
            metrics::record_request(mode, "upstream_error", start);
            e.into_response()
        }
    }
}
