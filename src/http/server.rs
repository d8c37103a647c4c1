//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `{api_prefix}/{*path}` forwarding plus admin routes
//! - Wire up middleware (request ID, tracing, timeout)
//! - Resolve tenant and origin per request, forward, sanitize
//! - Swap runtime state on config reload
//! - Serve over plain TCP or rustls

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Router,
};
use futures_util::TryStreamExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::handlers;
use crate::config::{GatewayConfig, TlsConfig};
use crate::http::error::GatewayError;
use crate::http::forward::{ForwardedRequest, ForwardedResponse, Forwarder};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::response::Sanitizer;
use crate::lifecycle::shutdown_signal;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::tenant::{parse_tenant, HostMode, Origin, OriginResolver, TenantId};

/// Errors that prevent the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid tenancy configuration: {0}")]
    Tenancy(String),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything derived from one configuration snapshot.
#[derive(Debug)]
pub struct InnerState {
    pub config: GatewayConfig,
    pub resolver: OriginResolver,
    pub forwarder: Forwarder,
    pub sanitizer: Sanitizer,
}

impl InnerState {
    pub fn build(config: GatewayConfig) -> Result<Self, ServerError> {
        let resolver = OriginResolver::from_config(&config.tenancy).map_err(ServerError::Tenancy)?;
        let forwarder = Forwarder::new(&config.timeouts)?;
        let sanitizer = Sanitizer::new(&config.sanitizer);
        Ok(Self {
            config,
            resolver,
            forwarder,
            sanitizer,
        })
    }

    /// Parse the tenant out of a host with the configured mode.
    pub fn tenant_for(&self, host: &str) -> (HostMode, Option<TenantId>) {
        let mode = HostMode::for_host(self.config.tenancy.mode, host);
        (mode, parse_tenant(host, mode))
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
    /// Fixed at startup: changing the route prefix needs a restart.
    pub api_prefix: Arc<str>,
}

/// HTTP server for the tenant gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given (validated) configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let inner = InnerState::build(config.clone())?;
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(inner)),
            api_prefix: Arc::from(config.listener.api_prefix.as_str()),
        };
        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let forward_methods = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::PATCH)
            .or(MethodFilter::DELETE);
        let api_route = format!("{}/{{*path}}", config.listener.api_prefix);

        // Outer guard only; the forwarder enforces the upstream deadline itself.
        let guard = Duration::from_secs(config.timeouts.connect_secs + config.timeouts.request_secs + 5);

        Router::new()
            .route(&api_route, on(forward_methods, forward_handler))
            .route("/healthz", get(handlers::health))
            .route("/_gateway/tenant", get(handlers::tenant_info))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(guard)),
            )
    }

    /// The router, for serving in-process (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the startup config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        spawn_reload_loop(self.state.clone(), config_updates, shutdown.resubscribe());

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS with the configured certificate until shutdown.
    pub async fn run_tls(
        self,
        tls: &TlsConfig,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let rustls = load_tls_config(tls).await?;
        tracing::info!(address = %addr, "HTTPS server starting");

        spawn_reload_loop(self.state.clone(), config_updates, shutdown.resubscribe());

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown_signal(shutdown).await;
            drain.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Swap in each reloaded configuration until shutdown.
fn spawn_reload_loop(
    state: AppState,
    mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                update = config_updates.recv() => match update {
                    Some(config) => apply_config(&state, config),
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }
    });
}

fn apply_config(state: &AppState, config: GatewayConfig) {
    if config.listener.api_prefix != *state.api_prefix {
        tracing::warn!(
            current = %state.api_prefix,
            requested = %config.listener.api_prefix,
            "api_prefix changes require a restart"
        );
    }
    match InnerState::build(config) {
        Ok(inner) => {
            state.inner.store(Arc::new(inner));
            tracing::info!("Configuration reloaded");
        }
        Err(e) => tracing::error!(error = %e, "Rejected reloaded configuration"),
    }
}

/// Host the caller addressed: the `Host` header, or the URI authority for
/// HTTP/2 requests.
pub(crate) fn inbound_host<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .unwrap_or_default()
}

/// Resolve the tenant, forward, sanitize.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let inner = state.inner.load_full();

    let host = inbound_host(&request).to_string();
    let (mode, tenant) = inner.tenant_for(&host);
    let origin = inner.resolver.resolve(tenant.as_ref());

    let method = request.method().clone();
    let request_id = request_id(request.headers()).to_string();
    let tenant_label = tenant
        .as_ref()
        .map_or(metrics::ROOT_TENANT, TenantId::as_str)
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        host = %host,
        mode = ?mode,
        tenant = %tenant_label,
        origin = %origin,
        "Forwarding request"
    );

    match proxy(&inner, &state.api_prefix, &origin, request).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                status = %response.status,
                "Upstream responded"
            );
            metrics::record_request(method.as_str(), response.status.as_u16(), &tenant_label, start);
            response.into_response()
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                tenant = %tenant_label,
                origin = %origin,
                error = %e,
                "Forwarding failed"
            );
            metrics::record_upstream_error(e.kind());
            metrics::record_request(method.as_str(), e.status().as_u16(), &tenant_label, start);
            e.into_response()
        }
    }
}

async fn proxy(
    inner: &InnerState,
    api_prefix: &str,
    origin: &Origin,
    request: Request<Body>,
) -> Result<ForwardedResponse, GatewayError> {
    let (parts, body) = request.into_parts();

    let path = parts
        .uri
        .path()
        .strip_prefix(api_prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or_default()
        .to_string();

    let body = read_body(&parts.method, &parts.headers, body, inner.config.security.max_body_size).await?;
    let forwarded = ForwardedRequest::build(
        parts.method,
        &parts.headers,
        body,
        origin,
        &path,
        parts.uri.query(),
    )?;

    let mut response = inner.forwarder.send(forwarded, origin).await?;

    let report = inner.sanitizer.sanitize(response.status, &mut response.headers);
    if !report.is_empty() {
        tracing::debug!(
            status = %response.status,
            removed_set_cookies = report.removed_set_cookies,
            removed_content_encoding = report.removed_content_encoding,
            "Sanitized upstream headers"
        );
        metrics::record_sanitized("set-cookie", report.removed_set_cookies);
        metrics::record_sanitized("content-encoding", usize::from(report.removed_content_encoding));
    }
    Ok(response)
}

/// Collect the inbound body for methods that carry one.
async fn read_body(
    method: &Method,
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Bytes, GatewayError> {
    if method == Method::GET || method == Method::HEAD {
        return Ok(Bytes::new());
    }
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(GatewayError::BodyTooLarge { limit });
    }

    // Chunked uploads carry no length, so the limit is enforced while reading.
    let mut stream = body.into_data_stream();
    let mut collected = Vec::with_capacity(declared.unwrap_or(0));
    while let Some(chunk) = stream
        .try_next()
        .await
        .map_err(|e| GatewayError::InboundBody(e.to_string()))?
    {
        if collected.len() + chunk.len() > limit {
            return Err(GatewayError::BodyTooLarge { limit });
        }
        collected.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(collected))
}
