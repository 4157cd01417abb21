//! HTTP API Server
//!
//! Public HTTP surface: welcome and health routes behind a middleware stack
//! of request ids, request tracing, panic recovery, security headers,
//! compression and body size limits.

use crate::infrastructure::ShutdownController;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::any::Any;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (JSON or form).
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Welcome response.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub status: String,
    pub version: String,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Error body shared by every failing route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        let message = match &self {
            ApiError::Internal(m) if m.is_empty() => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router with its full middleware stack.
///
/// Layers run top to bottom on the way in: request id, tracing, panic
/// recovery, security headers, compression, body limit.
pub fn router() -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .route("/", get(welcome_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(middleware)
}

/// HTTP server bound to a listening socket.
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// Bind the listening socket.
    pub async fn bind(addr: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve requests until `shutdown` fires, then drain in-flight requests.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn serve(self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let addr = self.listener.local_addr()?;
        tracing::info!("server is running on http://{}", addr);

        axum::serve(self.listener, router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("http server on {} stopped", addr);
        Ok(())
    }
}

// Handler functions

async fn welcome_handler() -> impl IntoResponse {
    Json(WelcomeResponse {
        message: "Welcome to Ricky V1 API".to_string(),
        status: "success".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("handler panicked: {}", detail);

    ApiError::Internal(String::new()).into_response()
}
