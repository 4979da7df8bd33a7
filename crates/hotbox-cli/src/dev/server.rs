//! HTTP surface: file serving through the caches plus the `/reload` stream.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::dev::dialect::{self, Dialect, JAVASCRIPT};
use crate::dev::gateway::{self, ConvertError};
use crate::dev::{deps, SharedState};
use crate::error::{CliError, Result};

/// Path of the Server-Sent-Events endpoint.
pub const RELOAD_PATH: &str = "/reload";

/// Interval between SSE keep-alive comments.
const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Development server.
pub struct DevServer {
    addr: String,
    state: SharedState,
}

impl DevServer {
    pub fn new(addr: impl Into<String>, state: SharedState) -> Self {
        Self {
            addr: addr.into(),
            state,
        }
    }

    /// Bind the listener. Host names such as `localhost` are resolved here.
    pub async fn bind(&self) -> Result<tokio::net::TcpListener> {
        tokio::net::TcpListener::bind(self.addr.as_str())
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", self.addr, e)))
    }

    /// Serve on `listener` until `shutdown` resolves, then drain open requests.
    pub async fn serve<F>(self, listener: tokio::net::TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }
}

/// Build the axum router with all routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(handle_reload))
        // Everything else is a file under the root
        .fallback(handle_request)
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Stream a `data: <path>` event for every change until the client leaves.
async fn handle_reload(State(state): State<SharedState>) -> Response {
    let Some(mut subscription) = state.bus().subscribe().await else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down").into_response();
    };
    tracing::debug!(id = subscription.id(), "reload client connected");

    // Dropping the stream drops the subscription, which unsubscribes it
    let stream = async_stream::stream! {
        while let Some(path) = subscription.recv().await {
            yield Ok::<_, Infallible>(Event::default().data(&*path));
        }
    };

    (
        [(header::CONNECTION, "keep-alive")],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("ping")),
    )
        .into_response()
}

/// Serve a file through the cache worker for its dialect.
async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let started = Instant::now();

    let Some((path, dialect)) = dialect::resolve(state.root(), uri.path()) else {
        tracing::debug!(uri = %uri, "rejected path outside root");
        return not_found(format!("File not found: {}", uri.path()));
    };

    if dialect == Dialect::Elm {
        deps::spawn_discovery(state.elm_deps(), path.clone(), state.watcher().clone());
    }

    let result = gateway::convert(state.caches().get(dialect), path.clone(), state.request_timeout()).await;

    let response = match result {
        Ok(bytes) => {
            state.watcher().watch(path.clone());
            let mut response = Response::new(Body::from(bytes));
            if let Some(content_type) = dialect.content_type() {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
            }
            response
        }
        Err(ConvertError::Transform(err)) => match err.fallback_module() {
            // Show compiler errors in the page instead of failing the import
            Some(module) => {
                state.watcher().watch(path.clone());
                (
                    [(header::CONTENT_TYPE, JAVASCRIPT)],
                    Body::from(module.to_vec()),
                )
                    .into_response()
            }
            None => {
                if err.is_not_found() {
                    state.watcher().unwatch(path.clone());
                }
                not_found(err.to_string())
            }
        },
        Err(err) => not_found(err.to_string()),
    };

    tracing::info!(
        path = %path.display(),
        status = response.status().as_u16(),
        "served in {}",
        crate::ui::format_duration(started.elapsed())
    );
    response
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, message).into_response()
}
