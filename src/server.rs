// src/server.rs

//! HTTP surface on top of the [`Dispatcher`].
//!
//! Routes are data, not axum routes: the router has a single fallback
//! handler that hands every request to the dispatcher.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::dispatch::{DispatchError, Dispatcher, InboundRequest};
use crate::sink::{AccessRecord, LogRecord, LogSink};

/// Correlation id header, read from requests and echoed on responses.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::RouteNotFound => StatusCode::NOT_FOUND.into_response(),
            DispatchError::Unauthorized => StatusCode::FORBIDDEN.into_response(),
            // Details stay in the server log.
            DispatchError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal Server Error" })),
            )
                .into_response(),
        }
    }
}

/// Build the gateway router around a shared dispatcher.
pub fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .fallback(handle_request)
        .with_state(dispatcher)
}

async fn handle_request(
    State(dispatcher): State<Arc<Dispatcher>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let started_at = Utc::now();
    let clock = Instant::now();

    let request = InboundRequest {
        request_id: request_id(&headers),
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let request_id = request.request_id.clone();
    let access = PendingAccess {
        sink: dispatcher.sink(),
        request_id: request.request_id.clone(),
        method: request.method.clone(),
        path: request.path.clone(),
        started_at,
        clock,
        status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
    };

    // The chain and the response are built on their own task, so a client
    // that goes away mid-chain cannot skip the access record.
    let task = tokio::spawn(async move {
        let response = match dispatcher.dispatch(&request).await {
            Ok(report) => (StatusCode::OK, Json(report)).into_response(),
            Err(err) => err.into_response(),
        };
        access.attach(response).await
    });

    match task.await {
        Ok(response) => response,
        Err(join_err) => {
            // The pending access record was dropped with the task and logged a 500.
            error!(error = %join_err, "request task failed");
            let mut response =
                DispatchError::Internal(anyhow!("request task failed: {join_err}")).into_response();
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        }
    }
}

/// Access record for one request, written exactly once when dropped.
///
/// Until a response is attached the recorded status is 500.
struct PendingAccess {
    sink: Arc<dyn LogSink>,
    request_id: String,
    method: String,
    path: String,
    started_at: DateTime<Utc>,
    clock: Instant,
    status: u16,
}

impl PendingAccess {
    /// Echo the correlation id and move this record into the response body,
    /// so it is written when hyper drops the body: after it is sent, or once
    /// the connection is gone.
    async fn attach(mut self, response: Response) -> Response {
        let (mut parts, body) = response.into_parts();

        if let Ok(value) = HeaderValue::from_str(&self.request_id) {
            parts.headers.insert(REQUEST_ID_HEADER, value);
        }

        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to buffer response body");
                Bytes::new()
            }
        };
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

        self.status = parts.status.as_u16();
        let body = LoggedBody {
            chunk: (!bytes.is_empty()).then_some(bytes),
            _access: self,
        };
        Response::from_parts(parts, Body::from_stream(body))
    }
}

impl Drop for PendingAccess {
    fn drop(&mut self) {
        self.sink.write(LogRecord::Access(AccessRecord {
            request_id: std::mem::take(&mut self.request_id),
            method: std::mem::take(&mut self.method),
            path: std::mem::take(&mut self.path),
            status: self.status,
            started_at: self.started_at,
            elapsed_ms: u64::try_from(self.clock.elapsed().as_millis()).unwrap_or(u64::MAX),
        }));
    }
}

/// Single-chunk response body carrying the pending access record.
struct LoggedBody {
    chunk: Option<Bytes>,
    _access: PendingAccess,
}

impl Stream for LoggedBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.chunk.take().map(Ok))
    }
}

/// Incoming `x-request-id` when usable, otherwise a fresh UUIDv4.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Serve `router` on `listener` until `shutdown` completes.
///
/// In-flight requests are allowed to finish after `shutdown` fires.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("reading listener address")?;
    info!(%addr, "cmdgate listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server exited")?;

    info!("cmdgate stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received; draining connections");
}
