//! HTTP listener for evacuation requests.
//!
//! One POST route per [`EvacuationKind`], each taking a protobuf request body
//! and answering `200 OK` with a protobuf response. The evacuation outcome is
//! carried only in the response body, including for bodies that exceed the
//! size limit or cannot be read.

use crate::core::error::EvacuationError;
use crate::evacuation::{EvacuationHandler, EvacuationKind};
use crate::models::ValidationError;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Content type of every evacuation request and response.
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Metrics snapshot route.
pub const METRICS_ROUTE: &str = "/v1/metrics";

/// Build the evacuation router.
pub fn router(handler: Arc<EvacuationHandler>, max_body_bytes: usize) -> Router {
    let mut router: Router<Arc<EvacuationHandler>> = Router::new();
    for kind in EvacuationKind::ALL {
        router = router.route(
            kind.route(),
            post(
                move |State(handler): State<Arc<EvacuationHandler>>, body: Body| async move {
                    handle_evacuation(handler, kind, body, max_body_bytes).await
                },
            ),
        );
    }

    router
        .route(METRICS_ROUTE, get(handle_metrics))
        .with_state(handler)
}

async fn handle_evacuation(
    handler: Arc<EvacuationHandler>,
    kind: EvacuationKind,
    body: Body,
    max_body_bytes: usize,
) -> Response {
    let encoded = match axum::body::to_bytes(body, max_body_bytes).await {
        Ok(body) => {
            // Detached from the connection so a client hang-up cannot skip
            // the escalation check.
            let task = tokio::spawn(async move { handler.dispatch(kind, &body).await });
            match task.await {
                Ok(encoded) => encoded,
                Err(err) => {
                    tracing::error!(session = kind.session(), error = %err, "evacuation task failed");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        }
        Err(err) => {
            tracing::warn!(
                session = kind.session(),
                error = %err,
                max_body_bytes,
                "failed to read request body"
            );
            handler.reject(
                kind,
                &EvacuationError::InvalidRequest(ValidationError::field("body")),
            )
        }
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)],
        encoded,
    )
        .into_response()
}

async fn handle_metrics(State(handler): State<Arc<EvacuationHandler>>) -> Response {
    Json(handler.metrics().snapshot()).into_response()
}

/// Evacuation HTTP server.
pub struct HttpListener {
    handler: Arc<EvacuationHandler>,
    max_body_bytes: usize,
    shutdown_rx: watch::Receiver<bool>,
}

impl HttpListener {
    pub fn new(
        handler: Arc<EvacuationHandler>,
        max_body_bytes: usize,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            handler,
            max_body_bytes,
            shutdown_rx,
        }
    }

    /// Serve on an already bound listener until the shutdown watch flips to
    /// `true`.
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr().context("listener has no local address")?;
        tracing::info!(addr = %local_addr, "evacuation listener started");

        let app = router(self.handler, self.max_body_bytes);
        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await
            .context("evacuation listener failed")?;

        tracing::info!(addr = %local_addr, "evacuation listener stopped");
        Ok(())
    }
}
