// HTTP/JSON gateway
//
// Each request body is treated as a stream of exactly one message, so it
// must carry a node. Accepted batches go through the same drivers and
// dispatchers as the TCP receiver.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use metrics::counter;
use serde_json::json;
use spanrelay_batch::DispatchHandle;
use spanrelay_core::jaeger::{self, jaeger_to_trace_batch};
use spanrelay_core::model::{source_format, ExportMessage};
use spanrelay_core::{Metric, Observability, Span, Translated};
use spanrelay_receiver::{
    ExportSession, ReceiverError, Signal, StatusCode as StreamCode, StreamDriver,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error, info_span, warn};

/// Receiver name for counters of data arriving over HTTP.
pub const HTTP_RECEIVER: &str = "http";

/// Application state shared across all requests
#[derive(Clone, Default)]
pub(crate) struct AppState {
    pub traces: Option<StreamDriver<Span>>,
    pub metrics: Option<StreamDriver<Metric>>,
}

/// Error type that implements IntoResponse
pub(crate) struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request error: {:?}", self.error);
        } else {
            debug!("Request rejected: {}", self.error);
        }
        (
            self.status,
            Json(json!({
                "error": self.error.to_string(),
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(error: anyhow::Error) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, error)
    }

    fn receiver(error: ReceiverError) -> Self {
        let status = match error.status_code() {
            StreamCode::ProtocolViolation | StreamCode::InvalidArgument => StatusCode::BAD_REQUEST,
            StreamCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            StreamCode::Ok | StreamCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::with_status(status, error.into())
    }
}

/// Build the gateway router.
pub(crate) fn router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    let router = Router::new()
        .route("/v1/trace", post(handle_trace))
        .route("/v1/metrics", post(handle_metrics))
        .route("/api/traces", post(handle_jaeger))
        .route("/health", get(health_check))
        .with_state(state);

    match cors_layer(cors_allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let allow = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };
    Some(
        CorsLayer::new()
            .allow_origin(allow)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
    )
}

/// GET /health - Basic health check
pub(crate) async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "traces": state.traces.is_some(),
            "metrics": state.metrics.is_some(),
        })),
    )
}

/// POST /v1/trace - JSON span export
pub(crate) async fn handle_trace(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let message: ExportMessage<Span> = parse_json(&body, "span export")?;
    ingest(
        state.traces.as_ref(),
        Translated::ok(message),
        source_format::HTTP_JSON,
        "/v1/trace",
    )
    .await
}

/// POST /v1/metrics - JSON metrics export
pub(crate) async fn handle_metrics(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let message: ExportMessage<Metric> = parse_json(&body, "metrics export")?;
    ingest(
        state.metrics.as_ref(),
        Translated::ok(message),
        source_format::HTTP_JSON,
        "/v1/metrics",
    )
    .await
}

/// POST /api/traces - Jaeger JSON batch
pub(crate) async fn handle_jaeger(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let batch: jaeger::model::Batch = parse_json(&body, "Jaeger batch")?;
    let translated = jaeger_to_trace_batch(&batch).map(|b| ExportMessage {
        node: b.node,
        resource: b.resource,
        items: b.items,
    });
    ingest(state.traces.as_ref(), translated, source_format::JAEGER, "/api/traces").await
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8], what: &str) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        AppError::bad_request(anyhow::anyhow!("Failed to parse {}: {}", what, e))
    })
}

async fn ingest<T: Signal>(
    driver: Option<&StreamDriver<T>>,
    translated: Translated<ExportMessage<T>>,
    source_format: &'static str,
    route: &'static str,
) -> Result<Response, AppError> {
    counter!("spanrelay.http.requests", 1, "route" => route);

    let driver = driver.ok_or_else(|| {
        AppError::receiver(ReceiverError::InvalidArgument(format!(
            "{} reception is disabled",
            T::NAME
        )))
    })?;

    let dropped = translated.dropped();
    let items = translated.value.items.len();
    let span = info_span!("http_export", receiver = %driver.receiver_name(), route);
    let mut session = ExportSession::new(source_format);
    driver
        .ingest(&mut session, translated, &span)
        .await
        .map_err(AppError::receiver)?;
    session.finish();

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "accepted": items,
            "dropped": dropped,
        })),
    )
        .into_response())
}

/// Counts land under "http" and "http_metrics".
pub(crate) fn state_from(
    traces: Option<DispatchHandle<Span>>,
    metrics: Option<DispatchHandle<Metric>>,
    observability: &Arc<Observability>,
) -> AppState {
    AppState {
        traces: traces.map(|h| StreamDriver::new(HTTP_RECEIVER, h, observability.clone())),
        metrics: metrics.map(|h| {
            StreamDriver::new(format!("{}_metrics", HTTP_RECEIVER), h, observability.clone())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use spanrelay_batch::{DispatchConfig, Dispatcher};
    use spanrelay_core::Consumer;
    use spanrelay_exporter::{Exporter, SinkExporter};
    use tower::ServiceExt;

    struct Fixture {
        app: Router,
        sink: Arc<SinkExporter<Span>>,
        dispatcher: Dispatcher<Span>,
        observability: Arc<Observability>,
    }

    fn fixture() -> Fixture {
        let observability = Observability::new();
        let sink = Arc::new(SinkExporter::<Span>::new());
        let consumer: Arc<dyn Consumer<Span>> =
            Arc::new(Exporter::new("sink", sink.clone(), observability.clone()).unwrap());
        let dispatcher = Dispatcher::new(
            "traces",
            DispatchConfig::default(),
            consumer,
            observability.clone(),
        );
        let state = state_from(Some(dispatcher.handle()), None, &observability);
        Fixture {
            app: router(state, &["https://ui.example.com".to_string()]),
            sink,
            dispatcher,
            observability,
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const TRACE_ID: &str = "0102030405060708090a0b0c0d0e0f10";

    #[tokio::test]
    async fn test_health() {
        let f = fixture();
        let response = f
            .app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_trace_export_is_dispatched() {
        let f = fixture();
        let body = json!({
            "node": {"service_info": {"name": "web"}},
            "spans": [
                {"trace_id": TRACE_ID, "span_id": "0102030405060708", "name": "GET /"},
            ],
        });
        let response = f.app.oneshot(post_json("/v1/trace", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        f.dispatcher.shutdown().await;
        let batches = f.sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].source_format, source_format::HTTP_JSON);
        assert_eq!(batches[0].node.as_ref().and_then(|n| n.service_name()), Some("web"));
        assert_eq!(f.observability.receiver_stats(HTTP_RECEIVER).received, 1);
    }

    #[tokio::test]
    async fn test_request_without_node_is_rejected() {
        let f = fixture();
        let body = json!({
            "spans": [{"trace_id": TRACE_ID, "span_id": "0102030405060708"}],
        });
        let response = f.app.oneshot(post_json("/v1/trace", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        f.dispatcher.shutdown().await;
        assert_eq!(f.sink.item_count(), 0);
        assert_eq!(f.observability.receiver_stats(HTTP_RECEIVER).dropped, 1);
    }

    #[tokio::test]
    async fn test_malformed_body_and_disabled_signal() {
        let f = fixture();
        let bad = Request::builder()
            .method("POST")
            .uri("/v1/trace")
            .body(Body::from("{not json"))
            .unwrap();
        let response = f.app.clone().oneshot(bad).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let metrics = json!({"node": {"service_info": {"name": "m"}}, "metrics": []});
        let response = f.app.oneshot(post_json("/v1/metrics", metrics)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        f.dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_jaeger_batch_is_translated() {
        let f = fixture();
        let body = json!({
            "process": {"serviceName": "billing", "tags": []},
            "spans": [{
                "traceId": TRACE_ID,
                "spanId": "0000000000000007",
                "operationName": "charge",
                "startTime": "2018-10-31T19:43:35.000000789Z",
                "duration": 1500,
            }],
        });
        let response = f.app.oneshot(post_json("/api/traces", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        f.dispatcher.shutdown().await;
        let items = f.sink.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "charge");
        let batches = f.sink.batches();
        assert_eq!(batches[0].source_format, source_format::JAEGER);
        assert_eq!(batches[0].node.as_ref().and_then(|n| n.service_name()), Some("billing"));
    }

    #[tokio::test]
    async fn test_stopped_pipeline_returns_unavailable() {
        let f = fixture();
        f.dispatcher.stop().await;
        let body = json!({
            "node": {"service_info": {"name": "web"}},
            "spans": [{"trace_id": TRACE_ID, "span_id": "0102030405060708"}],
        });
        let response = f.app.oneshot(post_json("/v1/trace", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
