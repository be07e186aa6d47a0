use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use spanrelay_batch::{DispatchConfig, Dispatcher};
use spanrelay_core::jaeger::model as jaeger;
use spanrelay_core::model::{source_format, SpanId, TraceId};
use spanrelay_core::{Batch, Consumer, ExportContext, Node, Observability, Span, TraceBatch};
use spanrelay_exporter::{
    Exporter, ExporterError, ForwardExporter, HttpJaegerClient, JaegerClient, JaegerExporter,
    Push, SinkExporter,
};
use spanrelay_receiver::{Pipelines, StreamReceiver, StreamReceiverConfig};
use tokio_util::sync::CancellationToken;

fn span(n: u8) -> Span {
    Span::new(
        TraceId::from_bytes([n; 16]),
        SpanId::from_bytes([n; 8]),
        format!("op-{}", n),
    )
}

fn batch(service: &str, spans: Vec<Span>) -> TraceBatch {
    Batch::new(source_format::OC_TRACE)
        .with_node(Node::for_service(service))
        .with_items(spans)
}

#[tokio::test]
async fn test_forward_exporter_relays_to_downstream_receiver() {
    // Downstream relay collecting into a sink.
    let observability = Observability::new();
    let sink = Arc::new(SinkExporter::<Span>::new());
    let downstream: Arc<dyn Consumer<Span>> =
        Arc::new(Exporter::new("sink", sink.clone(), observability.clone()).unwrap());
    let dispatcher = Dispatcher::new(
        "traces",
        DispatchConfig::default(),
        downstream,
        observability.clone(),
    );
    let receiver = StreamReceiver::bind(
        StreamReceiverConfig {
            name: "downstream".to_string(),
            address: "127.0.0.1:0".to_string(),
            ..Default::default()
        },
        Pipelines {
            traces: Some(dispatcher.handle()),
            metrics: None,
        },
        observability.clone(),
    )
    .await
    .unwrap();
    let addr = receiver.local_addr();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(receiver.run(cancel.clone()));

    let forward = ForwardExporter::<Span>::new(addr.to_string(), Duration::from_secs(5));
    let ctx = ExportContext::detached("oc");
    assert_eq!(forward.push(&ctx, &batch("a", vec![span(1), span(2)])).await.unwrap(), 0);
    assert_eq!(forward.push(&ctx, &batch("b", vec![span(3)])).await.unwrap(), 0);
    forward.close().await.unwrap();

    cancel.cancel();
    server.await.unwrap().unwrap();
    dispatcher.shutdown().await;

    let batches = sink.batches();
    let total: usize = batches.iter().map(Batch::len).sum();
    assert_eq!(total, 3);
    assert!(batches
        .iter()
        .any(|b| b.node == Some(Node::for_service("b")) && b.len() == 1));
    assert_eq!(observability.receiver_stats("downstream").received, 3);
}

#[tokio::test]
async fn test_forward_exporter_fails_without_peer() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let forward = ForwardExporter::<Span>::new(addr.to_string(), Duration::from_secs(1));
    let err = forward
        .push(&ExportContext::detached("oc"), &batch("a", vec![span(1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ExporterError::Stream(_)));
}

#[derive(Clone, Default)]
struct Collected {
    batches: Arc<Mutex<Vec<jaeger::Batch>>>,
}

#[async_trait]
impl JaegerClient for Collected {
    async fn upload(&self, batch: &jaeger::Batch) -> Result<(), ExporterError> {
        self.batches.lock().push(batch.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_jaeger_exporter_counts_untranslatable_spans() {
    let collected = Collected::default();
    let observability = Observability::new();
    let exporter = Exporter::new(
        "jaeger",
        JaegerExporter::new(collected.clone()),
        observability.clone(),
    )
    .unwrap();

    let zero = Span::new(TraceId::default(), SpanId::from_bytes([9; 8]), "bad");
    exporter
        .consume(
            &ExportContext::detached("oc"),
            &batch("api", vec![span(1), zero, span(2)]),
        )
        .await
        .unwrap();

    let uploaded = collected.batches.lock().clone();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].spans.len(), 2);
    assert_eq!(uploaded[0].process.service_name, "api");

    let stats = observability.exporter_stats("oc", "jaeger");
    assert_eq!(stats.received, 2);
    assert_eq!(stats.dropped, 1);
}

#[tokio::test]
async fn test_http_jaeger_client_posts_json() {
    type Bodies = Arc<Mutex<Vec<serde_json::Value>>>;
    let bodies: Bodies = Arc::default();
    let app = Router::new()
        .route(
            "/api/traces",
            post(
                |State(bodies): State<Bodies>, Json(body): Json<serde_json::Value>| async move {
                    bodies.lock().push(body);
                    StatusCode::ACCEPTED
                },
            ),
        )
        .route("/reject", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .with_state(bodies.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = HttpJaegerClient::new(
        format!("http://{}/api/traces", addr),
        Duration::from_secs(5),
        &HashMap::new(),
    )
    .unwrap();
    let exporter = JaegerExporter::new(client);
    let dropped = exporter
        .push(&ExportContext::detached("oc"), &batch("web", vec![span(4)]))
        .await
        .unwrap();
    assert_eq!(dropped, 0);

    let bodies = bodies.lock().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["process"]["serviceName"], "web");
    assert_eq!(bodies[0]["spans"][0]["operationName"], "op-4");

    let rejecting = HttpJaegerClient::new(
        format!("http://{}/reject", addr),
        Duration::from_secs(5),
        &HashMap::new(),
    )
    .unwrap();
    let err = rejecting.upload(&jaeger::Batch::default()).await.unwrap_err();
    assert!(matches!(err, ExporterError::Rejected { status: 503, .. }));
}
