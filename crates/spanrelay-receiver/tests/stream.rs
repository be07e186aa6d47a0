use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use spanrelay_batch::{DispatchConfig, Dispatcher};
use spanrelay_core::model::{MetricDescriptor, MetricType, Point, PointValue, SpanId, TimeSeries, TraceId};
use spanrelay_core::{
    Batch, Consumer, ConsumerError, ExportContext, Metric, Node, Observability, Span,
};
use spanrelay_receiver::{
    ClientError, ExportClient, Pipelines, StatusCode, StreamReceiver, StreamReceiverConfig,
    MISSING_NODE_MESSAGE,
};
use tokio_util::sync::CancellationToken;

/// Items seen per service name.
#[derive(Default)]
struct PerService {
    counts: Mutex<BTreeMap<String, usize>>,
}

#[async_trait]
impl<T: Send + Sync + 'static> Consumer<T> for PerService {
    async fn consume(&self, _: &ExportContext, batch: &Batch<T>) -> Result<(), ConsumerError> {
        let service = batch
            .node
            .as_ref()
            .and_then(|n| n.service_name())
            .unwrap_or("<none>")
            .to_string();
        *self.counts.lock().entry(service).or_default() += batch.len();
        Ok(())
    }
}

fn span(n: u8) -> Span {
    Span::new(
        TraceId::from_bytes([n; 16]),
        SpanId::from_bytes([n; 8]),
        format!("span-{}", n),
    )
}

fn gauge(name: &str) -> Metric {
    Metric {
        descriptor: MetricDescriptor {
            name: name.to_string(),
            metric_type: MetricType::GaugeInt64,
            ..Default::default()
        },
        timeseries: vec![TimeSeries {
            points: vec![Point {
                timestamp: None,
                value: PointValue::Int64(7),
            }],
            ..Default::default()
        }],
        resource: None,
    }
}

struct Harness {
    addr: std::net::SocketAddr,
    cancel: CancellationToken,
    server: tokio::task::JoinHandle<()>,
    traces: Option<Dispatcher<Span>>,
    metrics: Option<Dispatcher<Metric>>,
    sink: Arc<PerService>,
    observability: Arc<Observability>,
}

impl Harness {
    async fn start(traces: bool, metrics: bool) -> Self {
        let observability = Observability::new();
        let sink = Arc::new(PerService::default());
        let config = DispatchConfig {
            workers: 2,
            queue_capacity: 8,
        };
        let traces = traces.then(|| {
            Dispatcher::<Span>::new("traces", config, sink.clone(), observability.clone())
        });
        let metrics = metrics.then(|| {
            Dispatcher::<Metric>::new("metrics", config, sink.clone(), observability.clone())
        });

        let receiver = StreamReceiver::bind(
            StreamReceiverConfig {
                address: "127.0.0.1:0".to_string(),
                ..Default::default()
            },
            Pipelines {
                traces: traces.as_ref().map(|d| d.handle()),
                metrics: metrics.as_ref().map(|d| d.handle()),
            },
            observability.clone(),
        )
        .await
        .unwrap();
        let addr = receiver.local_addr();
        let cancel = CancellationToken::new();
        let server = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                receiver.run(cancel).await.unwrap();
            }
        });

        Self {
            addr,
            cancel,
            server,
            traces,
            metrics,
            sink,
            observability,
        }
    }

    async fn finish(self) -> (BTreeMap<String, usize>, Arc<Observability>) {
        self.cancel.cancel();
        self.server.await.unwrap();
        if let Some(d) = &self.traces {
            d.shutdown().await;
        }
        if let Some(d) = &self.metrics {
            d.shutdown().await;
        }
        let counts = self.sink.counts.lock().clone();
        (counts, self.observability)
    }
}

#[tokio::test]
async fn test_first_message_without_node_is_a_protocol_violation() {
    let harness = Harness::start(true, false).await;
    let mut client = ExportClient::connect(harness.addr).await.unwrap();

    client
        .export(None, None, vec![span(1), span(2)])
        .await
        .unwrap();

    for _ in 0..2 {
        match client.recv().await {
            Err(ClientError::Status { code, message }) => {
                assert_eq!(code, StatusCode::ProtocolViolation);
                assert_eq!(message, MISSING_NODE_MESSAGE);
            }
            other => panic!("expected protocol violation, got {:?}", other),
        }
    }
    let err = client.recv().await.unwrap_err();
    assert!(err.to_string().contains("protocol violation"));

    let err = client
        .export(Some(Node::for_service("late")), None, vec![span(3)])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::EndOfStream));

    let (counts, observability) = harness.finish().await;
    assert!(counts.is_empty());
    let stats = observability.receiver_stats("oc");
    assert_eq!(stats.received, 0);
    assert_eq!(stats.dropped, 2);
}

#[tokio::test]
async fn test_node_is_multiplexed_across_messages() {
    let harness = Harness::start(true, false).await;
    let mut client = ExportClient::connect(harness.addr).await.unwrap();

    client
        .export::<Span>(Some(Node::for_service("A")), None, vec![])
        .await
        .unwrap();
    client.export(None, None, vec![span(1)]).await.unwrap();
    client
        .export(Some(Node::for_service("B")), None, vec![span(2)])
        .await
        .unwrap();
    client.export(None, None, vec![span(3)]).await.unwrap();

    let status = client.close().await.unwrap();
    assert_eq!(status.code, StatusCode::Ok as i32);

    let (counts, observability) = harness.finish().await;
    assert_eq!(counts.get("A"), Some(&1));
    assert_eq!(counts.get("B"), Some(&2));
    assert_eq!(observability.receiver_stats("oc").received, 3);
}

#[tokio::test]
async fn test_untranslatable_items_are_dropped_individually() {
    let harness = Harness::start(true, false).await;
    let mut client = ExportClient::connect(harness.addr).await.unwrap();

    let zero = Span::new(TraceId::default(), SpanId::from_bytes([1; 8]), "zero-trace");
    client
        .export(Some(Node::for_service("svc")), None, vec![span(1), zero, span(2)])
        .await
        .unwrap();
    client.close().await.unwrap();

    let (counts, observability) = harness.finish().await;
    assert_eq!(counts.get("svc"), Some(&2));
    let stats = observability.receiver_stats("oc");
    assert_eq!(stats.received, 2);
    assert_eq!(stats.dropped, 1);
}

#[tokio::test]
async fn test_metrics_stream_and_disabled_signal() {
    let harness = Harness::start(false, true).await;

    let mut metrics = ExportClient::connect(harness.addr).await.unwrap();
    metrics
        .export(Some(Node::for_service("m")), None, vec![gauge("a"), gauge("b")])
        .await
        .unwrap();
    metrics.close().await.unwrap();

    let mut traces = ExportClient::connect(harness.addr).await.unwrap();
    traces
        .export(Some(Node::for_service("t")), None, vec![span(1)])
        .await
        .unwrap();
    match traces.recv().await {
        Err(ClientError::Status { code, message }) => {
            assert_eq!(code, StatusCode::InvalidArgument);
            assert!(message.contains("traces reception is disabled"));
        }
        other => panic!("expected invalid argument, got {:?}", other),
    }

    let (counts, _) = harness.finish().await;
    assert_eq!(counts.get("m"), Some(&2));
    assert_eq!(counts.get("t"), None);
}

#[tokio::test]
async fn test_mixing_signals_is_a_protocol_violation() {
    let harness = Harness::start(true, true).await;
    let mut client = ExportClient::connect(harness.addr).await.unwrap();

    client
        .export(Some(Node::for_service("svc")), None, vec![span(1)])
        .await
        .unwrap();
    client
        .export(None, None, vec![gauge("x")])
        .await
        .unwrap();

    match client.recv().await {
        Err(ClientError::Status { code, message }) => {
            assert_eq!(code, StatusCode::ProtocolViolation);
            assert!(message.contains("metrics frame on a traces stream"));
        }
        other => panic!("expected protocol violation, got {:?}", other),
    }

    let (counts, _) = harness.finish().await;
    assert_eq!(counts.get("svc"), Some(&1));
}
