// Per-signal pipelines: exporters -> fan-out -> optional buffer -> dispatcher
//
// The exporter set is an explicit registration list built from config,
// plus whatever consumers the embedder passes in.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use spanrelay_batch::{BufferConfig, BufferedConsumer, DispatchConfig, DispatchHandle, Dispatcher};
use spanrelay_config::{ExportersConfig, ReceiverConfig};
use spanrelay_core::{Consumer, FanOut, Metric, Observability, Span};
use spanrelay_exporter::{
    Exporter, ForwardExporter, HttpJaegerClient, JaegerExporter, LoggingExporter, Push,
};
use spanrelay_receiver::Signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Consumers registered for each signal in addition to the configured
/// exporters.
#[derive(Default)]
pub struct Registrations {
    pub spans: Vec<Arc<dyn Consumer<Span>>>,
    pub metrics: Vec<Arc<dyn Consumer<Metric>>>,
}

/// Exporters built for one signal.
pub(crate) struct ExporterSet<T: Send + Sync + 'static> {
    consumers: Vec<Arc<dyn Consumer<T>>>,
    forward: Option<Arc<ForwardExporter<T>>>,
}

fn common_exporters<T>(
    config: &ExportersConfig,
    observability: &Arc<Observability>,
) -> Result<ExporterSet<T>>
where
    T: Signal,
    LoggingExporter: Push<T>,
{
    let mut consumers: Vec<Arc<dyn Consumer<T>>> = Vec::new();

    if let Some(logging) = config.logging.as_ref() {
        let exporter = Exporter::new(
            "logging",
            LoggingExporter::new(logging.verbose),
            observability.clone(),
        )?;
        consumers.push(Arc::new(exporter));
    }

    let mut forward = None;
    if let Some(cfg) = config.forward.as_ref() {
        let push = Arc::new(ForwardExporter::<T>::new(
            cfg.address.as_str(),
            cfg.connect_timeout(),
        ));
        let exporter = Exporter::new("forward", push.clone(), observability.clone())?
            .with_push_spans(true);
        consumers.push(Arc::new(exporter));
        forward = Some(push);
    }

    Ok(ExporterSet { consumers, forward })
}

pub(crate) fn span_exporters(
    config: &ExportersConfig,
    observability: &Arc<Observability>,
) -> Result<ExporterSet<Span>> {
    let mut set = common_exporters::<Span>(config, observability)?;

    if let Some(jaeger) = config.jaeger.as_ref() {
        let client = HttpJaegerClient::new(
            jaeger.collector_endpoint.as_str(),
            Duration::from_secs(jaeger.timeout_secs),
            &jaeger.headers,
        )
        .with_context(|| format!("Failed to create Jaeger client for {}", jaeger.collector_endpoint))?;
        let exporter = Exporter::new("jaeger", JaegerExporter::new(client), observability.clone())?
            .with_push_spans(true);
        set.consumers.push(Arc::new(exporter));
    }

    Ok(set)
}

pub(crate) fn metric_exporters(
    config: &ExportersConfig,
    observability: &Arc<Observability>,
) -> Result<ExporterSet<Metric>> {
    common_exporters::<Metric>(config, observability)
}

/// Everything that runs behind the receivers for one signal.
pub(crate) struct SignalPipeline<T: Signal> {
    dispatcher: Dispatcher<T>,
    flusher: Option<(CancellationToken, JoinHandle<()>)>,
    forward: Option<Arc<ForwardExporter<T>>>,
}

impl<T: Signal> SignalPipeline<T> {
    /// Build the pipeline. Must be called from within a tokio runtime.
    pub(crate) fn start(
        mut exporters: ExporterSet<T>,
        extra: Vec<Arc<dyn Consumer<T>>>,
        config: &ReceiverConfig,
        observability: &Arc<Observability>,
    ) -> Self {
        exporters.consumers.extend(extra);
        let fanout = FanOut::new(exporters.consumers);
        info!(signal = T::NAME, exporters = fanout.len(), "Pipeline exporters registered");
        let fanout: Arc<dyn Consumer<T>> = Arc::new(fanout);

        let (head, flusher) = if config.buffering_enabled() {
            let buffer = Arc::new(BufferedConsumer::new(
                BufferConfig {
                    period: config.buffer_period(),
                    max_items: config.buffer_max_items,
                },
                fanout,
                observability.clone(),
            ));
            let cancel = CancellationToken::new();
            let task = buffer.clone().spawn_flusher(cancel.clone());
            let head: Arc<dyn Consumer<T>> = buffer;
            (head, Some((cancel, task)))
        } else {
            (fanout, None)
        };

        let dispatcher = Dispatcher::new(
            T::NAME,
            DispatchConfig {
                workers: config.workers,
                queue_capacity: config.queue_size,
            },
            head,
            observability.clone(),
        );

        Self {
            dispatcher,
            flusher,
            forward: exporters.forward,
        }
    }

    pub(crate) fn handle(&self) -> DispatchHandle<T> {
        self.dispatcher.handle()
    }

    /// Drain the queue, flush held-back groups, then end any forwarding
    /// stream.
    pub(crate) async fn shutdown(self) {
        self.dispatcher.shutdown().await;

        if let Some((cancel, task)) = self.flusher {
            cancel.cancel();
            if let Err(e) = task.await {
                warn!(signal = T::NAME, error = %e, "Buffer flusher task failed");
            }
        }

        if let Some(forward) = self.forward {
            if let Err(e) = forward.close().await {
                warn!(signal = T::NAME, address = %forward.address(), error = %e, "Forwarding stream closed with error");
            }
        }
    }
}
