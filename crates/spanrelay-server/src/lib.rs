// Server mode - the relay process
//
// Wires the configured pipelines together:
// - stream receiver on TCP (traces and metrics)
// - optional HTTP/JSON gateway
// - per-signal dispatcher with fan-out to the registered exporters
// - graceful shutdown: stop accepting, drain, flush, report counters

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use spanrelay_config::RuntimeConfig;
use spanrelay_core::{Metric, Observability, Span};
use spanrelay_receiver::{Pipelines, ReceiverError, StreamReceiver, StreamReceiverConfig};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod gateway;
mod init;
mod pipeline;

pub use gateway::HTTP_RECEIVER;
pub use init::init_tracing;
pub use pipeline::Registrations;

use pipeline::{metric_exporters, span_exporters, SignalPipeline};

/// Receiver name of the TCP stream receiver.
pub const STREAM_RECEIVER: &str = "oc";

/// A running relay.
pub struct Relay {
    observability: Arc<Observability>,
    receiver_addr: SocketAddr,
    http_addr: Option<SocketAddr>,
    cancel: CancellationToken,
    receiver_task: JoinHandle<Result<(), ReceiverError>>,
    http_task: Option<JoinHandle<std::io::Result<()>>>,
    traces: Option<SignalPipeline<Span>>,
    metrics: Option<SignalPipeline<Metric>>,
}

impl Relay {
    /// Build the pipelines, bind the listeners and start serving.
    pub async fn start(
        config: &RuntimeConfig,
        registrations: Registrations,
        observability: Arc<Observability>,
    ) -> Result<Self> {
        let receiver = &config.receiver;

        let traces = if receiver.disable_tracing {
            info!("Trace reception disabled");
            None
        } else {
            let exporters = span_exporters(&config.exporters, &observability)?;
            Some(SignalPipeline::start(
                exporters,
                registrations.spans,
                receiver,
                &observability,
            ))
        };
        let metrics = if receiver.disable_metrics {
            info!("Metrics reception disabled");
            None
        } else {
            let exporters = metric_exporters(&config.exporters, &observability)?;
            Some(SignalPipeline::start(
                exporters,
                registrations.metrics,
                receiver,
                &observability,
            ))
        };

        let traces_handle = traces.as_ref().map(SignalPipeline::handle);
        let metrics_handle = metrics.as_ref().map(SignalPipeline::handle);

        let stream_receiver = StreamReceiver::bind(
            StreamReceiverConfig {
                name: STREAM_RECEIVER.to_string(),
                address: receiver.address.clone(),
                ..Default::default()
            },
            Pipelines {
                traces: traces_handle.clone(),
                metrics: metrics_handle.clone(),
            },
            observability.clone(),
        )
        .await
        .with_context(|| format!("Failed to start stream receiver on {}", receiver.address))?;
        let receiver_addr = stream_receiver.local_addr();

        let cancel = CancellationToken::new();
        let receiver_task = tokio::spawn(stream_receiver.run(cancel.clone()));

        let (http_addr, http_task) = match config.server.http_address.as_deref() {
            Some(addr) => {
                let listener = tokio::net::TcpListener::bind(addr)
                    .await
                    .with_context(|| format!("Failed to bind HTTP gateway to {}", addr))?;
                let local = listener.local_addr()?;
                let state = gateway::state_from(traces_handle, metrics_handle, &observability);
                let app = gateway::router(state, &config.server.cors_allowed_origins);
                let shutdown = cancel.clone();
                let task = tokio::spawn(async move {
                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move { shutdown.cancelled().await })
                        .await
                });

                info!("HTTP gateway listening on http://{}", local);
                info!("Routes:");
                info!("  POST http://{}/v1/trace    - JSON span export", local);
                info!("  POST http://{}/v1/metrics  - JSON metrics export", local);
                info!("  POST http://{}/api/traces  - Jaeger JSON batch", local);
                info!("  GET  http://{}/health      - Health check", local);
                (Some(local), Some(task))
            }
            None => (None, None),
        };

        Ok(Self {
            observability,
            receiver_addr,
            http_addr,
            cancel,
            receiver_task,
            http_task,
            traces,
            metrics,
        })
    }

    pub fn receiver_addr(&self) -> SocketAddr {
        self.receiver_addr
    }

    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    pub fn observability(&self) -> Arc<Observability> {
        self.observability.clone()
    }

    /// Stop accepting, drain the dispatchers, flush buffered groups and log
    /// the final counters.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();

        match self.receiver_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Stream receiver stopped with error"),
            Err(e) => error!(error = %e, "Stream receiver task failed"),
        }
        if let Some(task) = self.http_task {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "HTTP gateway stopped with error"),
                Err(e) => error!(error = %e, "HTTP gateway task failed"),
            }
        }

        if let Some(traces) = self.traces {
            traces.shutdown().await;
        }
        if let Some(metrics) = self.metrics {
            metrics.shutdown().await;
        }

        self.observability.log_summary();
        Ok(())
    }
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Entry point for server mode with a resolved configuration.
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    init_tracing(&config.server);
    init::log_startup(&config);

    let observability = Observability::new();
    let relay = Relay::start(&config, Registrations::default(), observability).await?;
    info!(
        address = %relay.receiver_addr(),
        "Relay running. Press Ctrl+C or send SIGTERM to stop"
    );

    shutdown_signal().await;
    relay.shutdown().await?;

    info!("Server shutdown complete");
    Ok(())
}
