//! TCP export-stream receiver.
//!
//! # Protocol
//!
//! Each frame is a protobuf message behind a 4-byte big-endian length prefix:
//! ```text
//! [4 bytes: length (big-endian)][N bytes: message]
//! ```
//!
//! The client writes `ClientFrame`s. The first frame decides the signal of
//! the connection; a later frame of the other signal is a protocol
//! violation. The server writes nothing until the stream ends, then a single
//! `StreamStatus` frame, then closes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::{stream, SinkExt, StreamExt};
use prost::Message;
use spanrelay_batch::DispatchHandle;
use spanrelay_core::{Metric, Observability, Span};
use spanrelay_proto::spanrelay::stream::v1::client_frame::Payload;
use spanrelay_proto::spanrelay::stream::v1::{ClientFrame, StatusCode, StreamStatus};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::driver::StreamDriver;
use crate::error::{ok_status, ReceiverError};
use crate::signal::{payload_name, Signal};

/// Maximum frame size (16MB)
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub(crate) fn frame_codec(max_frame_len: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(max_frame_len)
        .new_codec()
}

#[derive(Debug, Clone)]
pub struct StreamReceiverConfig {
    /// Receiver name used for counters and log fields
    pub name: String,
    /// Bind address (e.g. "0.0.0.0:55678")
    pub address: String,
    pub max_frame_len: usize,
}

impl Default for StreamReceiverConfig {
    fn default() -> Self {
        Self {
            name: "oc".to_string(),
            address: "0.0.0.0:55678".to_string(),
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

/// Where each signal goes once received. `None` rejects the signal.
#[derive(Clone, Default)]
pub struct Pipelines {
    pub traces: Option<DispatchHandle<Span>>,
    pub metrics: Option<DispatchHandle<Metric>>,
}

#[derive(Debug, Default)]
pub struct StreamReceiverMetrics {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub frames_received: AtomicU64,
    pub streams_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamReceiverMetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub frames_received: u64,
    pub streams_failed: u64,
}

impl StreamReceiverMetrics {
    pub fn snapshot(&self) -> StreamReceiverMetricsSnapshot {
        StreamReceiverMetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            streams_failed: self.streams_failed.load(Ordering::Relaxed),
        }
    }
}

/// A bound listener serving export streams.
pub struct StreamReceiver {
    config: StreamReceiverConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    traces: Option<StreamDriver<Span>>,
    metrics_driver: Option<StreamDriver<Metric>>,
    metrics: Arc<StreamReceiverMetrics>,
}

type FrameReader = FramedRead<OwnedReadHalf, LengthDelimitedCodec>;

impl StreamReceiver {
    pub async fn bind(
        config: StreamReceiverConfig,
        pipelines: Pipelines,
        observability: Arc<Observability>,
    ) -> Result<Self, ReceiverError> {
        let listener =
            TcpListener::bind(&config.address)
                .await
                .map_err(|source| ReceiverError::Bind {
                    address: config.address.clone(),
                    source,
                })?;
        let local_addr = listener.local_addr()?;

        let traces = pipelines
            .traces
            .map(|h| StreamDriver::new(config.name.as_str(), h, observability.clone()));
        // Metric counters are kept apart from span counters, e.g. "oc_metrics".
        let metrics_driver = pipelines.metrics.map(|h| {
            StreamDriver::new(format!("{}_metrics", config.name), h, observability.clone())
        });

        Ok(Self {
            config,
            listener,
            local_addr,
            traces,
            metrics_driver,
            metrics: Arc::new(StreamReceiverMetrics::default()),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics(&self) -> Arc<StreamReceiverMetrics> {
        self.metrics.clone()
    }

    /// Accept connections until `cancel` fires, then wait for the open
    /// streams to wind down.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ReceiverError> {
        info!(
            receiver = %self.config.name,
            address = %self.local_addr,
            traces = self.traces.is_some(),
            metrics = self.metrics_driver.is_some(),
            "Stream receiver listening"
        );

        let tracker = TaskTracker::new();
        let this = Arc::new(self);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = this.listener.accept() => match result {
                    Ok((stream, peer)) => {
                        this.metrics.connections_total.fetch_add(1, Ordering::Relaxed);
                        this.metrics.connections_active.fetch_add(1, Ordering::Relaxed);
                        let this = Arc::clone(&this);
                        let cancel = cancel.clone();
                        tracker.spawn(async move {
                            this.serve(stream, peer, cancel).await;
                            this.metrics.connections_active.fetch_sub(1, Ordering::Relaxed);
                        });
                    }
                    Err(e) => {
                        // Transient accept errors - log and continue
                        warn!(error = %e, "accept error");
                    }
                },
            }
        }

        tracker.close();
        tracker.wait().await;
        info!(receiver = %this.config.name, "Stream receiver stopped");
        Ok(())
    }

    async fn serve(&self, stream: TcpStream, peer: SocketAddr, cancel: CancellationToken) {
        let _ = stream.set_nodelay(true);
        let span = info_span!("export_stream", receiver = %self.config.name, peer = %peer);
        let (read, write) = stream.into_split();
        let mut reader = FramedRead::new(read, frame_codec(self.config.max_frame_len));
        let mut writer = FramedWrite::new(write, frame_codec(self.config.max_frame_len));

        let status = match self
            .handle_stream(&mut reader, &span, &cancel)
            .instrument(span.clone())
            .await
        {
            Ok(()) => ok_status(),
            Err(e) => {
                self.metrics.streams_failed.fetch_add(1, Ordering::Relaxed);
                if e.is_client_error() {
                    warn!(parent: &span, error = %e, error_type = e.error_type(), "Export stream rejected");
                } else {
                    debug!(parent: &span, error = %e, error_type = e.error_type(), "Export stream ended with error");
                }
                e.to_status()
            }
        };

        let frame = Bytes::from(status.encode_to_vec());
        if let Err(e) = writer.send(frame).await {
            debug!(parent: &span, error = %e, "Failed to write stream status");
        }
        let _ = SinkExt::<Bytes>::close(&mut writer).await;
    }

    async fn handle_stream(
        &self,
        reader: &mut FrameReader,
        span: &tracing::Span,
        cancel: &CancellationToken,
    ) -> Result<(), ReceiverError> {
        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ReceiverError::ShuttingDown),
            first = reader.next() => first,
        };
        let first = match first {
            // Connected and closed without exporting anything.
            None => return Ok(()),
            Some(frame) => self.decode_frame(frame?)?,
        };

        match first {
            payload @ Payload::Traces(_) => {
                let driver = self
                    .traces
                    .as_ref()
                    .ok_or_else(|| disabled(Span::NAME))?;
                self.drive(driver, payload, reader, span, cancel).await
            }
            payload => {
                let driver = self
                    .metrics_driver
                    .as_ref()
                    .ok_or_else(|| disabled(Metric::NAME))?;
                self.drive(driver, payload, reader, span, cancel).await
            }
        }
    }

    async fn drive<T: Signal>(
        &self,
        driver: &StreamDriver<T>,
        first: Payload,
        reader: &mut FrameReader,
        span: &tracing::Span,
        cancel: &CancellationToken,
    ) -> Result<(), ReceiverError> {
        let rest = reader.map(|frame| {
            let payload = self.decode_frame(frame?)?;
            T::from_payload(payload).map_err(|other| {
                ReceiverError::ProtocolViolation(format!(
                    "{} frame on a {} stream",
                    payload_name(&other),
                    T::NAME
                ))
            })
        });
        // The first payload was already matched to this signal.
        let head = stream::iter(T::from_payload(first).ok().map(Ok));
        let mut session = driver.new_session();
        driver
            .run(&mut session, head.chain(rest), span, cancel)
            .await
    }

    fn decode_frame(
        &self,
        frame: bytes::BytesMut,
    ) -> Result<Payload, ReceiverError> {
        self.metrics.frames_received.fetch_add(1, Ordering::Relaxed);
        let frame = ClientFrame::decode(frame.freeze())?;
        frame
            .payload
            .ok_or_else(|| ReceiverError::InvalidArgument("frame carries no payload".to_string()))
    }
}

fn disabled(signal: &str) -> ReceiverError {
    ReceiverError::InvalidArgument(format!("{} reception is disabled", signal))
}

/// Decode the terminal status frame written by a receiver.
pub(crate) fn decode_status(frame: bytes::BytesMut) -> Result<StreamStatus, prost::DecodeError> {
    StreamStatus::decode(frame.freeze())
}

pub(crate) fn status_code(status: &StreamStatus) -> StatusCode {
    StatusCode::try_from(status.code).unwrap_or(StatusCode::Internal)
}
