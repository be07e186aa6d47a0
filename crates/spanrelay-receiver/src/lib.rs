// spanrelay-receiver - Streaming export ingestion
//
// An export stream is a sequence of messages that share node and resource
// context: the first message must name its node and later ones may inherit
// it. `ExportSession` tracks that context, `StreamDriver` pushes resolved
// batches onto a dispatcher, and `StreamReceiver` serves the protocol over
// TCP. `ExportClient` is the matching client, used by the forwarding
// exporter and in tests.

mod client;
mod driver;
mod error;
mod session;
mod signal;
mod tcp;

pub use client::{ClientError, ExportClient};
pub use driver::StreamDriver;
pub use error::{ReceiverError, MISSING_NODE_MESSAGE};
pub use session::{CloseReason, ExportSession, SessionState};
pub use signal::Signal;
pub use tcp::{
    Pipelines, StreamReceiver, StreamReceiverConfig, StreamReceiverMetrics,
    StreamReceiverMetricsSnapshot, MAX_FRAME_LEN,
};

pub use spanrelay_proto::spanrelay::stream::v1::{StatusCode, StreamStatus};
