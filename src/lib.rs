// spanrelay - Telemetry relay
//
// Receives export streams of spans and metrics, queues them on a bounded
// worker pool and fans each batch out to the registered exporters.
//
// The pieces live in their own crates and are re-exported here:
// - common: model, wire conversion, consumers, fan-out, Jaeger translation
// - batch: dispatch queue and time-windowed buffering
// - receiver: stream protocol state machine, TCP server and client
// - exporter: logging, sink, forwarding and Jaeger exporters
// - config / server: runtime configuration and the relay process

pub use spanrelay_batch as batch;
pub use spanrelay_config as config;
pub use spanrelay_core as common;
pub use spanrelay_exporter as exporter;
pub use spanrelay_receiver as receiver;
pub use spanrelay_server as server;

pub use spanrelay_core::{Batch, Consumer, ConsumerError, ExportContext, FanOut, Observability};
pub use spanrelay_server::{Registrations, Relay};
