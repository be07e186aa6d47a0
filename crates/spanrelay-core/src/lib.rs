// spanrelay-core - Common telemetry model and routing primitives
//
// Everything here is transport-agnostic: the model a batch is normalized
// into, the wire <-> model conversion, the consumer capability, fan-out,
// received/dropped accounting and the Jaeger translator. Networking and the
// worker pool live in the receiver and batch crates.

pub mod consumer;
pub mod convert;
pub mod fanout;
pub mod jaeger;
pub mod model;
pub mod observability;

// Re-export commonly used types
pub use consumer::{Consumer, ConsumerError, ExportContext};
pub use convert::{TranslationError, Translated};
pub use fanout::FanOut;
pub use model::{Batch, Metric, MetricsBatch, Node, Resource, Span, TraceBatch};
pub use observability::{CounterSnapshot, Observability, ObservabilitySnapshot};
