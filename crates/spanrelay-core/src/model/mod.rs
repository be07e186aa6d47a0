//! Common in-memory representation shared by every receiver and exporter.

mod batch;
mod ids;
mod metric;
mod node;
mod span;
mod time;

pub use batch::{source_format, Batch, ExportMessage, MetricsBatch, TraceBatch};
pub use ids::{SpanId, TraceId};
pub use metric::{
    Bucket, DistributionValue, Exemplar, LabelKey, Metric, MetricDescriptor, MetricType, Point,
    PointValue, SummarySnapshot, SummaryValue, TimeSeries, ValueAtPercentile,
};
pub use node::{Language, LibraryInfo, Node, ProcessIdentifier, Resource, ServiceInfo};
pub use span::{
    Annotation, AttributeValue, Attributes, Link, LinkType, MessageDirection, MessageEvent, Span,
    SpanKind, Status, TimeEvent, TimeEventValue,
};
pub use time::Timestamp;
