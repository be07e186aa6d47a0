use serde::{Deserialize, Serialize};

use super::{Metric, Node, Resource, Span};

/// Source format tags carried on every batch.
pub mod source_format {
    pub const OC_TRACE: &str = "oc_trace";
    pub const OC_METRICS: &str = "oc_metrics";
    pub const JAEGER: &str = "jaeger";
    pub const HTTP_JSON: &str = "http_json";
}

/// One unit of ingested telemetry: the resolved node and resource plus the
/// items received with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch<T> {
    pub node: Option<Node>,
    pub resource: Option<Resource>,
    pub items: Vec<T>,
    pub source_format: String,
}

impl<T> Batch<T> {
    pub fn new(source_format: impl Into<String>) -> Self {
        Self {
            node: None,
            resource: None,
            items: Vec::new(),
            source_format: source_format.into(),
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_items(mut self, items: Vec<T>) -> Self {
        self.items = items;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub type TraceBatch = Batch<Span>;
pub type MetricsBatch = Batch<Metric>;

/// One message of an export stream as sent by a producer. Node and resource
/// are optional on the wire; a stream session resolves them into a [`Batch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMessage<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    #[serde(default = "Vec::new", alias = "spans", alias = "metrics")]
    pub items: Vec<T>,
}

impl<T> ExportMessage<T> {
    pub fn new(node: Option<Node>, items: Vec<T>) -> Self {
        Self {
            node,
            resource: None,
            items,
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }
}
