use spanrelay_core::convert::{
    decode_metrics_request, decode_trace_request, encode_metrics_request, encode_trace_request,
};
use spanrelay_core::model::{source_format, ExportMessage};
use spanrelay_core::{Metric, Node, Resource, Span, Translated};
use spanrelay_proto::spanrelay::stream::v1::{client_frame::Payload, ClientFrame};

/// A telemetry signal that can travel over an export stream.
pub trait Signal: Clone + Send + Sync + 'static {
    /// Name used in logs and dispatcher names.
    const NAME: &'static str;
    /// `source_format` tag set on batches received over the stream.
    const SOURCE_FORMAT: &'static str;

    /// Decode a frame payload. Payloads of another signal are handed back.
    fn from_payload(payload: Payload) -> Result<Translated<ExportMessage<Self>>, Payload>;

    fn to_frame(node: Option<Node>, resource: Option<Resource>, items: Vec<Self>) -> ClientFrame;
}

impl Signal for Span {
    const NAME: &'static str = "traces";
    const SOURCE_FORMAT: &'static str = source_format::OC_TRACE;

    fn from_payload(payload: Payload) -> Result<Translated<ExportMessage<Self>>, Payload> {
        match payload {
            Payload::Traces(request) => Ok(decode_trace_request(request)),
            other => Err(other),
        }
    }

    fn to_frame(node: Option<Node>, resource: Option<Resource>, items: Vec<Self>) -> ClientFrame {
        ClientFrame {
            payload: Some(Payload::Traces(encode_trace_request(node, resource, items))),
        }
    }
}

impl Signal for Metric {
    const NAME: &'static str = "metrics";
    const SOURCE_FORMAT: &'static str = source_format::OC_METRICS;

    fn from_payload(payload: Payload) -> Result<Translated<ExportMessage<Self>>, Payload> {
        match payload {
            Payload::Metrics(request) => Ok(decode_metrics_request(request)),
            other => Err(other),
        }
    }

    fn to_frame(node: Option<Node>, resource: Option<Resource>, items: Vec<Self>) -> ClientFrame {
        ClientFrame {
            payload: Some(Payload::Metrics(encode_metrics_request(node, resource, items))),
        }
    }
}

pub(crate) fn payload_name(payload: &Payload) -> &'static str {
    match payload {
        Payload::Traces(_) => Span::NAME,
        Payload::Metrics(_) => Metric::NAME,
    }
}
