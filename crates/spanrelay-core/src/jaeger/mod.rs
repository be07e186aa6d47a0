//! Translation between the common trace model and Jaeger.
//!
//! The mapping is lossless for everything Jaeger can express. Span-level
//! resources, tracestate and link attributes have no Jaeger counterpart and
//! are not carried; binary tags come back as base64 strings.
//!
//! Jaeger stores a start and a duration, so the end time is rebuilt as
//! `start + duration`. A span without an end time, or whose end precedes
//! its start, is sent with a zero duration and comes back with
//! `end_time == start_time`. A span without a start time is sent at the
//! Unix epoch.
//!
//! The `error` tag is emitted for a failing status unless the span already
//! has an `error` attribute. On the way back an `error=true` tag next to a
//! failing `status.code` is treated as derived and dropped; any other
//! `error` tag becomes an attribute.

mod from_common;
pub mod model;
mod to_common;

pub use from_common::{node_to_process, trace_batch_to_jaeger};
pub use to_common::{jaeger_to_trace_batch, process_to_node};

/// Tag and log field keys with a fixed meaning in both directions.
pub mod tags {
    pub const HOSTNAME: &str = "hostname";
    pub const PID: &str = "pid";
    pub const START_TIME: &str = "start.time";
    pub const LANGUAGE: &str = "opencensus.language";
    pub const EXPORTER_VERSION: &str = "opencensus.exporterversion";
    pub const CORE_LIB_VERSION: &str = "opencensus.corelibversion";

    pub const SPAN_KIND: &str = "span.kind";
    pub const STATUS_CODE: &str = "status.code";
    pub const STATUS_MESSAGE: &str = "status.message";
    pub const ERROR: &str = "error";

    pub const DESCRIPTION: &str = "description";
    pub const MESSAGE_EVENT_TYPE: &str = "message_event.type";
    pub const MESSAGE_EVENT_ID: &str = "message_event.id";
    pub const MESSAGE_EVENT_UNCOMPRESSED_SIZE: &str = "message_event.uncompressed_size";
    pub const MESSAGE_EVENT_COMPRESSED_SIZE: &str = "message_event.compressed_size";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        source_format, Annotation, Attributes, Link, LinkType, MessageDirection, MessageEvent,
        Node, ProcessIdentifier, ServiceInfo, Span, SpanId, SpanKind, Status, TimeEvent,
        TimeEventValue, Timestamp, TraceBatch, TraceId,
    };

    #[test]
    fn test_round_trip_is_exact() {
        let trace_id = TraceId::from_bytes([0x11; 16]);
        let mut span = Span::new(trace_id, SpanId::from_bytes([0x22; 8]), "checkout");
        span.parent_span_id = Some(SpanId::from_bytes([0x33; 8]));
        span.kind = SpanKind::Client;
        span.start_time = Some(Timestamp::parse_rfc3339("2018-10-31T19:43:35.000000789Z").unwrap());
        span.end_time = Some(Timestamp::new(1_541_015_016, 123_456_789));
        span.attributes.insert("http.status_code".into(), 503i64.into());
        span.attributes.insert("retry".into(), false.into());
        span.attributes.insert("ratio".into(), 0.25f64.into());
        span.attributes.insert("peer".into(), "db-1".into());
        span.status = Some(Status {
            code: 14,
            message: "unavailable".into(),
        });
        span.links = vec![
            Link {
                trace_id,
                span_id: SpanId::from_bytes([0x44; 8]),
                link_type: LinkType::ParentLinked,
                attributes: Attributes::new(),
            },
            Link {
                trace_id: TraceId::from_bytes([0x55; 16]),
                span_id: SpanId::from_bytes([0x66; 8]),
                link_type: LinkType::Unspecified,
                attributes: Attributes::new(),
            },
        ];
        span.time_events = vec![
            TimeEvent {
                time: Some(Timestamp::new(1_541_015_015, 999)),
                value: TimeEventValue::MessageEvent(MessageEvent {
                    direction: MessageDirection::Received,
                    id: 9,
                    uncompressed_size: 2048,
                    compressed_size: 700,
                }),
            },
            TimeEvent {
                time: Some(Timestamp::new(1_541_015_015, 1_000)),
                value: TimeEventValue::Annotation(Annotation {
                    description: Some("cache miss".into()),
                    attributes: Attributes::from([("key".to_string(), "user:7".into())]),
                }),
            },
        ];

        let node = Node {
            identifier: Some(ProcessIdentifier {
                host_name: "api246-sjc1".into(),
                pid: 13,
                start_timestamp: Some(Timestamp::new(1_485_467_190, 639_875_000)),
            }),
            service_info: Some(ServiceInfo { name: "api".into() }),
            attributes: [("ip".to_string(), "10.53.69.61".to_string())].into(),
            ..Default::default()
        };

        let batch = TraceBatch::new(source_format::OC_TRACE)
            .with_node(node.clone())
            .with_items(vec![span.clone()]);

        let jaeger = trace_batch_to_jaeger(&batch);
        assert!(jaeger.errors.is_empty());
        let back = jaeger_to_trace_batch(&jaeger.value);
        assert!(back.errors.is_empty());

        assert_eq!(back.value.source_format, source_format::JAEGER);
        assert_eq!(back.value.node, Some(node));
        assert_eq!(back.value.items, vec![span]);
    }

    fn round_trip(span: Span) -> Span {
        let batch = TraceBatch::new(source_format::OC_TRACE)
            .with_node(Node::for_service("svc"))
            .with_items(vec![span]);
        let jaeger = trace_batch_to_jaeger(&batch);
        assert!(jaeger.errors.is_empty());
        let back = jaeger_to_trace_batch(&jaeger.value);
        assert!(back.errors.is_empty());
        back.value.items.into_iter().next().unwrap()
    }

    #[test]
    fn test_missing_or_reversed_end_time_collapses_to_start() {
        let start = Timestamp::new(1_541_015_015, 789);
        let mut span = Span::new(TraceId::from_bytes([1; 16]), SpanId::from_bytes([2; 8]), "op");
        span.start_time = Some(start);

        let back = round_trip(span.clone());
        assert_eq!(back.start_time, Some(start));
        assert_eq!(back.end_time, Some(start));

        span.end_time = Some(Timestamp::new(1_541_015_014, 0));
        assert_eq!(round_trip(span).end_time, Some(start));
    }

    #[test]
    fn test_user_error_attribute_survives_round_trip() {
        let mut span = Span::new(TraceId::from_bytes([1; 16]), SpanId::from_bytes([2; 8]), "op");
        span.start_time = Some(Timestamp::new(1_541_015_015, 0));
        span.end_time = span.start_time;
        span.attributes.insert("error".into(), true.into());
        assert_eq!(round_trip(span.clone()), span);

        span.status = Some(Status {
            code: 13,
            message: String::new(),
        });
        span.attributes.insert("error".into(), false.into());
        assert_eq!(round_trip(span.clone()), span);
    }

    #[test]
    fn test_empty_process_round_trips_to_no_node() {
        let batch = TraceBatch::new(source_format::OC_TRACE);
        let jaeger = trace_batch_to_jaeger(&batch).value;
        let back = jaeger_to_trace_batch(&jaeger).value;
        assert_eq!(back.node, None);
        assert!(back.items.is_empty());
    }
}
