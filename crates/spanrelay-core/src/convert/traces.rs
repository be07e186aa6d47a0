use spanrelay_proto::opencensus::proto::agent::trace::v1::ExportTraceServiceRequest;
use spanrelay_proto::opencensus::proto::trace::v1 as pb;

use super::{TranslationError, Translated};
use crate::model::{
    Annotation, AttributeValue, Attributes, ExportMessage, Link, LinkType, MessageDirection,
    MessageEvent, Node, Resource, Span, SpanId, SpanKind, Status, TimeEvent, TimeEventValue,
    Timestamp, TraceId,
};

/// Decode one wire message into the common model. Spans with malformed ids
/// are dropped and reported; the rest of the message is kept.
pub fn decode_trace_request(request: ExportTraceServiceRequest) -> Translated<ExportMessage<Span>> {
    let mut errors = Vec::new();
    let mut spans = Vec::with_capacity(request.spans.len());

    for span in request.spans {
        match decode_span(span) {
            Ok(span) => spans.push(span),
            Err(e) => errors.push(e),
        }
    }

    Translated {
        value: ExportMessage {
            node: request.node.map(Node::from),
            resource: request.resource.map(Resource::from),
            items: spans,
        },
        errors,
    }
}

pub fn encode_trace_request(
    node: Option<Node>,
    resource: Option<Resource>,
    spans: Vec<Span>,
) -> ExportTraceServiceRequest {
    ExportTraceServiceRequest {
        node: node.map(Into::into),
        spans: spans.into_iter().map(encode_span).collect(),
        resource: resource.map(Into::into),
    }
}

fn decode_span(span: pb::Span) -> Result<Span, TranslationError> {
    let trace_id = TraceId::from_slice(&span.trace_id)?;
    if trace_id.is_zero() {
        return Err(TranslationError::ZeroId { field: "trace_id" });
    }
    let span_id = SpanId::from_slice(&span.span_id)?;
    if span_id.is_zero() {
        return Err(TranslationError::ZeroId { field: "span_id" });
    }
    let parent_span_id = if span.parent_span_id.is_empty() {
        None
    } else {
        Some(SpanId::from_slice(&span.parent_span_id)?).filter(|id| !id.is_zero())
    };

    let kind = match span.kind() {
        pb::span::SpanKind::Server => SpanKind::Server,
        pb::span::SpanKind::Client => SpanKind::Client,
        pb::span::SpanKind::Unspecified => SpanKind::Unspecified,
    };

    let mut links = Vec::new();
    for link in span.links.map(|l| l.link).unwrap_or_default() {
        links.push(decode_link(link)?);
    }

    Ok(Span {
        trace_id,
        span_id,
        parent_span_id,
        tracestate: span
            .tracestate
            .map(|ts| ts.entries.into_iter().map(|e| (e.key, e.value)).collect())
            .unwrap_or_default(),
        name: span.name.map(|n| n.value).unwrap_or_default(),
        kind,
        start_time: span.start_time.map(Timestamp::from),
        end_time: span.end_time.map(Timestamp::from),
        attributes: decode_attributes(span.attributes),
        time_events: span
            .time_events
            .map(|te| te.time_event.into_iter().filter_map(decode_time_event).collect())
            .unwrap_or_default(),
        links,
        status: span.status.map(|s| Status {
            code: s.code,
            message: s.message,
        }),
        resource: span.resource.map(Resource::from),
    })
}

fn decode_link(link: pb::span::Link) -> Result<Link, TranslationError> {
    let link_type = match link.r#type() {
        pb::span::link::Type::ChildLinkedSpan => LinkType::ChildLinked,
        pb::span::link::Type::ParentLinkedSpan => LinkType::ParentLinked,
        pb::span::link::Type::Unspecified => LinkType::Unspecified,
    };
    Ok(Link {
        trace_id: TraceId::from_slice(&link.trace_id)?,
        span_id: SpanId::from_slice(&link.span_id)?,
        link_type,
        attributes: decode_attributes(link.attributes),
    })
}

fn decode_attributes(attributes: Option<pb::span::Attributes>) -> Attributes {
    let Some(attributes) = attributes else {
        return Attributes::new();
    };
    attributes
        .attribute_map
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value.value? {
                pb::attribute_value::Value::StringValue(s) => AttributeValue::String(s.value),
                pb::attribute_value::Value::IntValue(i) => AttributeValue::Int(i),
                pb::attribute_value::Value::BoolValue(b) => AttributeValue::Bool(b),
                pb::attribute_value::Value::DoubleValue(d) => AttributeValue::Double(d),
            };
            Some((key, value))
        })
        .collect()
}

fn decode_time_event(event: pb::span::TimeEvent) -> Option<TimeEvent> {
    use pb::span::time_event::{message_event, Value};

    let value = match event.value? {
        Value::Annotation(annotation) => TimeEventValue::Annotation(Annotation {
            description: annotation.description.map(|d| d.value),
            attributes: decode_attributes(annotation.attributes),
        }),
        Value::MessageEvent(message) => {
            let direction = match message.r#type() {
                message_event::Type::Sent => MessageDirection::Sent,
                message_event::Type::Received => MessageDirection::Received,
                message_event::Type::Unspecified => MessageDirection::Unspecified,
            };
            TimeEventValue::MessageEvent(MessageEvent {
                direction,
                id: message.id,
                uncompressed_size: message.uncompressed_size,
                compressed_size: message.compressed_size,
            })
        }
    };
    Some(TimeEvent {
        time: event.time.map(Timestamp::from),
        value,
    })
}

fn encode_span(span: Span) -> pb::Span {
    let kind = match span.kind {
        SpanKind::Server => pb::span::SpanKind::Server,
        SpanKind::Client => pb::span::SpanKind::Client,
        SpanKind::Unspecified => pb::span::SpanKind::Unspecified,
    };

    pb::Span {
        trace_id: span.trace_id.as_bytes().to_vec(),
        span_id: span.span_id.as_bytes().to_vec(),
        tracestate: (!span.tracestate.is_empty()).then(|| pb::span::Tracestate {
            entries: span
                .tracestate
                .into_iter()
                .map(|(key, value)| pb::span::tracestate::Entry { key, value })
                .collect(),
        }),
        parent_span_id: span
            .parent_span_id
            .map(|id| id.as_bytes().to_vec())
            .unwrap_or_default(),
        name: Some(truncatable(span.name)),
        kind: kind as i32,
        start_time: span.start_time.map(Into::into),
        end_time: span.end_time.map(Into::into),
        attributes: encode_attributes(span.attributes),
        time_events: (!span.time_events.is_empty()).then(|| pb::span::TimeEvents {
            time_event: span.time_events.into_iter().map(encode_time_event).collect(),
            ..Default::default()
        }),
        links: (!span.links.is_empty()).then(|| pb::span::Links {
            link: span.links.into_iter().map(encode_link).collect(),
            ..Default::default()
        }),
        status: span.status.map(|s| pb::Status {
            code: s.code,
            message: s.message,
        }),
        resource: span.resource.map(Into::into),
        same_process_as_parent_span: None,
        child_span_count: None,
    }
}

fn encode_link(link: Link) -> pb::span::Link {
    let link_type = match link.link_type {
        LinkType::ChildLinked => pb::span::link::Type::ChildLinkedSpan,
        LinkType::ParentLinked => pb::span::link::Type::ParentLinkedSpan,
        LinkType::Unspecified => pb::span::link::Type::Unspecified,
    };
    pb::span::Link {
        trace_id: link.trace_id.as_bytes().to_vec(),
        span_id: link.span_id.as_bytes().to_vec(),
        r#type: link_type as i32,
        attributes: encode_attributes(link.attributes),
    }
}

fn encode_attributes(attributes: Attributes) -> Option<pb::span::Attributes> {
    if attributes.is_empty() {
        return None;
    }
    let attribute_map = attributes
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                AttributeValue::String(s) => pb::attribute_value::Value::StringValue(truncatable(s)),
                AttributeValue::Int(i) => pb::attribute_value::Value::IntValue(i),
                AttributeValue::Bool(b) => pb::attribute_value::Value::BoolValue(b),
                AttributeValue::Double(d) => pb::attribute_value::Value::DoubleValue(d),
            };
            (key, pb::AttributeValue { value: Some(value) })
        })
        .collect();
    Some(pb::span::Attributes {
        attribute_map,
        dropped_attributes_count: 0,
    })
}

fn encode_time_event(event: TimeEvent) -> pb::span::TimeEvent {
    use pb::span::time_event::{self, message_event, Value};

    let value = match event.value {
        TimeEventValue::Annotation(annotation) => Value::Annotation(time_event::Annotation {
            description: annotation.description.map(truncatable),
            attributes: encode_attributes(annotation.attributes),
        }),
        TimeEventValue::MessageEvent(message) => {
            let r#type = match message.direction {
                MessageDirection::Sent => message_event::Type::Sent,
                MessageDirection::Received => message_event::Type::Received,
                MessageDirection::Unspecified => message_event::Type::Unspecified,
            };
            Value::MessageEvent(time_event::MessageEvent {
                r#type: r#type as i32,
                id: message.id,
                uncompressed_size: message.uncompressed_size,
                compressed_size: message.compressed_size,
            })
        }
    };
    pb::span::TimeEvent {
        time: event.time.map(Into::into),
        value: Some(value),
    }
}

fn truncatable(value: String) -> pb::TruncatableString {
    pb::TruncatableString {
        value,
        truncated_byte_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_span(trace_id: Vec<u8>, span_id: Vec<u8>) -> pb::Span {
        pb::Span {
            trace_id,
            span_id,
            name: Some(truncatable("get".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_bad_spans_are_reported_individually() {
        let request = ExportTraceServiceRequest {
            node: None,
            spans: vec![
                wire_span(vec![1; 16], vec![2; 8]),
                wire_span(vec![1; 15], vec![2; 8]),
                wire_span(vec![0; 16], vec![2; 8]),
                wire_span(vec![1; 16], vec![0; 8]),
                wire_span(vec![3; 16], vec![4; 8]),
            ],
            resource: None,
        };

        let translated = decode_trace_request(request);
        assert_eq!(translated.value.items.len(), 2);
        assert_eq!(translated.dropped(), 3);
        assert_eq!(
            translated.errors[1],
            TranslationError::ZeroId { field: "trace_id" }
        );
        assert_eq!(
            translated.errors[2],
            TranslationError::ZeroId { field: "span_id" }
        );
    }

    #[test]
    fn test_zero_parent_is_root() {
        let mut span = wire_span(vec![1; 16], vec![2; 8]);
        span.parent_span_id = vec![0; 8];
        let decoded = decode_span(span).unwrap();
        assert_eq!(decoded.parent_span_id, None);
    }

    #[test]
    fn test_span_round_trip() {
        let mut span = Span::new(
            TraceId::from_bytes([7; 16]),
            SpanId::from_bytes([8; 8]),
            "checkout",
        );
        span.parent_span_id = Some(SpanId::from_bytes([9; 8]));
        span.kind = SpanKind::Client;
        span.start_time = Some(Timestamp::new(1_541_015_015, 789));
        span.end_time = Some(Timestamp::new(1_541_015_016, 0));
        span.attributes.insert("http.status".into(), 200i64.into());
        span.attributes.insert("cache.hit".into(), true.into());
        span.status = Some(Status {
            code: 13,
            message: "internal".into(),
        });
        span.time_events.push(TimeEvent {
            time: Some(Timestamp::new(1_541_015_015, 900)),
            value: TimeEventValue::MessageEvent(MessageEvent {
                direction: MessageDirection::Received,
                id: 3,
                uncompressed_size: 120,
                compressed_size: 80,
            }),
        });
        span.links.push(Link {
            trace_id: TraceId::from_bytes([5; 16]),
            span_id: SpanId::from_bytes([6; 8]),
            link_type: LinkType::ParentLinked,
            attributes: Attributes::new(),
        });

        let request = encode_trace_request(Some(Node::for_service("shop")), None, vec![span.clone()]);
        let translated = decode_trace_request(request);
        assert!(translated.errors.is_empty());
        assert_eq!(translated.value.node, Some(Node::for_service("shop")));
        assert_eq!(translated.value.items, vec![span]);
    }
}
