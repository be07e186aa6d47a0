use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::model::{self as jaeger, KeyValue, SpanRefType, TagValue};
use super::tags;
use crate::convert::{TranslationError, Translated};
use crate::model::{
    source_format, Annotation, AttributeValue, Attributes, Language, LibraryInfo, Link, LinkType,
    MessageDirection, MessageEvent, Node, ProcessIdentifier, ServiceInfo, Span, SpanKind, Status,
    TimeEvent, TimeEventValue, Timestamp, TraceBatch,
};

/// Translate a Jaeger batch into the common model. An empty process yields
/// a batch without a node.
pub fn jaeger_to_trace_batch(batch: &jaeger::Batch) -> Translated<TraceBatch> {
    let mut errors = Vec::new();
    let mut spans = Vec::with_capacity(batch.spans.len());
    for span in &batch.spans {
        match span_from_jaeger(span) {
            Ok(span) => spans.push(span),
            Err(e) => errors.push(e),
        }
    }

    let mut out = TraceBatch::new(source_format::JAEGER).with_items(spans);
    out.node = process_to_node(&batch.process);
    Translated { value: out, errors }
}

pub fn process_to_node(process: &jaeger::Process) -> Option<Node> {
    if process.is_empty() {
        return None;
    }

    let mut node = Node::default();
    if !process.service_name.is_empty() {
        node.service_info = Some(ServiceInfo {
            name: process.service_name.clone(),
        });
    }

    for tag in &process.tags {
        match (tag.key.as_str(), &tag.value) {
            (tags::HOSTNAME, TagValue::String(host)) => {
                identifier(&mut node).host_name = host.clone();
            }
            (tags::PID, TagValue::Int64(pid)) if u32::try_from(*pid).is_ok() => {
                identifier(&mut node).pid = *pid as u32;
            }
            (tags::START_TIME, TagValue::String(started)) => match Timestamp::parse_rfc3339(started)
            {
                Ok(ts) => identifier(&mut node).start_timestamp = Some(ts),
                Err(_) => {
                    node.attributes.insert(tag.key.clone(), started.clone());
                }
            },
            (tags::LANGUAGE, TagValue::String(language)) => {
                library_info(&mut node).language =
                    language.parse::<Language>().unwrap_or_default();
            }
            (tags::EXPORTER_VERSION, TagValue::String(version)) => {
                library_info(&mut node).exporter_version = version.clone();
            }
            (tags::CORE_LIB_VERSION, TagValue::String(version)) => {
                library_info(&mut node).core_library_version = version.clone();
            }
            (_, value) => {
                node.attributes.insert(tag.key.clone(), tag_to_string(value));
            }
        }
    }
    Some(node)
}

fn identifier(node: &mut Node) -> &mut ProcessIdentifier {
    node.identifier.get_or_insert_with(ProcessIdentifier::default)
}

fn library_info(node: &mut Node) -> &mut LibraryInfo {
    node.library_info.get_or_insert_with(LibraryInfo::default)
}

fn tag_to_string(value: &TagValue) -> String {
    match value {
        TagValue::String(s) => s.clone(),
        TagValue::Bool(b) => b.to_string(),
        TagValue::Int64(i) => i.to_string(),
        TagValue::Float64(f) => f.to_string(),
        TagValue::Binary(bytes) => BASE64.encode(bytes),
    }
}

fn tag_to_attribute(value: &TagValue) -> AttributeValue {
    match value {
        TagValue::String(s) => AttributeValue::String(s.clone()),
        TagValue::Bool(b) => AttributeValue::Bool(*b),
        TagValue::Int64(i) => AttributeValue::Int(*i),
        TagValue::Float64(f) => AttributeValue::Double(*f),
        TagValue::Binary(bytes) => AttributeValue::String(BASE64.encode(bytes)),
    }
}

fn span_from_jaeger(span: &jaeger::Span) -> Result<Span, TranslationError> {
    if span.trace_id.is_zero() {
        return Err(TranslationError::ZeroId { field: "trace_id" });
    }
    if span.span_id.0 == 0 {
        return Err(TranslationError::ZeroId { field: "span_id" });
    }

    let mut out = Span::new(span.trace_id.into(), span.span_id.into(), span.operation_name.clone());

    for reference in &span.references {
        let same_trace = reference.trace_id == span.trace_id;
        match reference.ref_type {
            SpanRefType::ChildOf if same_trace && out.parent_span_id.is_none() => {
                out.parent_span_id = Some(reference.span_id.into());
            }
            SpanRefType::ChildOf => out.links.push(Link {
                trace_id: reference.trace_id.into(),
                span_id: reference.span_id.into(),
                link_type: LinkType::ParentLinked,
                attributes: Attributes::new(),
            }),
            SpanRefType::FollowsFrom => out.links.push(Link {
                trace_id: reference.trace_id.into(),
                span_id: reference.span_id.into(),
                link_type: LinkType::Unspecified,
                attributes: Attributes::new(),
            }),
        }
    }

    let mut status: Option<Status> = None;
    let mut error_flag = None;
    for tag in &span.tags {
        match (tag.key.as_str(), &tag.value) {
            (tags::SPAN_KIND, TagValue::String(kind)) if kind == "server" => {
                out.kind = SpanKind::Server;
            }
            (tags::SPAN_KIND, TagValue::String(kind)) if kind == "client" => {
                out.kind = SpanKind::Client;
            }
            (tags::STATUS_CODE, TagValue::Int64(code)) if i32::try_from(*code).is_ok() => {
                status.get_or_insert_with(Status::default).code = *code as i32;
            }
            (tags::STATUS_MESSAGE, TagValue::String(message)) => {
                status.get_or_insert_with(Status::default).message = message.clone();
            }
            (tags::ERROR, TagValue::Bool(flag)) => error_flag = Some(*flag),
            (_, value) => {
                out.attributes.insert(tag.key.clone(), tag_to_attribute(value));
            }
        }
    }
    // `error=true` alongside a failing status was derived from that status.
    let derived = status.as_ref().is_some_and(Status::is_error);
    if let Some(flag) = error_flag.filter(|flag| !(derived && *flag)) {
        out.attributes.insert(tags::ERROR.to_string(), flag.into());
    }
    out.status = status;

    let start = Timestamp::from_datetime(&span.start_time);
    out.start_time = Some(start);
    out.end_time = Some(start.checked_add(span.duration).ok_or_else(|| {
        TranslationError::InvalidTimestamp(format!(
            "{} plus {:?} overflows",
            span.start_time, span.duration
        ))
    })?);

    out.time_events = span.logs.iter().map(log_to_time_event).collect();
    Ok(out)
}

fn log_to_time_event(log: &jaeger::Log) -> TimeEvent {
    let time = Some(Timestamp::from_datetime(&log.timestamp));
    let is_message_event = log
        .fields
        .iter()
        .any(|f| f.key == tags::MESSAGE_EVENT_TYPE);

    let value = if is_message_event {
        let mut event = MessageEvent::default();
        for field in &log.fields {
            match (field.key.as_str(), &field.value) {
                (tags::MESSAGE_EVENT_TYPE, TagValue::String(label)) => {
                    event.direction = MessageDirection::from_label(label);
                }
                (tags::MESSAGE_EVENT_ID, TagValue::Int64(v)) => event.id = *v as u64,
                (tags::MESSAGE_EVENT_UNCOMPRESSED_SIZE, TagValue::Int64(v)) => {
                    event.uncompressed_size = *v as u64;
                }
                (tags::MESSAGE_EVENT_COMPRESSED_SIZE, TagValue::Int64(v)) => {
                    event.compressed_size = *v as u64;
                }
                _ => {}
            }
        }
        TimeEventValue::MessageEvent(event)
    } else {
        let mut annotation = Annotation::default();
        for KeyValue { key, value } in &log.fields {
            match (key.as_str(), value) {
                (tags::DESCRIPTION, TagValue::String(description)) => {
                    annotation.description = Some(description.clone());
                }
                _ => {
                    annotation
                        .attributes
                        .insert(key.clone(), tag_to_attribute(value));
                }
            }
        }
        TimeEventValue::Annotation(annotation)
    };
    TimeEvent { time, value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jaeger::model::{SpanId, SpanRef, TraceId};
    use chrono::{DateTime, Utc};
    use std::time::Duration;

    fn jaeger_span(span_id: u64) -> jaeger::Span {
        jaeger::Span {
            trace_id: TraceId {
                high: 0,
                low: 0x5296_9A89_5557_1A3F,
            },
            span_id: SpanId(span_id),
            operation_name: "get".into(),
            references: Vec::new(),
            flags: 1,
            start_time: DateTime::parse_from_rfc3339("2017-01-26T21:46:31.639875Z")
                .unwrap()
                .with_timezone(&Utc),
            duration: Duration::from_nanos(22_938_000),
            tags: Vec::new(),
            logs: Vec::new(),
            process: None,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_first_child_of_in_trace_becomes_parent() {
        let mut span = jaeger_span(0x647D99);
        let trace_id = span.trace_id;
        let other_trace = TraceId { high: 1, low: 2 };
        span.references = vec![
            SpanRef {
                trace_id: other_trace,
                span_id: SpanId(1),
                ref_type: SpanRefType::ChildOf,
            },
            SpanRef {
                trace_id,
                span_id: SpanId(0x647D98),
                ref_type: SpanRefType::ChildOf,
            },
            SpanRef {
                trace_id,
                span_id: SpanId(0x68C4E3),
                ref_type: SpanRefType::ChildOf,
            },
            SpanRef {
                trace_id,
                span_id: SpanId(5),
                ref_type: SpanRefType::FollowsFrom,
            },
        ];

        let out = span_from_jaeger(&span).unwrap();
        assert_eq!(out.parent_span_id, Some(SpanId(0x647D98).into()));
        let types: Vec<_> = out.links.iter().map(|l| l.link_type).collect();
        assert_eq!(
            types,
            vec![
                LinkType::ParentLinked,
                LinkType::ParentLinked,
                LinkType::Unspecified
            ]
        );
    }

    #[test]
    fn test_typed_tags_are_consumed() {
        let mut span = jaeger_span(1);
        span.tags = vec![
            KeyValue::string("span.kind", "server"),
            KeyValue::int64("status.code", 5),
            KeyValue::string("status.message", "not found"),
            KeyValue::bool("error", true),
            KeyValue::string("http.method", "GET"),
            KeyValue::new("payload", TagValue::Binary(vec![1, 2, 3, 4, 3, 2, 1])),
        ];

        let out = span_from_jaeger(&span).unwrap();
        assert_eq!(out.kind, SpanKind::Server);
        assert_eq!(
            out.status,
            Some(Status {
                code: 5,
                message: "not found".into()
            })
        );
        assert_eq!(out.attributes.len(), 2);
        assert_eq!(
            out.attributes.get("payload"),
            Some(&AttributeValue::String("AQIDBAMCAQ==".into()))
        );
        assert_eq!(
            out.end_time,
            Some(Timestamp::new(1_485_467_191, 662_813_000))
        );
    }

    #[test]
    fn test_error_tag_without_failing_status_is_kept() {
        let mut span = jaeger_span(1);
        span.tags = vec![KeyValue::bool("error", true)];
        let out = span_from_jaeger(&span).unwrap();
        assert_eq!(out.status, None);
        assert_eq!(out.attributes.get("error"), Some(&AttributeValue::Bool(true)));

        span.tags = vec![KeyValue::int64("status.code", 0), KeyValue::bool("error", true)];
        let out = span_from_jaeger(&span).unwrap();
        assert_eq!(out.attributes.get("error"), Some(&AttributeValue::Bool(true)));

        span.tags = vec![KeyValue::int64("status.code", 2), KeyValue::bool("error", false)];
        let out = span_from_jaeger(&span).unwrap();
        assert_eq!(out.attributes.get("error"), Some(&AttributeValue::Bool(false)));
    }

    #[test]
    fn test_kind_is_not_inferred() {
        let mut span = jaeger_span(1);
        span.tags = vec![KeyValue::string("http.method", "GET")];
        assert_eq!(span_from_jaeger(&span).unwrap().kind, SpanKind::Unspecified);
    }

    #[test]
    fn test_unknown_process_tags_become_attributes() {
        let process = jaeger::Process {
            service_name: "api".into(),
            tags: vec![
                KeyValue::string("hostname", "api246-sjc1"),
                KeyValue::int64("pid", 13),
                KeyValue::string("opencensus.language", "go_lang"),
                KeyValue::bool("a.bool", true),
                KeyValue::new("a.double", TagValue::Float64(1234.56789)),
            ],
        };
        let node = process_to_node(&process).unwrap();
        assert_eq!(node.service_name(), Some("api"));
        let id = node.identifier.unwrap();
        assert_eq!(id.host_name, "api246-sjc1");
        assert_eq!(id.pid, 13);
        assert_eq!(node.library_info.unwrap().language, Language::GoLang);
        assert_eq!(node.attributes["a.bool"], "true");
        assert_eq!(node.attributes["a.double"], "1234.56789");
    }

    #[test]
    fn test_zero_ids_are_reported() {
        let batch = jaeger::Batch {
            spans: vec![jaeger_span(0), jaeger_span(7)],
            process: jaeger::Process::default(),
        };
        let translated = jaeger_to_trace_batch(&batch);
        assert_eq!(translated.value.items.len(), 1);
        assert_eq!(
            translated.errors,
            vec![TranslationError::ZeroId { field: "span_id" }]
        );
        assert_eq!(translated.value.node, None);
    }
}
