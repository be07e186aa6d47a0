use chrono::{DateTime, Utc};
use std::time::Duration;

use super::model::{self as jaeger, KeyValue, SpanRef, SpanRefType, TagValue};
use super::tags;
use crate::convert::{TranslationError, Translated};
use crate::model::{
    AttributeValue, Attributes, Language, LinkType, Node, Span, SpanKind, TimeEvent,
    TimeEventValue, Timestamp, TraceBatch,
};

/// Translate a batch of common spans into a Jaeger batch.
///
/// Spans that cannot be represented (zero ids, unrepresentable timestamps)
/// are reported and skipped; the rest are translated.
pub fn trace_batch_to_jaeger(batch: &TraceBatch) -> Translated<jaeger::Batch> {
    let mut errors = Vec::new();
    let mut spans = Vec::with_capacity(batch.items.len());
    for span in &batch.items {
        match span_to_jaeger(span) {
            Ok(span) => spans.push(span),
            Err(e) => errors.push(e),
        }
    }
    Translated {
        value: jaeger::Batch {
            spans,
            process: node_to_process(batch.node.as_ref()),
        },
        errors,
    }
}

/// A missing node yields an empty process rather than none at all.
pub fn node_to_process(node: Option<&Node>) -> jaeger::Process {
    let Some(node) = node else {
        return jaeger::Process::default();
    };

    let mut process_tags = Vec::new();
    if let Some(id) = &node.identifier {
        if !id.host_name.is_empty() {
            process_tags.push(KeyValue::string(tags::HOSTNAME, id.host_name.clone()));
        }
        if id.pid != 0 {
            process_tags.push(KeyValue::int64(tags::PID, i64::from(id.pid)));
        }
        if let Some(started) = id.start_timestamp.and_then(|ts| ts.to_rfc3339()) {
            process_tags.push(KeyValue::string(tags::START_TIME, started));
        }
    }
    if let Some(lib) = &node.library_info {
        if lib.language != Language::Unspecified {
            process_tags.push(KeyValue::string(tags::LANGUAGE, lib.language.as_str()));
        }
        if !lib.exporter_version.is_empty() {
            process_tags.push(KeyValue::string(
                tags::EXPORTER_VERSION,
                lib.exporter_version.clone(),
            ));
        }
        if !lib.core_library_version.is_empty() {
            process_tags.push(KeyValue::string(
                tags::CORE_LIB_VERSION,
                lib.core_library_version.clone(),
            ));
        }
    }
    for (key, value) in &node.attributes {
        process_tags.push(KeyValue::new(key.clone(), infer_tag_value(value)));
    }

    jaeger::Process {
        service_name: node.service_name().unwrap_or_default().to_string(),
        tags: process_tags,
    }
}

/// Node attributes are untyped strings; recover the most specific type.
fn infer_tag_value(value: &str) -> TagValue {
    match value {
        "true" => return TagValue::Bool(true),
        "false" => return TagValue::Bool(false),
        _ => {}
    }
    if let Ok(i) = value.parse::<i64>() {
        return TagValue::Int64(i);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() => TagValue::Float64(f),
        _ => TagValue::String(value.to_string()),
    }
}

fn span_to_jaeger(span: &Span) -> Result<jaeger::Span, TranslationError> {
    if span.trace_id.is_zero() {
        return Err(TranslationError::ZeroId { field: "trace_id" });
    }
    if span.span_id.is_zero() {
        return Err(TranslationError::ZeroId { field: "span_id" });
    }

    let trace_id = jaeger::TraceId::from(span.trace_id);
    let start = match span.start_time {
        Some(ts) => to_datetime(&ts)?,
        None => DateTime::<Utc>::UNIX_EPOCH,
    };
    let duration = match (span.start_time, span.end_time) {
        (Some(start), Some(end)) => end.checked_duration_since(&start).unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    };

    let mut references = Vec::with_capacity(span.links.len() + 1);
    if let Some(parent) = span.parent_span_id.filter(|id| !id.is_zero()) {
        references.push(SpanRef {
            trace_id,
            span_id: parent.into(),
            ref_type: SpanRefType::ChildOf,
        });
    }
    for link in &span.links {
        let ref_type = match link.link_type {
            LinkType::ParentLinked => SpanRefType::ChildOf,
            LinkType::ChildLinked | LinkType::Unspecified => SpanRefType::FollowsFrom,
        };
        references.push(SpanRef {
            trace_id: link.trace_id.into(),
            span_id: link.span_id.into(),
            ref_type,
        });
    }

    let mut span_tags = attributes_to_tags(&span.attributes);
    match span.kind {
        SpanKind::Server | SpanKind::Client => {
            span_tags.push(KeyValue::string(tags::SPAN_KIND, span.kind.as_str()));
        }
        SpanKind::Unspecified => {}
    }
    if let Some(status) = &span.status {
        span_tags.push(KeyValue::int64(tags::STATUS_CODE, i64::from(status.code)));
        if !status.message.is_empty() {
            span_tags.push(KeyValue::string(tags::STATUS_MESSAGE, status.message.clone()));
        }
        if status.is_error() && !span.attributes.contains_key(tags::ERROR) {
            span_tags.push(KeyValue::bool(tags::ERROR, true));
        }
    }

    let mut logs = Vec::with_capacity(span.time_events.len());
    for event in &span.time_events {
        logs.push(time_event_to_log(event, start)?);
    }

    Ok(jaeger::Span {
        trace_id,
        span_id: span.span_id.into(),
        operation_name: span.name.clone(),
        references,
        flags: 0,
        start_time: start,
        duration,
        tags: span_tags,
        logs,
        process: None,
        warnings: Vec::new(),
    })
}

fn time_event_to_log(
    event: &TimeEvent,
    span_start: DateTime<Utc>,
) -> Result<jaeger::Log, TranslationError> {
    let timestamp = match &event.time {
        Some(ts) => to_datetime(ts)?,
        None => span_start,
    };
    let fields = match &event.value {
        TimeEventValue::Annotation(annotation) => {
            let mut fields = attributes_to_tags(&annotation.attributes);
            if let Some(description) = &annotation.description {
                fields.push(KeyValue::string(tags::DESCRIPTION, description.clone()));
            }
            fields
        }
        TimeEventValue::MessageEvent(message) => vec![
            KeyValue::string(tags::MESSAGE_EVENT_TYPE, message.direction.as_str()),
            KeyValue::int64(tags::MESSAGE_EVENT_ID, message.id as i64),
            KeyValue::int64(
                tags::MESSAGE_EVENT_UNCOMPRESSED_SIZE,
                message.uncompressed_size as i64,
            ),
            KeyValue::int64(
                tags::MESSAGE_EVENT_COMPRESSED_SIZE,
                message.compressed_size as i64,
            ),
        ],
    };
    Ok(jaeger::Log { timestamp, fields })
}

fn attributes_to_tags(attributes: &Attributes) -> Vec<KeyValue> {
    attributes
        .iter()
        .map(|(key, value)| {
            let value = match value {
                AttributeValue::String(s) => TagValue::String(s.clone()),
                AttributeValue::Int(i) => TagValue::Int64(*i),
                AttributeValue::Bool(b) => TagValue::Bool(*b),
                AttributeValue::Double(d) => TagValue::Float64(*d),
            };
            KeyValue::new(key.clone(), value)
        })
        .collect()
}

fn to_datetime(ts: &Timestamp) -> Result<DateTime<Utc>, TranslationError> {
    ts.to_datetime().ok_or_else(|| {
        TranslationError::InvalidTimestamp(format!("{}s {}ns", ts.seconds, ts.nanos))
    })
}
