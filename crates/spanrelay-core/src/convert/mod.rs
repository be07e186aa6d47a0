//! Conversions between the OpenCensus wire messages and the common model.
//!
//! Decoding is per item: a span or metric that cannot be represented is
//! reported as a [`TranslationError`] while its siblings continue.

mod error;
mod metrics;
mod traces;

pub use error::TranslationError;
pub use metrics::{decode_metrics_request, encode_metrics_request};
pub use traces::{decode_trace_request, encode_trace_request};

use std::collections::BTreeMap;

use spanrelay_proto::opencensus::proto::agent::common::v1 as pb_common;
use spanrelay_proto::opencensus::proto::resource::v1 as pb_resource;

use crate::model::{Language, LibraryInfo, Node, ProcessIdentifier, Resource, ServiceInfo, Timestamp};

/// Output of a per-item translation: everything that converted, plus one
/// error per item that did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated<T> {
    pub value: T,
    pub errors: Vec<TranslationError>,
}

impl<T> Translated<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    /// Number of items that were dropped during translation.
    pub fn dropped(&self) -> usize {
        self.errors.len()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Translated<U> {
        Translated {
            value: f(self.value),
            errors: self.errors,
        }
    }
}

impl From<spanrelay_proto::Timestamp> for Timestamp {
    fn from(ts: spanrelay_proto::Timestamp) -> Self {
        Timestamp::new(ts.seconds, ts.nanos)
    }
}

impl From<Timestamp> for spanrelay_proto::Timestamp {
    fn from(ts: Timestamp) -> Self {
        spanrelay_proto::Timestamp {
            seconds: ts.seconds,
            nanos: ts.nanos,
        }
    }
}

impl From<pb_resource::Resource> for Resource {
    fn from(resource: pb_resource::Resource) -> Self {
        Resource {
            resource_type: resource.r#type,
            labels: resource.labels.into_iter().collect(),
        }
    }
}

impl From<Resource> for pb_resource::Resource {
    fn from(resource: Resource) -> Self {
        pb_resource::Resource {
            r#type: resource.resource_type,
            labels: resource.labels.into_iter().collect(),
        }
    }
}

impl From<pb_common::Node> for Node {
    fn from(node: pb_common::Node) -> Self {
        Node {
            identifier: node.identifier.map(|id| ProcessIdentifier {
                host_name: id.host_name,
                pid: id.pid,
                start_timestamp: id.start_timestamp.map(Timestamp::from),
            }),
            library_info: node.library_info.map(|lib| LibraryInfo {
                language: language_from_proto(lib.language()),
                exporter_version: lib.exporter_version,
                core_library_version: lib.core_library_version,
            }),
            service_info: node.service_info.map(|svc| ServiceInfo { name: svc.name }),
            attributes: node.attributes.into_iter().collect::<BTreeMap<_, _>>(),
        }
    }
}

impl From<Node> for pb_common::Node {
    fn from(node: Node) -> Self {
        pb_common::Node {
            identifier: node.identifier.map(|id| pb_common::ProcessIdentifier {
                host_name: id.host_name,
                pid: id.pid,
                start_timestamp: id.start_timestamp.map(Into::into),
            }),
            library_info: node.library_info.map(|lib| pb_common::LibraryInfo {
                language: language_to_proto(lib.language) as i32,
                exporter_version: lib.exporter_version,
                core_library_version: lib.core_library_version,
            }),
            service_info: node
                .service_info
                .map(|svc| pb_common::ServiceInfo { name: svc.name }),
            attributes: node.attributes.into_iter().collect(),
        }
    }
}

fn language_from_proto(language: pb_common::library_info::Language) -> Language {
    use pb_common::library_info::Language as Pb;
    match language {
        Pb::Unspecified => Language::Unspecified,
        Pb::Cpp => Language::Cpp,
        Pb::CSharp => Language::CSharp,
        Pb::Erlang => Language::Erlang,
        Pb::GoLang => Language::GoLang,
        Pb::Java => Language::Java,
        Pb::NodeJs => Language::NodeJs,
        Pb::Php => Language::Php,
        Pb::Python => Language::Python,
        Pb::Ruby => Language::Ruby,
        Pb::WebJs => Language::WebJs,
    }
}

fn language_to_proto(language: Language) -> pb_common::library_info::Language {
    use pb_common::library_info::Language as Pb;
    match language {
        Language::Unspecified => Pb::Unspecified,
        Language::Cpp => Pb::Cpp,
        Language::CSharp => Pb::CSharp,
        Language::Erlang => Pb::Erlang,
        Language::GoLang => Pb::GoLang,
        Language::Java => Pb::Java,
        Language::NodeJs => Pb::NodeJs,
        Language::Php => Pb::Php,
        Language::Python => Pb::Python,
        Language::Ruby => Pb::Ruby,
        Language::WebJs => Pb::WebJs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_node_round_trip() {
        let node = pb_common::Node {
            identifier: Some(pb_common::ProcessIdentifier {
                host_name: "api246-sjc1".to_string(),
                pid: 13,
                start_timestamp: Some(spanrelay_proto::Timestamp {
                    seconds: 1_541_015_015,
                    nanos: 789,
                }),
            }),
            library_info: Some(pb_common::LibraryInfo {
                language: pb_common::library_info::Language::Java as i32,
                exporter_version: "0.13.0".to_string(),
                core_library_version: "0.13.2".to_string(),
            }),
            service_info: Some(pb_common::ServiceInfo {
                name: "frontend".to_string(),
            }),
            attributes: HashMap::from([("a1".to_string(), "b2".to_string())]),
        };

        let model = Node::from(node.clone());
        assert_eq!(model.service_name(), Some("frontend"));
        assert_eq!(
            model.library_info.as_ref().map(|l| l.language),
            Some(Language::Java)
        );
        assert_eq!(pb_common::Node::from(model), node);
    }

    #[test]
    fn test_unknown_language_code_maps_to_unspecified() {
        let node = pb_common::Node {
            library_info: Some(pb_common::LibraryInfo {
                language: 99,
                ..Default::default()
            }),
            ..Default::default()
        };
        let model = Node::from(node);
        assert_eq!(
            model.library_info.map(|l| l.language),
            Some(Language::Unspecified)
        );
    }
}
