/// A span represents a single operation within a trace.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Span {
    /// 16-byte identifier of the trace.
    #[prost(bytes = "vec", tag = "1")]
    pub trace_id: ::prost::alloc::vec::Vec<u8>,
    /// 8-byte identifier of the span.
    #[prost(bytes = "vec", tag = "2")]
    pub span_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "15")]
    pub tracestate: ::core::option::Option<span::Tracestate>,
    /// Empty for root spans.
    #[prost(bytes = "vec", tag = "3")]
    pub parent_span_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub name: ::core::option::Option<TruncatableString>,
    #[prost(enumeration = "span::SpanKind", tag = "14")]
    pub kind: i32,
    #[prost(message, optional, tag = "5")]
    pub start_time: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "6")]
    pub end_time: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "7")]
    pub attributes: ::core::option::Option<span::Attributes>,
    #[prost(message, optional, tag = "9")]
    pub time_events: ::core::option::Option<span::TimeEvents>,
    #[prost(message, optional, tag = "10")]
    pub links: ::core::option::Option<span::Links>,
    #[prost(message, optional, tag = "11")]
    pub status: ::core::option::Option<Status>,
    #[prost(message, optional, tag = "16")]
    pub resource: ::core::option::Option<super::super::resource::v1::Resource>,
    #[prost(message, optional, tag = "12")]
    pub same_process_as_parent_span: ::core::option::Option<bool>,
    #[prost(message, optional, tag = "13")]
    pub child_span_count: ::core::option::Option<u32>,
}
/// Nested message and enum types in `Span`.
pub mod span {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Tracestate {
        #[prost(message, repeated, tag = "1")]
        pub entries: ::prost::alloc::vec::Vec<tracestate::Entry>,
    }
    /// Nested message and enum types in `Tracestate`.
    pub mod tracestate {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Entry {
            #[prost(string, tag = "1")]
            pub key: ::prost::alloc::string::String,
            #[prost(string, tag = "2")]
            pub value: ::prost::alloc::string::String,
        }
    }
    /// A set of attributes, each with a key and a value.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Attributes {
        #[prost(map = "string, message", tag = "1")]
        pub attribute_map: ::std::collections::HashMap<
            ::prost::alloc::string::String,
            super::AttributeValue,
        >,
        #[prost(int32, tag = "2")]
        pub dropped_attributes_count: i32,
    }
    /// A time-stamped annotation or message event in the Span.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TimeEvent {
        #[prost(message, optional, tag = "1")]
        pub time: ::core::option::Option<::prost_types::Timestamp>,
        #[prost(oneof = "time_event::Value", tags = "2, 3")]
        pub value: ::core::option::Option<time_event::Value>,
    }
    /// Nested message and enum types in `TimeEvent`.
    pub mod time_event {
        /// A text annotation with a set of attributes.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Annotation {
            #[prost(message, optional, tag = "1")]
            pub description: ::core::option::Option<super::super::TruncatableString>,
            #[prost(message, optional, tag = "2")]
            pub attributes: ::core::option::Option<super::Attributes>,
        }
        /// An event describing a message sent/received between Spans.
        #[derive(Clone, Copy, PartialEq, ::prost::Message)]
        pub struct MessageEvent {
            #[prost(enumeration = "message_event::Type", tag = "1")]
            pub r#type: i32,
            #[prost(uint64, tag = "2")]
            pub id: u64,
            #[prost(uint64, tag = "3")]
            pub uncompressed_size: u64,
            #[prost(uint64, tag = "4")]
            pub compressed_size: u64,
        }
        /// Nested message and enum types in `MessageEvent`.
        pub mod message_event {
            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum Type {
                Unspecified = 0,
                Sent = 1,
                Received = 2,
            }
        }
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Value {
            #[prost(message, tag = "2")]
            Annotation(Annotation),
            #[prost(message, tag = "3")]
            MessageEvent(MessageEvent),
        }
    }
    /// A collection of `TimeEvent`s.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TimeEvents {
        #[prost(message, repeated, tag = "1")]
        pub time_event: ::prost::alloc::vec::Vec<TimeEvent>,
        #[prost(int32, tag = "2")]
        pub dropped_annotations_count: i32,
        #[prost(int32, tag = "3")]
        pub dropped_message_events_count: i32,
    }
    /// A pointer from the current span to another span.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Link {
        #[prost(bytes = "vec", tag = "1")]
        pub trace_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub span_id: ::prost::alloc::vec::Vec<u8>,
        #[prost(enumeration = "link::Type", tag = "3")]
        pub r#type: i32,
        #[prost(message, optional, tag = "4")]
        pub attributes: ::core::option::Option<Attributes>,
    }
    /// Nested message and enum types in `Link`.
    pub mod link {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Type {
            Unspecified = 0,
            ChildLinkedSpan = 1,
            ParentLinkedSpan = 2,
        }
    }
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Links {
        #[prost(message, repeated, tag = "1")]
        pub link: ::prost::alloc::vec::Vec<Link>,
        #[prost(int32, tag = "2")]
        pub dropped_links_count: i32,
    }
    /// Type of span. Can be used to specify additional relationships between spans
    /// in addition to a parent/child relationship.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum SpanKind {
        Unspecified = 0,
        Server = 1,
        Client = 2,
    }
}
/// The `Status` type defines a logical error model.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Status {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}
/// The value of an Attribute.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttributeValue {
    #[prost(oneof = "attribute_value::Value", tags = "1, 2, 3, 4")]
    pub value: ::core::option::Option<attribute_value::Value>,
}
/// Nested message and enum types in `AttributeValue`.
pub mod attribute_value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(message, tag = "1")]
        StringValue(super::TruncatableString),
        #[prost(int64, tag = "2")]
        IntValue(i64),
        #[prost(bool, tag = "3")]
        BoolValue(bool),
        #[prost(double, tag = "4")]
        DoubleValue(f64),
    }
}
/// A string that might be shortened to a specified length.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TruncatableString {
    #[prost(string, tag = "1")]
    pub value: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub truncated_byte_count: i32,
}
