/// One frame sent by an exporting client. A connection carries a single
/// signal; the first frame decides which.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientFrame {
    #[prost(oneof = "client_frame::Payload", tags = "1, 2")]
    pub payload: ::core::option::Option<client_frame::Payload>,
}
/// Nested message and enum types in `ClientFrame`.
pub mod client_frame {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "1")]
        Traces(super::super::super::super::opencensus::proto::agent::trace::v1::ExportTraceServiceRequest),
        #[prost(message, tag = "2")]
        Metrics(super::super::super::super::opencensus::proto::agent::metrics::v1::ExportMetricsServiceRequest),
    }
}
/// The single frame a server writes before closing the connection.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamStatus {
    #[prost(enumeration = "StatusCode", tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    ProtocolViolation = 1,
    InvalidArgument = 2,
    Internal = 3,
    Unavailable = 4,
}
impl StatusCode {
    /// String value of the enum field names used in the ProtoBuf definition.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ProtocolViolation => "PROTOCOL_VIOLATION",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}
