#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExportTraceServiceRequest {
    /// This is required only in the first message on the stream or if the
    /// previous sent ExportTraceServiceRequest message has a different Node.
    #[prost(message, optional, tag = "1")]
    pub node: ::core::option::Option<super::super::common::v1::Node>,
    /// A list of Spans that belong to the last received Node.
    #[prost(message, repeated, tag = "2")]
    pub spans: ::prost::alloc::vec::Vec<super::super::super::trace::v1::Span>,
    /// The resource for the spans in this message that do not have an explicit
    /// resource set.
    #[prost(message, optional, tag = "3")]
    pub resource: ::core::option::Option<super::super::super::resource::v1::Resource>,
}
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ExportTraceServiceResponse {}
