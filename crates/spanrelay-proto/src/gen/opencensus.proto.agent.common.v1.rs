/// Identifier metadata of the Node that produces the span or tracing data.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    #[prost(message, optional, tag = "1")]
    pub identifier: ::core::option::Option<ProcessIdentifier>,
    #[prost(message, optional, tag = "2")]
    pub library_info: ::core::option::Option<LibraryInfo>,
    #[prost(message, optional, tag = "3")]
    pub service_info: ::core::option::Option<ServiceInfo>,
    #[prost(map = "string, string", tag = "4")]
    pub attributes:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}
/// Identifier that uniquely identifies a process within a VM/container.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessIdentifier {
    #[prost(string, tag = "1")]
    pub host_name: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub pid: u32,
    #[prost(message, optional, tag = "3")]
    pub start_timestamp: ::core::option::Option<::prost_types::Timestamp>,
}
/// Information on OpenCensus Library.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LibraryInfo {
    #[prost(enumeration = "library_info::Language", tag = "1")]
    pub language: i32,
    #[prost(string, tag = "2")]
    pub exporter_version: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub core_library_version: ::prost::alloc::string::String,
}
/// Nested message and enum types in `LibraryInfo`.
pub mod library_info {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Language {
        Unspecified = 0,
        Cpp = 1,
        CSharp = 2,
        Erlang = 3,
        GoLang = 4,
        Java = 5,
        NodeJs = 6,
        Php = 7,
        Python = 8,
        Ruby = 9,
        WebJs = 10,
    }
    impl Language {
        /// String value of the enum field names used in the ProtoBuf definition.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Self::Unspecified => "LANGUAGE_UNSPECIFIED",
                Self::Cpp => "CPP",
                Self::CSharp => "C_SHARP",
                Self::Erlang => "ERLANG",
                Self::GoLang => "GO_LANG",
                Self::Java => "JAVA",
                Self::NodeJs => "NODE_JS",
                Self::Php => "PHP",
                Self::Python => "PYTHON",
                Self::Ruby => "RUBY",
                Self::WebJs => "WEB_JS",
            }
        }
    }
}
/// Additional service information.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceInfo {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}
