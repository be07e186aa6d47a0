// spanrelay-proto - OpenCensus agent protocol messages
//
// Messages are checked in under src/gen/ with the same field numbers as the
// upstream opencensus-proto definitions, so the crate builds without protoc.
// The `spanrelay::stream` package holds the framing messages used by the TCP
// export stream.

pub mod opencensus {
    pub mod proto {
        pub mod agent {
            pub mod common {
                pub mod v1 {
                    include!("gen/opencensus.proto.agent.common.v1.rs");
                }
            }
            pub mod trace {
                pub mod v1 {
                    include!("gen/opencensus.proto.agent.trace.v1.rs");
                }
            }
            pub mod metrics {
                pub mod v1 {
                    include!("gen/opencensus.proto.agent.metrics.v1.rs");
                }
            }
        }
        pub mod trace {
            pub mod v1 {
                include!("gen/opencensus.proto.trace.v1.rs");
            }
        }
        pub mod metrics {
            pub mod v1 {
                include!("gen/opencensus.proto.metrics.v1.rs");
            }
        }
        pub mod resource {
            pub mod v1 {
                include!("gen/opencensus.proto.resource.v1.rs");
            }
        }
    }
}

pub mod spanrelay {
    pub mod stream {
        pub mod v1 {
            include!("gen/spanrelay.stream.v1.rs");
        }
    }
}

pub use prost_types::Timestamp;
