/// Defines a Metric which has one or more timeseries.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metric {
    #[prost(message, optional, tag = "1")]
    pub metric_descriptor: ::core::option::Option<MetricDescriptor>,
    #[prost(message, repeated, tag = "2")]
    pub timeseries: ::prost::alloc::vec::Vec<TimeSeries>,
    #[prost(message, optional, tag = "3")]
    pub resource: ::core::option::Option<super::super::resource::v1::Resource>,
}
/// Defines a metric type and its schema.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetricDescriptor {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub description: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub unit: ::prost::alloc::string::String,
    #[prost(enumeration = "metric_descriptor::Type", tag = "4")]
    pub r#type: i32,
    #[prost(message, repeated, tag = "5")]
    pub label_keys: ::prost::alloc::vec::Vec<LabelKey>,
}
/// Nested message and enum types in `MetricDescriptor`.
pub mod metric_descriptor {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unspecified = 0,
        GaugeInt64 = 1,
        GaugeDouble = 2,
        GaugeDistribution = 3,
        CumulativeInt64 = 4,
        CumulativeDouble = 5,
        CumulativeDistribution = 6,
        Summary = 7,
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LabelKey {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub description: ::prost::alloc::string::String,
}
/// A collection of data points that describes the time-varying values
/// of a metric.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeSeries {
    #[prost(message, optional, tag = "1")]
    pub start_timestamp: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, repeated, tag = "2")]
    pub label_values: ::prost::alloc::vec::Vec<LabelValue>,
    #[prost(message, repeated, tag = "3")]
    pub points: ::prost::alloc::vec::Vec<Point>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LabelValue {
    #[prost(string, tag = "1")]
    pub value: ::prost::alloc::string::String,
    /// If false the value field is ignored and considered not set.
    #[prost(bool, tag = "2")]
    pub has_value: bool,
}
/// A timestamped measurement.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Point {
    #[prost(message, optional, tag = "1")]
    pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(oneof = "point::Value", tags = "2, 3, 4, 5")]
    pub value: ::core::option::Option<point::Value>,
}
/// Nested message and enum types in `Point`.
pub mod point {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(int64, tag = "2")]
        Int64Value(i64),
        #[prost(double, tag = "3")]
        DoubleValue(f64),
        #[prost(message, tag = "4")]
        DistributionValue(super::DistributionValue),
        #[prost(message, tag = "5")]
        SummaryValue(super::SummaryValue),
    }
}
/// Distribution of values with optional explicit bucket bounds.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DistributionValue {
    #[prost(int64, tag = "1")]
    pub count: i64,
    #[prost(double, tag = "2")]
    pub sum: f64,
    #[prost(double, tag = "3")]
    pub sum_of_squared_deviation: f64,
    #[prost(message, optional, tag = "4")]
    pub bucket_options: ::core::option::Option<distribution_value::BucketOptions>,
    #[prost(message, repeated, tag = "5")]
    pub buckets: ::prost::alloc::vec::Vec<distribution_value::Bucket>,
}
/// Nested message and enum types in `DistributionValue`.
pub mod distribution_value {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct BucketOptions {
        #[prost(oneof = "bucket_options::Type", tags = "1")]
        pub r#type: ::core::option::Option<bucket_options::Type>,
    }
    /// Nested message and enum types in `BucketOptions`.
    pub mod bucket_options {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Explicit {
            #[prost(double, repeated, tag = "1")]
            pub bounds: ::prost::alloc::vec::Vec<f64>,
        }
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Type {
            #[prost(message, tag = "1")]
            Explicit(Explicit),
        }
    }
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Bucket {
        #[prost(int64, tag = "1")]
        pub count: i64,
        #[prost(message, optional, tag = "2")]
        pub exemplar: ::core::option::Option<Exemplar>,
    }
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Exemplar {
        #[prost(double, tag = "1")]
        pub value: f64,
        #[prost(message, optional, tag = "2")]
        pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
        #[prost(map = "string, string", tag = "3")]
        pub attachments:
            ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
    }
}
/// Pre-aggregated quantiles over a sliding window.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryValue {
    #[prost(message, optional, tag = "1")]
    pub count: ::core::option::Option<i64>,
    #[prost(message, optional, tag = "2")]
    pub sum: ::core::option::Option<f64>,
    #[prost(message, optional, tag = "3")]
    pub snapshot: ::core::option::Option<summary_value::Snapshot>,
}
/// Nested message and enum types in `SummaryValue`.
pub mod summary_value {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Snapshot {
        #[prost(message, optional, tag = "1")]
        pub count: ::core::option::Option<i64>,
        #[prost(message, optional, tag = "2")]
        pub sum: ::core::option::Option<f64>,
        #[prost(message, repeated, tag = "3")]
        pub percentile_values: ::prost::alloc::vec::Vec<snapshot::ValueAtPercentile>,
    }
    /// Nested message and enum types in `Snapshot`.
    pub mod snapshot {
        #[derive(Clone, Copy, PartialEq, ::prost::Message)]
        pub struct ValueAtPercentile {
            #[prost(double, tag = "1")]
            pub percentile: f64,
            #[prost(double, tag = "2")]
            pub value: f64,
        }
    }
}
