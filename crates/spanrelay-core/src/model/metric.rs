use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Resource, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub descriptor: MetricDescriptor,
    #[serde(default)]
    pub timeseries: Vec<TimeSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

impl Metric {
    /// Number of points across all series.
    pub fn point_count(&self) -> usize {
        self.timeseries.iter().map(|ts| ts.points.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricDescriptor {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub metric_type: MetricType,
    pub label_keys: Vec<LabelKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    #[default]
    Unspecified,
    GaugeInt64,
    GaugeDouble,
    GaugeDistribution,
    CumulativeInt64,
    CumulativeDouble,
    CumulativeDistribution,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelKey {
    pub key: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<Timestamp>,
    /// `None` marks a label without a value.
    pub label_values: Vec<Option<String>>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    pub value: PointValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointValue {
    Int64(i64),
    Double(f64),
    Distribution(DistributionValue),
    Summary(SummaryValue),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionValue {
    pub count: i64,
    pub sum: f64,
    pub sum_of_squared_deviation: f64,
    /// Explicit bucket bounds; `None` when the producer sent no bucket options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_bounds: Option<Vec<f64>>,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bucket {
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemplar: Option<Exemplar>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Exemplar {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    pub attachments: BTreeMap<String, String>,
}

/// Count and sum are optional on the wire and stay optional here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryValue {
    pub count: Option<i64>,
    pub sum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SummarySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySnapshot {
    pub count: Option<i64>,
    pub sum: Option<f64>,
    pub percentile_values: Vec<ValueAtPercentile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueAtPercentile {
    pub percentile: f64,
    pub value: f64,
}
