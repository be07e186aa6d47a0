use spanrelay_proto::opencensus::proto::agent::metrics::v1::ExportMetricsServiceRequest;
use spanrelay_proto::opencensus::proto::metrics::v1 as pb;

use super::{TranslationError, Translated};
use crate::model::{
    Bucket, DistributionValue, Exemplar, ExportMessage, LabelKey, Metric, MetricDescriptor,
    MetricType, Node, Point, PointValue, Resource, SummarySnapshot, SummaryValue, TimeSeries,
    Timestamp, ValueAtPercentile,
};

use pb::distribution_value::bucket_options;

/// Decode one wire message into the common model. Metrics without a
/// descriptor, or with points that carry no value, are reported and dropped.
pub fn decode_metrics_request(
    request: ExportMetricsServiceRequest,
) -> Translated<ExportMessage<Metric>> {
    let mut errors = Vec::new();
    let mut metrics = Vec::with_capacity(request.metrics.len());

    for metric in request.metrics {
        match decode_metric(metric) {
            Ok(metric) => metrics.push(metric),
            Err(e) => errors.push(e),
        }
    }

    Translated {
        value: ExportMessage {
            node: request.node.map(Node::from),
            resource: request.resource.map(Resource::from),
            items: metrics,
        },
        errors,
    }
}

pub fn encode_metrics_request(
    node: Option<Node>,
    resource: Option<Resource>,
    metrics: Vec<Metric>,
) -> ExportMetricsServiceRequest {
    ExportMetricsServiceRequest {
        node: node.map(Into::into),
        metrics: metrics.into_iter().map(encode_metric).collect(),
        resource: resource.map(Into::into),
    }
}

fn decode_metric(metric: pb::Metric) -> Result<Metric, TranslationError> {
    let descriptor = metric
        .metric_descriptor
        .ok_or(TranslationError::MissingDescriptor)?;

    let metric_type = match pb::metric_descriptor::Type::try_from(descriptor.r#type) {
        Ok(pb::metric_descriptor::Type::Unspecified) => MetricType::Unspecified,
        Ok(pb::metric_descriptor::Type::GaugeInt64) => MetricType::GaugeInt64,
        Ok(pb::metric_descriptor::Type::GaugeDouble) => MetricType::GaugeDouble,
        Ok(pb::metric_descriptor::Type::GaugeDistribution) => MetricType::GaugeDistribution,
        Ok(pb::metric_descriptor::Type::CumulativeInt64) => MetricType::CumulativeInt64,
        Ok(pb::metric_descriptor::Type::CumulativeDouble) => MetricType::CumulativeDouble,
        Ok(pb::metric_descriptor::Type::CumulativeDistribution) => {
            MetricType::CumulativeDistribution
        }
        Ok(pb::metric_descriptor::Type::Summary) => MetricType::Summary,
        Err(_) => {
            return Err(TranslationError::UnsupportedMetricType {
                name: descriptor.name,
                metric_type: descriptor.r#type.to_string(),
            })
        }
    };

    let mut timeseries = Vec::with_capacity(metric.timeseries.len());
    for series in metric.timeseries {
        let mut points = Vec::with_capacity(series.points.len());
        for point in series.points {
            let value = match point.value {
                Some(pb::point::Value::Int64Value(v)) => PointValue::Int64(v),
                Some(pb::point::Value::DoubleValue(v)) => PointValue::Double(v),
                Some(pb::point::Value::DistributionValue(v)) => {
                    PointValue::Distribution(decode_distribution(v))
                }
                Some(pb::point::Value::SummaryValue(v)) => PointValue::Summary(decode_summary(v)),
                None => {
                    return Err(TranslationError::MissingPointValue {
                        name: descriptor.name,
                    })
                }
            };
            points.push(Point {
                timestamp: point.timestamp.map(Timestamp::from),
                value,
            });
        }
        timeseries.push(TimeSeries {
            start_timestamp: series.start_timestamp.map(Timestamp::from),
            label_values: series
                .label_values
                .into_iter()
                .map(|lv| lv.has_value.then_some(lv.value))
                .collect(),
            points,
        });
    }

    Ok(Metric {
        descriptor: MetricDescriptor {
            name: descriptor.name,
            description: descriptor.description,
            unit: descriptor.unit,
            metric_type,
            label_keys: descriptor
                .label_keys
                .into_iter()
                .map(|k| LabelKey {
                    key: k.key,
                    description: k.description,
                })
                .collect(),
        },
        timeseries,
        resource: metric.resource.map(Resource::from),
    })
}

fn decode_distribution(value: pb::DistributionValue) -> DistributionValue {
    DistributionValue {
        count: value.count,
        sum: value.sum,
        sum_of_squared_deviation: value.sum_of_squared_deviation,
        bucket_bounds: value.bucket_options.map(|options| match options.r#type {
            Some(bucket_options::Type::Explicit(explicit)) => explicit.bounds,
            None => Vec::new(),
        }),
        buckets: value
            .buckets
            .into_iter()
            .map(|bucket| Bucket {
                count: bucket.count,
                exemplar: bucket.exemplar.map(|e| Exemplar {
                    value: e.value,
                    timestamp: e.timestamp.map(Timestamp::from),
                    attachments: e.attachments.into_iter().collect(),
                }),
            })
            .collect(),
    }
}

fn decode_summary(value: pb::SummaryValue) -> SummaryValue {
    SummaryValue {
        count: value.count,
        sum: value.sum,
        snapshot: value.snapshot.map(|snapshot| SummarySnapshot {
            count: snapshot.count,
            sum: snapshot.sum,
            percentile_values: snapshot
                .percentile_values
                .into_iter()
                .map(|p| ValueAtPercentile {
                    percentile: p.percentile,
                    value: p.value,
                })
                .collect(),
        }),
    }
}

fn encode_distribution(value: DistributionValue) -> pb::DistributionValue {
    pb::DistributionValue {
        count: value.count,
        sum: value.sum,
        sum_of_squared_deviation: value.sum_of_squared_deviation,
        bucket_options: value
            .bucket_bounds
            .map(|bounds| pb::distribution_value::BucketOptions {
                r#type: Some(bucket_options::Type::Explicit(bucket_options::Explicit {
                    bounds,
                })),
            }),
        buckets: value
            .buckets
            .into_iter()
            .map(|bucket| pb::distribution_value::Bucket {
                count: bucket.count,
                exemplar: bucket
                    .exemplar
                    .map(|e| pb::distribution_value::Exemplar {
                        value: e.value,
                        timestamp: e.timestamp.map(Into::into),
                        attachments: e.attachments.into_iter().collect(),
                    }),
            })
            .collect(),
    }
}

fn encode_summary(value: SummaryValue) -> pb::SummaryValue {
    pb::SummaryValue {
        count: value.count,
        sum: value.sum,
        snapshot: value
            .snapshot
            .map(|snapshot| pb::summary_value::Snapshot {
                count: snapshot.count,
                sum: snapshot.sum,
                percentile_values: snapshot
                    .percentile_values
                    .into_iter()
                    .map(|p| pb::summary_value::snapshot::ValueAtPercentile {
                        percentile: p.percentile,
                        value: p.value,
                    })
                    .collect(),
            }),
    }
}

fn encode_metric(metric: Metric) -> pb::Metric {
    let metric_type = match metric.descriptor.metric_type {
        MetricType::Unspecified => pb::metric_descriptor::Type::Unspecified,
        MetricType::GaugeInt64 => pb::metric_descriptor::Type::GaugeInt64,
        MetricType::GaugeDouble => pb::metric_descriptor::Type::GaugeDouble,
        MetricType::GaugeDistribution => pb::metric_descriptor::Type::GaugeDistribution,
        MetricType::CumulativeInt64 => pb::metric_descriptor::Type::CumulativeInt64,
        MetricType::CumulativeDouble => pb::metric_descriptor::Type::CumulativeDouble,
        MetricType::CumulativeDistribution => pb::metric_descriptor::Type::CumulativeDistribution,
        MetricType::Summary => pb::metric_descriptor::Type::Summary,
    };

    pb::Metric {
        metric_descriptor: Some(pb::MetricDescriptor {
            name: metric.descriptor.name,
            description: metric.descriptor.description,
            unit: metric.descriptor.unit,
            r#type: metric_type as i32,
            label_keys: metric
                .descriptor
                .label_keys
                .into_iter()
                .map(|k| pb::LabelKey {
                    key: k.key,
                    description: k.description,
                })
                .collect(),
        }),
        timeseries: metric
            .timeseries
            .into_iter()
            .map(|series| pb::TimeSeries {
                start_timestamp: series.start_timestamp.map(Into::into),
                label_values: series
                    .label_values
                    .into_iter()
                    .map(|value| pb::LabelValue {
                        has_value: value.is_some(),
                        value: value.unwrap_or_default(),
                    })
                    .collect(),
                points: series
                    .points
                    .into_iter()
                    .map(|point| pb::Point {
                        timestamp: point.timestamp.map(Into::into),
                        value: Some(match point.value {
                            PointValue::Int64(v) => pb::point::Value::Int64Value(v),
                            PointValue::Double(v) => pb::point::Value::DoubleValue(v),
                            PointValue::Distribution(v) => {
                                pb::point::Value::DistributionValue(encode_distribution(v))
                            }
                            PointValue::Summary(v) => {
                                pb::point::Value::SummaryValue(encode_summary(v))
                            }
                        }),
                    })
                    .collect(),
            })
            .collect(),
        resource: metric.resource.map(Into::into),
    }
}
