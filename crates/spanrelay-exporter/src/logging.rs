use async_trait::async_trait;
use spanrelay_core::{Batch, ExportContext, Metric, Span};
use tracing::{debug, info};

use crate::error::ExporterError;
use crate::helper::Push;

/// Logs a summary line per batch, and each item name when verbose.
#[derive(Debug, Clone, Default)]
pub struct LoggingExporter {
    verbose: bool,
}

impl LoggingExporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn service<T>(batch: &Batch<T>) -> &str {
    batch
        .node
        .as_ref()
        .and_then(|n| n.service_name())
        .unwrap_or("")
}

#[async_trait]
impl Push<Span> for LoggingExporter {
    async fn push(&self, ctx: &ExportContext, batch: &Batch<Span>) -> Result<usize, ExporterError> {
        info!(
            receiver = %ctx.receiver,
            service = service(batch),
            source_format = %batch.source_format,
            spans = batch.len(),
            "Received spans"
        );
        if self.verbose {
            for span in &batch.items {
                debug!(
                    trace_id = %span.trace_id,
                    span_id = %span.span_id,
                    name = %span.name,
                    kind = span.kind.as_str(),
                    "span"
                );
            }
        }
        Ok(0)
    }
}

#[async_trait]
impl Push<Metric> for LoggingExporter {
    async fn push(
        &self,
        ctx: &ExportContext,
        batch: &Batch<Metric>,
    ) -> Result<usize, ExporterError> {
        let points: usize = batch.items.iter().map(Metric::point_count).sum();
        info!(
            receiver = %ctx.receiver,
            service = service(batch),
            metrics = batch.len(),
            points,
            "Received metrics"
        );
        if self.verbose {
            for metric in &batch.items {
                debug!(
                    name = %metric.descriptor.name,
                    series = metric.timeseries.len(),
                    "metric"
                );
            }
        }
        Ok(0)
    }
}
