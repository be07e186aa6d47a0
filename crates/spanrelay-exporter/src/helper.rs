//! Turns a plain push function into a fully accounted [`Consumer`].

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use spanrelay_core::{Batch, Consumer, ConsumerError, ExportContext, Observability};
use tracing::{debug_span, warn, Instrument};

use crate::error::ExporterError;

/// The part of an exporter that actually ships data somewhere.
///
/// Returns how many items of the batch were dropped on the way (for
/// example because they could not be translated). An `Err` means the whole
/// batch was lost.
#[async_trait]
pub trait Push<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    async fn push(&self, ctx: &ExportContext, batch: &Batch<T>) -> Result<usize, ExporterError>;
}

#[async_trait]
impl<T, P> Push<T> for Arc<P>
where
    T: Send + Sync + 'static,
    P: Push<T> + ?Sized,
{
    async fn push(&self, ctx: &ExportContext, batch: &Batch<T>) -> Result<usize, ExporterError> {
        (**self).push(ctx, batch).await
    }
}

/// A named exporter. Records sent and dropped counts per
/// (receiver, exporter) and optionally traces every push.
pub struct Exporter<T, P> {
    name: Arc<str>,
    push: P,
    observability: Arc<Observability>,
    trace_pushes: bool,
    _signal: PhantomData<fn(T)>,
}

impl<T, P> Exporter<T, P>
where
    T: Send + Sync + 'static,
    P: Push<T>,
{
    pub fn new(
        name: impl Into<String>,
        push: P,
        observability: Arc<Observability>,
    ) -> Result<Self, ExporterError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ExporterError::EmptyName);
        }
        Ok(Self {
            name: name.into(),
            push,
            observability,
            trace_pushes: false,
            _signal: PhantomData,
        })
    }

    /// Wrap every push in a `push` tracing span.
    pub fn with_push_spans(mut self, enabled: bool) -> Self {
        self.trace_pushes = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &P {
        &self.push
    }
}

#[async_trait]
impl<T, P> Consumer<T> for Exporter<T, P>
where
    T: Send + Sync + 'static,
    P: Push<T>,
{
    async fn consume(&self, ctx: &ExportContext, batch: &Batch<T>) -> Result<(), ConsumerError> {
        let items = batch.len();
        let result = if self.trace_pushes {
            let span = debug_span!("push", exporter = %self.name, items);
            self.push.push(ctx, batch).instrument(span).await
        } else {
            self.push.push(ctx, batch).await
        };

        match result {
            Ok(dropped) => {
                let dropped = dropped.min(items);
                self.observability
                    .record_exported(&ctx.receiver, &self.name, items - dropped, dropped);
                Ok(())
            }
            Err(e) => {
                self.observability
                    .record_exported(&ctx.receiver, &self.name, 0, items);
                warn!(
                    exporter = %self.name,
                    receiver = %ctx.receiver,
                    items,
                    error = %e,
                    "Export failed"
                );
                Err(ConsumerError::failed(format!("{}: {}", self.name, e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Push<u32> for Flaky {
        async fn push(&self, _: &ExportContext, batch: &Batch<u32>) -> Result<usize, ExporterError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                // First call loses odd items.
                Ok(batch.items.iter().filter(|i| *i % 2 == 1).count())
            } else {
                Err(ExporterError::Other("backend unavailable".to_string()))
            }
        }
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let push = Flaky {
            calls: AtomicUsize::new(0),
        };
        let err = Exporter::<u32, _>::new("  ", push, Observability::new())
            .err()
            .unwrap();
        assert!(matches!(err, ExporterError::EmptyName));
    }

    #[tokio::test]
    async fn test_counts_sent_and_dropped_per_exporter() {
        let observability = Observability::new();
        let exporter = Exporter::new(
            "flaky",
            Flaky {
                calls: AtomicUsize::new(0),
            },
            observability.clone(),
        )
        .unwrap()
        .with_push_spans(true);

        let ctx = ExportContext::detached("oc");
        let batch = Batch::new("test").with_items(vec![1u32, 2, 3, 4]);

        exporter.consume(&ctx, &batch).await.unwrap();
        let err = exporter.consume(&ctx, &batch).await.unwrap_err();
        assert_eq!(err.to_string(), "flaky: backend unavailable");

        let stats = observability.exporter_stats("oc", "flaky");
        assert_eq!(stats.received, 2);
        assert_eq!(stats.dropped, 6);
    }
}
