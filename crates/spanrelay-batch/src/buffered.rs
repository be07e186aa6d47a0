// Time-windowed buffering in front of a consumer
//
// Batches are grouped by receiver, source format, node and resource, and
// handed downstream as one larger batch when the group is old enough or
// large enough. Whatever is left goes out on shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use spanrelay_core::{Batch, Consumer, ConsumerError, ExportContext, Node, Observability, Resource};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// How long a group may wait before it is flushed.
    pub period: Duration,
    /// Flush a group as soon as it holds this many items.
    pub max_items: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            max_items: 1024,
        }
    }
}

#[derive(Debug)]
struct PendingGroup<T> {
    node: Option<Node>,
    resource: Option<Resource>,
    source_format: String,
    items: Vec<T>,
    ctx: ExportContext,
    created_at: Instant,
}

impl<T> PendingGroup<T> {
    fn new(ctx: &ExportContext, batch: &Batch<T>) -> Self {
        Self {
            node: batch.node.clone(),
            resource: batch.resource.clone(),
            source_format: batch.source_format.clone(),
            items: Vec::new(),
            ctx: ctx.clone(),
            created_at: Instant::now(),
        }
    }

    fn matches(&self, ctx: &ExportContext, batch: &Batch<T>) -> bool {
        self.ctx.receiver == ctx.receiver
            && self.source_format == batch.source_format
            && self.node == batch.node
            && self.resource == batch.resource
    }

    fn should_flush(&self, cfg: &BufferConfig) -> bool {
        self.items.len() >= cfg.max_items || self.created_at.elapsed() >= cfg.period
    }

    fn into_batch(self) -> (ExportContext, Batch<T>) {
        let batch = Batch {
            node: self.node,
            resource: self.resource,
            items: self.items,
            source_format: self.source_format,
        };
        (self.ctx, batch)
    }
}

/// A [`Consumer`] that accumulates batches and forwards them in larger
/// groups. Items are copied out of each incoming batch.
pub struct BufferedConsumer<T: Send + Sync + 'static> {
    config: BufferConfig,
    next: Arc<dyn Consumer<T>>,
    observability: Arc<Observability>,
    groups: Mutex<Vec<PendingGroup<T>>>,
}

impl<T> BufferedConsumer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        config: BufferConfig,
        next: Arc<dyn Consumer<T>>,
        observability: Arc<Observability>,
    ) -> Self {
        Self {
            config,
            next,
            observability,
            groups: Mutex::new(Vec::new()),
        }
    }

    /// Number of items currently held back.
    pub fn pending_items(&self) -> usize {
        self.groups.lock().iter().map(|g| g.items.len()).sum()
    }

    /// Flush every group whose period elapsed or that reached `max_items`.
    pub async fn flush_expired(&self) {
        let ready = {
            let mut guard = self.groups.lock();
            let (ready, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut *guard)
                .into_iter()
                .partition(|g| g.should_flush(&self.config));
            *guard = keep;
            ready
        };
        self.send_all(ready).await;
    }

    /// Flush every group regardless of age.
    pub async fn flush_all(&self) {
        let groups = std::mem::take(&mut *self.groups.lock());
        self.send_all(groups).await;
    }

    async fn send_all(&self, groups: Vec<PendingGroup<T>>) {
        for group in groups {
            self.send(group).await;
        }
    }

    /// Failures are charged to the group's own receiver here, so callers
    /// never see them.
    async fn send(&self, group: PendingGroup<T>) {
        let (ctx, batch) = group.into_batch();
        if let Err(e) = self.next.consume(&ctx, &batch).await {
            self.observability.record_dropped(&ctx.receiver, batch.len());
            warn!(
                receiver = %ctx.receiver,
                items = batch.len(),
                error = %e,
                "Buffered flush failed, batch dropped"
            );
        }
    }

    /// Periodically flush expired groups until `cancel` fires, then flush
    /// whatever is left.
    pub fn spawn_flusher(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let period = self.config.period.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => self.flush_expired().await,
                }
            }
            let remaining = self.pending_items();
            self.flush_all().await;
            info!(items = remaining, "Buffered consumer flushed on shutdown");
        })
    }
}

#[async_trait]
impl<T> Consumer<T> for BufferedConsumer<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn consume(&self, ctx: &ExportContext, batch: &Batch<T>) -> Result<(), ConsumerError> {
        if batch.is_empty() {
            return Ok(());
        }

        let full = {
            let mut groups = self.groups.lock();
            let index = match groups.iter().position(|g| g.matches(ctx, batch)) {
                Some(index) => index,
                None => {
                    groups.push(PendingGroup::new(ctx, batch));
                    groups.len() - 1
                }
            };
            groups[index].items.extend(batch.items.iter().cloned());
            if groups[index].items.len() >= self.config.max_items {
                Some(groups.remove(index))
            } else {
                None
            }
        };

        if let Some(group) = full {
            debug!(items = group.items.len(), "Buffered group full, flushing");
            self.send(group).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<Batch<u32>>>,
    }

    #[async_trait]
    impl Consumer<u32> for Recorder {
        async fn consume(&self, _: &ExportContext, batch: &Batch<u32>) -> Result<(), ConsumerError> {
            self.batches.lock().push(batch.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Consumer<u32> for Failing {
        async fn consume(&self, _: &ExportContext, _: &Batch<u32>) -> Result<(), ConsumerError> {
            Err(ConsumerError::failed("downstream unavailable"))
        }
    }

    fn batch(node: &str, items: Vec<u32>) -> Batch<u32> {
        Batch::new("test")
            .with_node(Node::for_service(node))
            .with_items(items)
    }

    fn buffered(config: BufferConfig) -> (Arc<Recorder>, BufferedConsumer<u32>) {
        let recorder = Arc::new(Recorder::default());
        let consumer = BufferedConsumer::new(config, recorder.clone(), Observability::new());
        (recorder, consumer)
    }

    #[tokio::test]
    async fn test_groups_by_node_and_flushes_on_max_items() {
        let (recorder, consumer) = buffered(BufferConfig {
            period: Duration::from_secs(3600),
            max_items: 4,
        });
        let ctx = ExportContext::detached("oc");

        consumer.consume(&ctx, &batch("a", vec![1, 2])).await.unwrap();
        consumer.consume(&ctx, &batch("b", vec![10])).await.unwrap();
        assert!(recorder.batches.lock().is_empty());

        consumer.consume(&ctx, &batch("a", vec![3, 4])).await.unwrap();
        {
            let flushed = recorder.batches.lock();
            assert_eq!(flushed.len(), 1);
            assert_eq!(flushed[0].items, vec![1, 2, 3, 4]);
            assert_eq!(flushed[0].node, Some(Node::for_service("a")));
        }
        assert_eq!(consumer.pending_items(), 1);

        consumer.flush_all().await;
        assert_eq!(recorder.batches.lock().len(), 2);
        assert_eq!(consumer.pending_items(), 0);
    }

    #[tokio::test]
    async fn test_flush_expired_respects_period() {
        let (recorder, consumer) = buffered(BufferConfig {
            period: Duration::from_secs(3600),
            max_items: 100,
        });
        let ctx = ExportContext::detached("oc");
        consumer.consume(&ctx, &batch("a", vec![1])).await.unwrap();
        consumer.flush_expired().await;
        assert!(recorder.batches.lock().is_empty());

        let (recorder, consumer) = buffered(BufferConfig {
            period: Duration::ZERO,
            max_items: 100,
        });
        consumer.consume(&ctx, &batch("a", vec![1])).await.unwrap();
        consumer.flush_expired().await;
        assert_eq!(recorder.batches.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_flusher_drains_on_cancel() {
        let (recorder, consumer) = buffered(BufferConfig {
            period: Duration::from_secs(3600),
            max_items: 100,
        });
        let consumer = Arc::new(consumer);
        let cancel = CancellationToken::new();
        let flusher = consumer.clone().spawn_flusher(cancel.clone());

        consumer
            .consume(&ExportContext::detached("oc"), &batch("a", vec![1, 2, 3]))
            .await
            .unwrap();
        cancel.cancel();
        flusher.await.unwrap();

        let flushed = recorder.batches.lock();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_receivers_sharing_a_node_stay_separate() {
        let (recorder, consumer) = buffered(BufferConfig {
            period: Duration::from_secs(3600),
            max_items: 100,
        });
        consumer
            .consume(&ExportContext::detached("oc"), &batch("a", vec![1, 2]))
            .await
            .unwrap();
        consumer
            .consume(&ExportContext::detached("http"), &batch("a", vec![3, 4, 5]))
            .await
            .unwrap();
        let other_format = Batch::new("jaeger")
            .with_node(Node::for_service("a"))
            .with_items(vec![6]);
        consumer
            .consume(&ExportContext::detached("http"), &other_format)
            .await
            .unwrap();

        consumer.flush_all().await;
        let flushed = recorder.batches.lock();
        assert_eq!(flushed.len(), 3);
        assert_eq!(flushed[0].items, vec![1, 2]);
        assert_eq!(flushed[1].items, vec![3, 4, 5]);
        assert_eq!(flushed[2].items, vec![6]);
        assert_eq!(flushed[2].source_format, "jaeger");
    }

    #[tokio::test]
    async fn test_failed_flush_is_charged_to_each_receiver() {
        let observability = Observability::new();
        let consumer = BufferedConsumer::new(
            BufferConfig {
                period: Duration::from_secs(3600),
                max_items: 100,
            },
            Arc::new(Failing),
            observability.clone(),
        );
        consumer
            .consume(&ExportContext::detached("oc"), &batch("a", vec![1, 2]))
            .await
            .unwrap();
        consumer
            .consume(&ExportContext::detached("http"), &batch("a", vec![3, 4, 5]))
            .await
            .unwrap();

        consumer.flush_all().await;
        assert_eq!(observability.receiver_stats("oc").dropped, 2);
        assert_eq!(observability.receiver_stats("http").dropped, 3);
    }

    #[tokio::test]
    async fn test_failed_full_group_counts_whole_group_once() {
        let observability = Observability::new();
        let consumer = BufferedConsumer::new(
            BufferConfig {
                period: Duration::from_secs(3600),
                max_items: 4,
            },
            Arc::new(Failing),
            observability.clone(),
        );
        let ctx = ExportContext::detached("oc");
        consumer.consume(&ctx, &batch("a", vec![1, 2, 3])).await.unwrap();
        // Filling the group triggers the flush; the failure stays inside.
        consumer.consume(&ctx, &batch("a", vec![4])).await.unwrap();

        assert_eq!(consumer.pending_items(), 0);
        assert_eq!(observability.receiver_stats("oc").dropped, 4);
    }
}
