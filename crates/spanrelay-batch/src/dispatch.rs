//! Bounded FIFO queue drained by a fixed pool of worker tasks.
//!
//! Receivers enqueue `(batch, context)` envelopes through a cloneable
//! [`DispatchHandle`]; enqueue waits for space rather than dropping. Workers
//! share the receiving half of the channel behind an async mutex and invoke
//! the consumer for one envelope at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use spanrelay_core::{Batch, Consumer, ExportContext, Observability};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatcher {name} is stopped, {items} items not accepted")]
    Stopped { name: String, items: usize },
}

/// Envelope counters. Never used for control flow.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    enqueued: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    dropped: AtomicU64,
    items_processed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetricsSnapshot {
    pub enqueued: u64,
    pub processed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub dropped: u64,
    pub items_processed: u64,
}

impl DispatchMetrics {
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            items_processed: self.items_processed.load(Ordering::Relaxed),
        }
    }
}

struct Envelope<T> {
    batch: Batch<T>,
    ctx: ExportContext,
}

type SharedReceiver<T> = Arc<tokio::sync::Mutex<mpsc::Receiver<Envelope<T>>>>;

/// Cloneable enqueue side of a [`Dispatcher`].
pub struct DispatchHandle<T> {
    name: Arc<str>,
    sender: mpsc::Sender<Envelope<T>>,
    intake: CancellationToken,
    metrics: Arc<DispatchMetrics>,
    observability: Arc<Observability>,
}

impl<T> Clone for DispatchHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            sender: self.sender.clone(),
            intake: self.intake.clone(),
            metrics: self.metrics.clone(),
            observability: self.observability.clone(),
        }
    }
}

impl<T> DispatchHandle<T>
where
    T: Send + Sync + 'static,
{
    /// Queue a batch, waiting while the queue is full.
    ///
    /// Fails only once the dispatcher has been stopped; the batch's items
    /// are then counted as dropped against the receiver in `ctx`.
    pub async fn enqueue(&self, ctx: ExportContext, batch: Batch<T>) -> Result<(), DispatchError> {
        let reserved = if self.intake.is_cancelled() {
            None
        } else {
            tokio::select! {
                biased;
                _ = self.intake.cancelled() => None,
                permit = self.sender.reserve() => permit.ok(),
            }
        };

        match reserved {
            Some(permit) => {
                permit.send(Envelope { batch, ctx });
                self.metrics.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => {
                let items = batch.len();
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                self.observability.record_dropped(&ctx.receiver, items);
                Err(DispatchError::Stopped {
                    name: self.name.to_string(),
                    items,
                })
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.intake.is_cancelled()
    }
}

/// The worker pool plus its queue.
pub struct Dispatcher<T> {
    name: Arc<str>,
    handle: DispatchHandle<T>,
    receiver: SharedReceiver<T>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    intake: CancellationToken,
    halt: CancellationToken,
    metrics: Arc<DispatchMetrics>,
    observability: Arc<Observability>,
}

impl<T> Dispatcher<T>
where
    T: Send + Sync + 'static,
{
    /// Create the queue and spawn the workers. Must be called from within a
    /// tokio runtime.
    pub fn new(
        name: impl Into<Arc<str>>,
        config: DispatchConfig,
        consumer: Arc<dyn Consumer<T>>,
        observability: Arc<Observability>,
    ) -> Self {
        let name = name.into();
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver: SharedReceiver<T> = Arc::new(tokio::sync::Mutex::new(receiver));
        let intake = CancellationToken::new();
        let halt = CancellationToken::new();
        let metrics = Arc::new(DispatchMetrics::default());

        let handles = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    name: name.clone(),
                    receiver: receiver.clone(),
                    consumer: consumer.clone(),
                    intake: intake.clone(),
                    halt: halt.clone(),
                    metrics: metrics.clone(),
                    observability: observability.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        info!(
            dispatcher = %name,
            workers,
            queue_capacity = capacity,
            "Dispatcher started"
        );

        let handle = DispatchHandle {
            name: name.clone(),
            sender,
            intake: intake.clone(),
            metrics: metrics.clone(),
            observability: observability.clone(),
        };

        Self {
            name,
            handle,
            receiver,
            workers: Mutex::new(handles),
            intake,
            halt,
            metrics,
            observability,
        }
    }

    pub fn handle(&self) -> DispatchHandle<T> {
        self.handle.clone()
    }

    pub fn metrics(&self) -> DispatchMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop dequeuing immediately. Calls already in progress complete;
    /// envelopes still queued are counted as dropped.
    pub async fn stop(&self) {
        self.intake.cancel();
        self.halt.cancel();
        self.join_workers().await;

        let mut receiver = self.receiver.lock().await;
        receiver.close();
        let mut leftover = 0u64;
        while let Ok(envelope) = receiver.try_recv() {
            leftover += 1;
            self.observability
                .record_dropped(&envelope.ctx.receiver, envelope.batch.len());
        }
        if leftover > 0 {
            self.metrics.dropped.fetch_add(leftover, Ordering::Relaxed);
            warn!(
                dispatcher = %self.name,
                envelopes = leftover,
                "Dispatcher stopped with queued batches"
            );
        }
        info!(dispatcher = %self.name, "Dispatcher stopped");
    }

    /// Refuse new envelopes, process everything already queued, then join
    /// the workers.
    pub async fn shutdown(&self) {
        self.intake.cancel();
        self.join_workers().await;
        info!(
            dispatcher = %self.name,
            processed = self.metrics.processed.load(Ordering::Relaxed),
            "Dispatcher drained"
        );
    }

    async fn join_workers(&self) {
        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(dispatcher = %self.name, error = %e, "Worker task failed");
            }
        }
    }
}

struct Worker<T: Send + Sync + 'static> {
    id: usize,
    name: Arc<str>,
    receiver: SharedReceiver<T>,
    consumer: Arc<dyn Consumer<T>>,
    intake: CancellationToken,
    halt: CancellationToken,
    metrics: Arc<DispatchMetrics>,
    observability: Arc<Observability>,
}

impl<T> Worker<T>
where
    T: Send + Sync + 'static,
{
    async fn run(self) {
        debug!(dispatcher = %self.name, worker = self.id, "Worker started");
        while let Some(envelope) = self.next().await {
            self.process(envelope).await;
        }
        debug!(dispatcher = %self.name, worker = self.id, "Worker exiting");
    }

    /// Next envelope, or `None` once halted or once intake is closed and the
    /// queue is empty.
    async fn next(&self) -> Option<Envelope<T>> {
        let mut receiver = self.receiver.lock().await;
        tokio::select! {
            biased;
            _ = self.halt.cancelled() => None,
            _ = self.intake.cancelled() => {
                receiver.close();
                receiver.recv().await
            }
            envelope = receiver.recv() => envelope,
        }
    }

    async fn process(&self, envelope: Envelope<T>) {
        let Envelope { batch, ctx } = envelope;
        if batch.is_empty() {
            self.metrics.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let span = info_span!(
            "export",
            receiver = %ctx.receiver,
            source_format = %batch.source_format,
            items = batch.len(),
            worker = self.id
        );
        span.follows_from(&ctx.span);

        let items = batch.len();
        match self.consumer.consume(&ctx, &batch).instrument(span).await {
            Ok(()) => {
                self.metrics.processed.fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .items_processed
                    .fetch_add(items as u64, Ordering::Relaxed);
            }
            Err(e) => {
                self.metrics.failed.fetch_add(1, Ordering::Relaxed);
                self.observability.record_dropped(&ctx.receiver, items);
                warn!(
                    dispatcher = %self.name,
                    receiver = %ctx.receiver,
                    items,
                    error = %e,
                    "Consumer failed, batch dropped"
                );
            }
        }
    }
}
