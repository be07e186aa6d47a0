//! Broadcast one batch to many consumers.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::consumer::{Consumer, ConsumerError, ExportContext};
use crate::model::Batch;

/// A [`Consumer`] that forwards each batch to every wrapped consumer in
/// order. A failing consumer never prevents the others from receiving the
/// batch.
pub struct FanOut<T: Send + Sync + 'static> {
    consumers: Vec<Arc<dyn Consumer<T>>>,
}

impl<T> FanOut<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(consumers: Vec<Arc<dyn Consumer<T>>>) -> Self {
        Self { consumers }
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

#[async_trait]
impl<T> Consumer<T> for FanOut<T>
where
    T: Send + Sync + 'static,
{
    async fn consume(&self, ctx: &ExportContext, batch: &Batch<T>) -> Result<(), ConsumerError> {
        let mut errors = Vec::new();
        for (index, consumer) in self.consumers.iter().enumerate() {
            if let Err(e) = consumer.consume(ctx, batch).await {
                warn!(
                    receiver = %ctx.receiver,
                    consumer = index,
                    items = batch.len(),
                    error = %e,
                    "Consumer failed"
                );
                errors.push(e);
            }
        }
        ConsumerError::combine(errors)
    }
}
