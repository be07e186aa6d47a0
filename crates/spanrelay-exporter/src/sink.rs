use async_trait::async_trait;
use parking_lot::Mutex;
use spanrelay_core::{Batch, ExportContext};

use crate::error::ExporterError;
use crate::helper::Push;

/// Keeps copies of every batch in memory. Useful for tests and for embedding
/// the relay in a process that inspects what it received.
#[derive(Debug)]
pub struct SinkExporter<T> {
    batches: Mutex<Vec<Batch<T>>>,
    failure: Mutex<Option<String>>,
}

impl<T> Default for SinkExporter<T> {
    fn default() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }
}

impl<T: Clone> SinkExporter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Batch<T>> {
        self.batches.lock().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.batches
            .lock()
            .iter()
            .flat_map(|b| b.items.iter().cloned())
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.batches.lock().iter().map(Batch::len).sum()
    }

    pub fn reset(&self) {
        self.batches.lock().clear();
    }

    /// Make every following push fail with `message`; `None` heals it.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock() = message.map(str::to_string);
    }
}

#[async_trait]
impl<T> Push<T> for SinkExporter<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn push(&self, _ctx: &ExportContext, batch: &Batch<T>) -> Result<usize, ExporterError> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(ExporterError::Other(message));
        }
        self.batches.lock().push(batch.clone());
        Ok(0)
    }
}
