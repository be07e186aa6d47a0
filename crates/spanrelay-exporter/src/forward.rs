use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use spanrelay_core::{Batch, ExportContext};
use spanrelay_receiver::{ExportClient, Signal};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ExporterError;
use crate::helper::Push;

/// Re-exports batches to another relay over one long-lived export stream.
///
/// The connection is opened on first use and dropped on any failure; the
/// next batch reconnects. A failed batch is not retried.
pub struct ForwardExporter<T> {
    address: String,
    connect_timeout: Duration,
    client: Mutex<Option<ExportClient>>,
    _signal: PhantomData<fn(T)>,
}

impl<T: Signal> ForwardExporter<T> {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            client: Mutex::new(None),
            _signal: PhantomData,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<ExportClient, ExporterError> {
        let connect = ExportClient::connect(self.address.as_str());
        let client = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| ExporterError::ConnectTimeout {
                address: self.address.clone(),
            })??;
        info!(address = %self.address, signal = T::NAME, "Forwarding stream connected");
        Ok(client)
    }

    /// End the current stream, if any, and report how the peer closed it.
    pub async fn close(&self) -> Result<(), ExporterError> {
        let client = self.client.lock().await.take();
        if let Some(mut client) = client {
            client.close().await?;
            debug!(address = %self.address, "Forwarding stream closed");
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Signal> Push<T> for ForwardExporter<T> {
    async fn push(&self, _ctx: &ExportContext, batch: &Batch<T>) -> Result<usize, ExporterError> {
        let mut guard = self.client.lock().await;
        let mut client = match guard.take() {
            Some(client) => client,
            None => self.connect().await?,
        };

        // Every message repeats node and resource, so a fresh stream never
        // starts without them.
        let result = client
            .export(batch.node.clone(), batch.resource.clone(), batch.items.clone())
            .await;

        match result {
            Ok(()) => {
                *guard = Some(client);
                Ok(0)
            }
            Err(e) => {
                warn!(address = %self.address, error = %e, "Forwarding stream failed, reconnecting on next batch");
                Err(e.into())
            }
        }
    }
}
