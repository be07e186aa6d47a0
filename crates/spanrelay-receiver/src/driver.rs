use std::sync::Arc;

use futures::{Stream, StreamExt};
use spanrelay_batch::DispatchHandle;
use spanrelay_core::model::ExportMessage;
use spanrelay_core::{ExportContext, Observability, Translated};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ReceiverError;
use crate::session::ExportSession;
use crate::signal::Signal;

/// Feeds decoded export messages through a session into a dispatcher,
/// keeping the receiver's received/dropped counts.
pub struct StreamDriver<T: Signal> {
    receiver: Arc<str>,
    handle: DispatchHandle<T>,
    observability: Arc<Observability>,
}

impl<T: Signal> Clone for StreamDriver<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            handle: self.handle.clone(),
            observability: self.observability.clone(),
        }
    }
}

impl<T: Signal> StreamDriver<T> {
    pub fn new(
        receiver: impl Into<Arc<str>>,
        handle: DispatchHandle<T>,
        observability: Arc<Observability>,
    ) -> Self {
        Self {
            receiver: receiver.into(),
            handle,
            observability,
        }
    }

    pub fn receiver_name(&self) -> &str {
        &self.receiver
    }

    pub fn new_session(&self) -> ExportSession {
        ExportSession::new(T::SOURCE_FORMAT)
    }

    /// Drain `messages` until the client ends the stream, an error occurs,
    /// or `cancel` fires. Every batch is tagged with `span` so export work
    /// links back to the stream it came from.
    pub async fn run<S>(
        &self,
        session: &mut ExportSession,
        mut messages: S,
        span: &tracing::Span,
        cancel: &CancellationToken,
    ) -> Result<(), ReceiverError>
    where
        S: Stream<Item = Result<Translated<ExportMessage<T>>, ReceiverError>> + Unpin,
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    session.fail();
                    return Err(ReceiverError::ShuttingDown);
                }
                next = messages.next() => next,
            };

            match next {
                None => {
                    session.finish();
                    return Ok(());
                }
                Some(Err(e)) => {
                    session.fail();
                    return Err(e);
                }
                Some(Ok(translated)) => {
                    if let Err(e) = self.ingest(session, translated, span).await {
                        session.fail();
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Resolve one message and queue the resulting batch.
    pub async fn ingest(
        &self,
        session: &mut ExportSession,
        translated: Translated<ExportMessage<T>>,
        span: &tracing::Span,
    ) -> Result<(), ReceiverError> {
        let dropped = translated.dropped();
        if dropped > 0 {
            self.observability.record_dropped(&self.receiver, dropped);
            for error in &translated.errors {
                debug!(receiver = %self.receiver, error = %error, "Dropping untranslatable item");
            }
        }

        let message = translated.value;
        let items = message.items.len();
        let batch = match session.accept(message) {
            Ok(batch) => batch,
            Err(e) => {
                self.observability.record_dropped(&self.receiver, items);
                return Err(e);
            }
        };

        if batch.is_empty() {
            return Ok(());
        }

        let ctx = ExportContext::new(self.receiver.clone(), span.clone());
        self.handle.enqueue(ctx, batch).await?;
        self.observability.record_received(&self.receiver, items);
        Ok(())
    }
}
