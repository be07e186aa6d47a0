//! The consumer capability every downstream sink implements.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::model::Batch;

/// Per-export context handed from a receiver to its consumers.
#[derive(Debug, Clone)]
pub struct ExportContext {
    /// Name of the receiver the batch arrived on.
    pub receiver: Arc<str>,
    /// Span of the connection or request that produced the batch.
    pub span: tracing::Span,
}

impl ExportContext {
    pub fn new(receiver: impl Into<Arc<str>>, span: tracing::Span) -> Self {
        Self {
            receiver: receiver.into(),
            span,
        }
    }

    /// Context without a parent span, for tests and embedding.
    pub fn detached(receiver: impl Into<Arc<str>>) -> Self {
        Self::new(receiver, tracing::Span::none())
    }
}

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),

    #[error("{}", MultipleDisplay(.0))]
    Multiple(Vec<ConsumerError>),
}

impl ConsumerError {
    pub fn failed(message: impl Into<String>) -> Self {
        ConsumerError::Failed(message.into())
    }

    /// Fold a list of failures into one result. A single error is returned
    /// unchanged; two or more are wrapped in [`ConsumerError::Multiple`].
    pub fn combine(mut errors: Vec<ConsumerError>) -> Result<(), ConsumerError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConsumerError::Multiple(errors)),
        }
    }
}

struct MultipleDisplay<'a>(&'a [ConsumerError]);

impl fmt::Display for MultipleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        f.write_str("]")
    }
}

/// A downstream sink for batches of `T`.
///
/// Implementations must not keep a reference to the batch past the call;
/// anything retained has to be copied.
#[async_trait]
pub trait Consumer<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    async fn consume(&self, ctx: &ExportContext, batch: &Batch<T>) -> Result<(), ConsumerError>;
}

#[async_trait]
impl<T, C> Consumer<T> for Arc<C>
where
    T: Send + Sync + 'static,
    C: Consumer<T> + ?Sized,
{
    async fn consume(&self, ctx: &ExportContext, batch: &Batch<T>) -> Result<(), ConsumerError> {
        (**self).consume(ctx, batch).await
    }
}
