use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use spanrelay_core::jaeger::{self, trace_batch_to_jaeger};
use spanrelay_core::{Batch, ExportContext, Span};
use tracing::debug;

use crate::error::ExporterError;
use crate::helper::Push;

/// Delivers translated Jaeger batches. Injected into [`JaegerExporter`] so
/// the transport can be swapped or faked.
#[async_trait]
pub trait JaegerClient: Send + Sync {
    async fn upload(&self, batch: &jaeger::model::Batch) -> Result<(), ExporterError>;
}

/// Translates span batches to Jaeger and hands them to a [`JaegerClient`].
pub struct JaegerExporter<C> {
    client: C,
}

impl<C: JaegerClient> JaegerExporter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: JaegerClient> Push<Span> for JaegerExporter<C> {
    async fn push(&self, ctx: &ExportContext, batch: &Batch<Span>) -> Result<usize, ExporterError> {
        let translated = trace_batch_to_jaeger(batch);
        let dropped = translated.dropped();
        for error in &translated.errors {
            debug!(receiver = %ctx.receiver, error = %error, "Span not representable in Jaeger");
        }
        if translated.value.spans.is_empty() {
            return Ok(dropped);
        }
        self.client.upload(&translated.value).await?;
        Ok(dropped)
    }
}

/// Posts Jaeger JSON batches to a collector endpoint.
#[derive(Clone)]
pub struct HttpJaegerClient {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

impl HttpJaegerClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<Self, ExporterError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            headers: parse_headers(headers)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl JaegerClient for HttpJaegerClient {
    async fn upload(&self, batch: &jaeger::model::Batch) -> Result<(), ExporterError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::Rejected {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }
        debug!(url = %self.endpoint, spans = batch.spans.len(), "Uploaded Jaeger batch");
        Ok(())
    }
}

/// Parse a HashMap of string headers into a HeaderMap
fn parse_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, ExporterError> {
    let mut header_map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::try_from(key.as_str())
            .map_err(|e| ExporterError::Config(format!("invalid header name '{}': {}", key, e)))?;
        let val = HeaderValue::from_str(value).map_err(|e| {
            ExporterError::Config(format!("invalid header value for '{}': {}", key, e))
        })?;
        header_map.insert(name, val);
    }
    Ok(header_map)
}
