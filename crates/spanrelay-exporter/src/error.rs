use spanrelay_receiver::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("exporter name must not be empty")]
    EmptyName,

    #[error("connection to {address} timed out")]
    ConnectTimeout { address: String },

    #[error(transparent)]
    Stream(#[from] ClientError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collector at {url} returned {status}")]
    Rejected { url: String, status: u16 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}
