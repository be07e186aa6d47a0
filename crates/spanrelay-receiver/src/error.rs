use spanrelay_batch::DispatchError;
use spanrelay_proto::spanrelay::stream::v1::{StatusCode, StreamStatus};
use thiserror::Error;

/// Message sent to a client whose first export carried no node.
pub const MISSING_NODE_MESSAGE: &str = "protocol violation: Export's first message must have a Node";

/// Everything that can end an export stream early.
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("{}", MISSING_NODE_MESSAGE)]
    MissingNode,

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed frame: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error(transparent)]
    Stopped(#[from] DispatchError),

    #[error("receiver is shutting down")]
    ShuttingDown,

    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

impl ReceiverError {
    /// Wire status reported to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReceiverError::MissingNode | ReceiverError::ProtocolViolation(_) => {
                StatusCode::ProtocolViolation
            }
            ReceiverError::InvalidArgument(_) | ReceiverError::Decode(_) => {
                StatusCode::InvalidArgument
            }
            ReceiverError::Stopped(_) | ReceiverError::ShuttingDown => StatusCode::Unavailable,
            ReceiverError::Transport(_) | ReceiverError::Bind { .. } => StatusCode::Internal,
        }
    }

    /// Short machine-readable name, used as a log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            ReceiverError::MissingNode | ReceiverError::ProtocolViolation(_) => {
                "protocol_violation"
            }
            ReceiverError::InvalidArgument(_) => "invalid_argument",
            ReceiverError::Decode(_) => "decode",
            ReceiverError::Transport(_) => "transport",
            ReceiverError::Stopped(_) | ReceiverError::ShuttingDown => "unavailable",
            ReceiverError::Bind { .. } => "bind",
        }
    }

    /// True for errors caused by what the client sent.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.status_code(),
            StatusCode::ProtocolViolation | StatusCode::InvalidArgument
        )
    }

    pub fn to_status(&self) -> StreamStatus {
        StreamStatus {
            code: self.status_code() as i32,
            message: self.to_string(),
        }
    }
}

pub(crate) fn ok_status() -> StreamStatus {
    StreamStatus {
        code: StatusCode::Ok as i32,
        message: String::new(),
    }
}
