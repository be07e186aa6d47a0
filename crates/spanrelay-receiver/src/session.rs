//! Per-stream node and resource stickiness.
//!
//! The first message of an export stream must identify its node. Later
//! messages may omit node or resource and inherit the last value seen on the
//! same stream.

use spanrelay_core::model::ExportMessage;
use spanrelay_core::{Batch, Node, Resource};

use crate::error::ReceiverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Success,
    ProtocolViolation,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingFirst,
    Streaming,
    Closed(CloseReason),
}

/// State of one export stream. Owned by the task serving the connection.
#[derive(Debug)]
pub struct ExportSession {
    state: SessionState,
    source_format: &'static str,
    last_node: Option<Node>,
    last_resource: Option<Resource>,
}

impl ExportSession {
    pub fn new(source_format: &'static str) -> Self {
        Self {
            state: SessionState::AwaitingFirst,
            source_format,
            last_node: None,
            last_resource: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_node(&self) -> Option<&Node> {
        self.last_node.as_ref()
    }

    pub fn last_resource(&self) -> Option<&Resource> {
        self.last_resource.as_ref()
    }

    /// Resolve a message into a batch carrying the stream's current node and
    /// resource.
    pub fn accept<T>(&mut self, message: ExportMessage<T>) -> Result<Batch<T>, ReceiverError> {
        match self.state {
            SessionState::AwaitingFirst => {
                if message.node.is_none() {
                    self.state = SessionState::Closed(CloseReason::ProtocolViolation);
                    return Err(ReceiverError::MissingNode);
                }
                self.state = SessionState::Streaming;
            }
            SessionState::Streaming => {}
            SessionState::Closed(CloseReason::ProtocolViolation) => {
                return Err(ReceiverError::MissingNode);
            }
            SessionState::Closed(_) => {
                return Err(ReceiverError::ProtocolViolation(
                    "message received after the stream was closed".to_string(),
                ));
            }
        }

        if let Some(node) = message.node {
            self.last_node = Some(node);
        }
        if let Some(resource) = message.resource {
            self.last_resource = Some(resource);
        }

        Ok(Batch {
            node: self.last_node.clone(),
            resource: self.last_resource.clone(),
            items: message.items,
            source_format: self.source_format.to_string(),
        })
    }

    /// Clean end of input.
    pub fn finish(&mut self) {
        if !matches!(self.state, SessionState::Closed(_)) {
            self.state = SessionState::Closed(CloseReason::Success);
        }
    }

    /// Transport or pipeline failure.
    pub fn fail(&mut self) {
        if !matches!(self.state, SessionState::Closed(_)) {
            self.state = SessionState::Closed(CloseReason::Error);
        }
    }
}
