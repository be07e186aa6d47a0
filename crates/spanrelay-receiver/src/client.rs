//! Client side of the export stream.

use bytes::Bytes;
use futures::{FutureExt, SinkExt, StreamExt};
use prost::Message;
use spanrelay_core::{Node, Resource};
use spanrelay_proto::spanrelay::stream::v1::{ClientFrame, StatusCode, StreamStatus};
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::signal::Signal;
use crate::tcp::{decode_status, frame_codec, status_code, MAX_FRAME_LEN};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect: {0}")]
    Connect(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed status frame: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("stream closed with {}: {message}", code.as_str_name())]
    Status { code: StatusCode, message: String },

    #[error("end of stream")]
    EndOfStream,
}

impl ClientError {
    fn from_status(status: &StreamStatus) -> Self {
        ClientError::Status {
            code: status_code(status),
            message: status.message.clone(),
        }
    }
}

/// One export stream to a relay. Once the server has ended the stream,
/// `recv` keeps returning the same outcome and `send` fails with
/// [`ClientError::EndOfStream`].
pub struct ExportClient {
    reader: FramedRead<OwnedReadHalf, LengthDelimitedCodec>,
    writer: FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>,
    terminal: Option<StreamStatus>,
    write_closed: bool,
}

impl ExportClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(ClientError::Connect)?;
        let _ = stream.set_nodelay(true);
        let (read, write) = stream.into_split();
        Ok(Self {
            reader: FramedRead::new(read, frame_codec(MAX_FRAME_LEN)),
            writer: FramedWrite::new(write, frame_codec(MAX_FRAME_LEN)),
            terminal: None,
            write_closed: false,
        })
    }

    /// Send one export message of signal `T`.
    pub async fn export<T: Signal>(
        &mut self,
        node: Option<Node>,
        resource: Option<Resource>,
        items: Vec<T>,
    ) -> Result<(), ClientError> {
        self.send(T::to_frame(node, resource, items)).await
    }

    pub async fn send(&mut self, frame: ClientFrame) -> Result<(), ClientError> {
        if self.write_closed {
            return Err(ClientError::EndOfStream);
        }
        // Pick up a status the server already wrote without waiting for one.
        if self.terminal.is_none() {
            if let Some(next) = self.reader.next().now_or_never() {
                self.record_terminal(next)?;
            }
        }
        if self.terminal.is_some() {
            return Err(ClientError::EndOfStream);
        }

        let bytes = Bytes::from(frame.encode_to_vec());
        if let Err(e) = self.writer.send(bytes).await {
            // The peer may have closed after writing its status.
            self.terminal = Some(self.read_status().await?);
            tracing::debug!(error = %e, "Send failed after stream ended");
            return Err(ClientError::EndOfStream);
        }
        Ok(())
    }

    /// Wait for the server's terminal status. `Ok` only for a clean end.
    pub async fn recv(&mut self) -> Result<StreamStatus, ClientError> {
        let status = match &self.terminal {
            Some(status) => status.clone(),
            None => {
                let status = self.read_status().await?;
                self.terminal = Some(status.clone());
                status
            }
        };
        match status_code(&status) {
            StatusCode::Ok => Ok(status),
            _ => Err(ClientError::from_status(&status)),
        }
    }

    /// End the stream from this side and wait for the outcome.
    pub async fn close(&mut self) -> Result<StreamStatus, ClientError> {
        if !self.write_closed {
            self.write_closed = true;
            // Ignore: the server may already be gone, the status says why.
            let _ = SinkExt::<Bytes>::close(&mut self.writer).await;
        }
        self.recv().await
    }

    async fn read_status(&mut self) -> Result<StreamStatus, ClientError> {
        let next = self.reader.next().await;
        self.record_terminal(next)?;
        Ok(self.terminal.clone().unwrap_or_else(closed_without_status))
    }

    fn record_terminal(
        &mut self,
        next: Option<Result<bytes::BytesMut, std::io::Error>>,
    ) -> Result<(), ClientError> {
        let status = match next {
            Some(frame) => decode_status(frame?)?,
            None => closed_without_status(),
        };
        self.terminal = Some(status);
        Ok(())
    }
}

fn closed_without_status() -> StreamStatus {
    StreamStatus {
        code: StatusCode::Unavailable as i32,
        message: "connection closed without a status".to_string(),
    }
}
