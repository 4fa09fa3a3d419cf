use super::error::PeerError;
use super::message::{Handshake, Message};
use crate::constants::{HANDSHAKE_LEN, IDLE_READ_TIMEOUT, MAX_MESSAGE_SIZE, WRITE_TIMEOUT};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Framed message I/O over one peer TCP connection.
///
/// The read deadline is connection state that tracks the session's
/// phase: the short idle deadline applies during bootstrap and between
/// pieces, and the pipeline installs the piece deadline for the stretch
/// where block traffic is expected. Frames are read exactly sized, the
/// four-byte prefix first and then the body it announces, so an EOF
/// inside a frame surfaces as [`PeerError::ConnectionClosed`] rather
/// than a short read.
pub struct PeerTransport {
    stream: TcpStream,
    read_deadline: Duration,
}

impl PeerTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_deadline: IDLE_READ_TIMEOUT,
        }
    }

    /// Installs the read deadline for the current session phase.
    pub fn set_read_deadline(&mut self, deadline: Duration) {
        self.read_deadline = deadline;
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), PeerError> {
        match timeout(self.read_deadline, self.stream.read_exact(buf)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(PeerError::ConnectionClosed)
            }
            Ok(Err(e)) => Err(PeerError::Io(e)),
            Err(_) => Err(PeerError::Timeout),
        }
    }

    async fn write_bytes(&mut self, data: &[u8]) -> Result<(), PeerError> {
        timeout(WRITE_TIMEOUT, self.stream.write_all(data))
            .await
            .map_err(|_| PeerError::Timeout)??;
        Ok(())
    }

    pub async fn send_handshake(&mut self, handshake: &Handshake) -> Result<(), PeerError> {
        self.write_bytes(&handshake.encode()).await
    }

    /// Reads the peer's handshake, which is the one fixed-size frame in
    /// the protocol: exactly 68 bytes, no length prefix.
    pub async fn receive_handshake(&mut self) -> Result<Handshake, PeerError> {
        let mut frame = [0u8; HANDSHAKE_LEN];
        self.read_bytes(&mut frame).await?;
        Handshake::decode(&frame)
    }

    pub async fn send_message(&mut self, message: &Message) -> Result<(), PeerError> {
        self.write_bytes(&message.encode()).await
    }

    /// Reads exactly one message frame.
    ///
    /// A zero length prefix is the keep-alive and carries no body. An
    /// unknown message id has its whole frame read before the error
    /// surfaces, so the caller can drop the frame and keep reading.
    pub async fn receive_message(&mut self) -> Result<Message, PeerError> {
        let mut prefix = [0u8; 4];
        self.read_bytes(&mut prefix).await?;

        let length = u32::from_be_bytes(prefix) as usize;
        if length == 0 {
            return Ok(Message::KeepAlive);
        }
        if length > MAX_MESSAGE_SIZE {
            return Err(PeerError::InvalidMessage(format!(
                "frame of {} bytes exceeds the message limit",
                length
            )));
        }

        let mut body = vec![0u8; length];
        self.read_bytes(&mut body).await?;
        Message::decode_payload(body.into())
    }
}
