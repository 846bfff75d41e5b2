use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use crate::error::{Result, RouterError};
use crate::protocol::messages::{ProcessAddress, ProtocolMessage};
use super::codec::{read_frame, write_frame};

/// Limits applied to every connection a router opens or accepts.
#[derive(Debug, Clone, Copy)]
pub struct TransportSettings {
    pub io_timeout: Duration,
    pub max_frame_bytes: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_secs(5),
            max_frame_bytes: 1024 * 1024,
        }
    }
}

/// A framed, bidirectional byte stream to one peer process.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    settings: TransportSettings,
}

impl Connection {
    pub async fn dial(addr: &ProcessAddress, settings: TransportSettings) -> Result<Self> {
        let stream = with_timeout(
            settings.io_timeout,
            TcpStream::connect((addr.host.as_str(), addr.port)),
        )
        .await??;
        let peer = stream.peer_addr()?;
        debug!("Connected to {} ({})", addr, peer);
        Ok(Self::accepted(stream, peer, settings))
    }

    pub fn accepted(stream: TcpStream, peer: SocketAddr, settings: TransportSettings) -> Self {
        Self {
            stream,
            peer,
            settings,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub async fn send(&mut self, message: &ProtocolMessage) -> Result<()> {
        let max = self.settings.max_frame_bytes;
        with_timeout(self.settings.io_timeout, write_frame(&mut self.stream, message, max)).await?
    }

    pub async fn receive(&mut self) -> Result<ProtocolMessage> {
        self.receive_within(self.settings.io_timeout).await
    }

    /// Reads one message, giving up after `timeout`.
    pub async fn receive_within(&mut self, timeout: Duration) -> Result<ProtocolMessage> {
        let max = self.settings.max_frame_bytes;
        with_timeout(timeout, read_frame(&mut self.stream, max)).await?
    }
}

async fn with_timeout<F: Future>(duration: Duration, future: F) -> Result<F::Output> {
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| RouterError::Timeout(duration))
}
