//! Transport seam between the channel manager and a native host

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;

use crate::error::Result;

pub type PortReader = Box<dyn AsyncRead + Send + Unpin>;
pub type PortWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// An opened bidirectional channel to a native host.
///
/// `process` is set when the host runs as a child process; its exit status
/// decides whether an end of stream counts as a graceful disconnect.
pub struct Port {
    pub reader: PortReader,
    pub writer: PortWriter,
    pub process: Option<Child>,
}

impl Port {
    pub fn new(reader: PortReader, writer: PortWriter) -> Self {
        Self {
            reader,
            writer,
            process: None,
        }
    }

    /// Port over an in-memory stream, used for embedding and tests
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::new(Box::new(reader), Box::new(writer))
    }

    pub fn with_process(mut self, child: Child) -> Self {
        self.process = Some(child);
        self
    }
}

/// Opens ports to native hosts by registered name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host_name: &str) -> Result<Port>;
}

/// Connector handing out in-memory ports; the host ends go to the test
#[cfg(test)]
pub(crate) struct DuplexConnector {
    hosts: tokio::sync::mpsc::UnboundedSender<tokio::io::DuplexStream>,
}

#[cfg(test)]
impl DuplexConnector {
    pub(crate) fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<tokio::io::DuplexStream>) {
        let (hosts, host_rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { hosts }, host_rx)
    }
}

#[cfg(test)]
#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self, _host_name: &str) -> Result<Port> {
        let (relay_end, host_end) = tokio::io::duplex(4096);
        self.hosts
            .send(host_end)
            .map_err(|_| crate::error::Error::Transport("test host receiver dropped".to_string()))?;
        Ok(Port::from_stream(relay_end))
    }
}
