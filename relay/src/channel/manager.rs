//! Native host connection management

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::transport::{Connector, PortReader, PortWriter};
use crate::error::{Error, Result};
use crate::protocol::native::{self, MAX_INBOUND_MESSAGE_SIZE};
use crate::protocol::{HostResponse, InboundEvent, OutboundRequest};

/// How long to wait for a host's exit status after it closes its output
const HOST_EXIT_GRACE: Duration = Duration::from_secs(2);

/// Identifier of one opened connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A live connection. Dropped from the manager on disconnect.
struct Connection {
    id: ConnectionId,
    writer: PortWriter,
    reader_task: JoinHandle<()>,
}

type ConnectionSlot = Arc<Mutex<Option<Connection>>>;

/// Owns the single connection to the native host.
///
/// The connection is opened lazily by the first send and re-opened by the
/// first send after a disconnect. Inbound messages and lifecycle changes
/// are published as [`InboundEvent`]s.
pub struct ChannelManager {
    host_name: String,
    connector: Arc<dyn Connector>,
    connection: ConnectionSlot,
    events: broadcast::Sender<InboundEvent>,
}

impl ChannelManager {
    /// Create a new channel manager
    pub fn new(host_name: impl Into<String>, connector: Arc<dyn Connector>, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            host_name: host_name.into(),
            connector,
            connection: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// Registered host name this manager connects to
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Subscribe to channel events
    pub fn subscribe(&self) -> broadcast::Receiver<InboundEvent> {
        self.events.subscribe()
    }

    /// Check whether a connection is currently open
    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Return the live connection, opening one if needed.
    ///
    /// An open failure is published as `ConnectionFailed` and returned as
    /// [`Error::ConnectFailed`].
    pub async fn ensure_connected(&self) -> Result<ConnectionId> {
        let mut slot = self.connection.lock().await;
        let conn = self.connect_locked(&mut slot).await?;
        Ok(conn.id)
    }

    /// Send a command to the native host
    pub async fn send(&self, command: &str) -> Result<()> {
        let mut slot = self.connection.lock().await;
        let conn = self.connect_locked(&mut slot).await?;

        debug!("Sending command on connection {}: {}", conn.id, command);
        let request = OutboundRequest::new(command);
        if let Err(e) = native::write_message(&mut conn.writer, &request).await {
            // The reader side observes the broken channel and reports the disconnect.
            warn!(code = e.code(), "Failed to write to native host on connection {}: {}", conn.id, e);
            return Err(e);
        }

        Ok(())
    }

    /// Close the connection without publishing a disconnect event
    pub async fn disconnect(&self) {
        if let Some(conn) = self.connection.lock().await.take() {
            info!("Closing native host connection {}", conn.id);
            conn.reader_task.abort();
        }
    }

    async fn connect_locked<'a>(&self, slot: &'a mut Option<Connection>) -> Result<&'a mut Connection> {
        if slot.is_none() {
            let conn = self.open().await?;
            *slot = Some(conn);
        }
        slot.as_mut().ok_or(Error::NotConnected)
    }

    /// Open a connection; the caller holds the slot lock
    async fn open(&self) -> Result<Connection> {
        info!("Connecting to native host: {}", self.host_name);

        let port = match self.connector.connect(&self.host_name).await {
            Ok(port) => port,
            Err(e) => {
                let reason = e.to_string();
                error!(code = e.code(), "Failed to connect to native host {}: {}", self.host_name, reason);
                publish(&self.events, InboundEvent::ConnectionFailed {
                    reason: reason.clone(),
                });
                return Err(Error::ConnectFailed { reason });
            }
        };

        let id = ConnectionId::new();
        let reader_task = tokio::spawn(run_inbound(
            id,
            port.reader,
            port.process,
            self.events.clone(),
            Arc::clone(&self.connection),
        ));

        info!("Native host connection {} established", id);
        Ok(Connection {
            id,
            writer: port.writer,
            reader_task,
        })
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.connection.try_lock() {
            if let Some(conn) = slot.take() {
                conn.reader_task.abort();
            }
        }
    }
}

/// Inbound listener for one connection.
///
/// Publishes every host message as a `Response`, then runs the disconnect
/// handler with the error the transport reported, if any.
async fn run_inbound(
    id: ConnectionId,
    mut reader: PortReader,
    process: Option<Child>,
    events: broadcast::Sender<InboundEvent>,
    slot: ConnectionSlot,
) {
    let transport_error = loop {
        match native::read_message::<_, HostResponse>(&mut reader, MAX_INBOUND_MESSAGE_SIZE).await {
            Ok(Some(response)) => {
                debug!("Received response on connection {}: {:?}", id, response);
                publish(&events, InboundEvent::Response(response));
            }
            Ok(None) => break exit_error(process).await,
            // Dropping the child on the way out kills a host that broke protocol.
            Err(e @ Error::Codec(_)) => break Some(e.to_string()),
            Err(e) => break Some(Error::Codec(e.to_string()).to_string()),
        }
    };

    on_disconnect(id, transport_error, &events, &slot).await;
}

/// Disconnect handler: clear the connection, then publish the reason
async fn on_disconnect(
    id: ConnectionId,
    transport_error: Option<String>,
    events: &broadcast::Sender<InboundEvent>,
    slot: &ConnectionSlot,
) {
    {
        let mut slot = slot.lock().await;
        if slot.as_ref().is_some_and(|conn| conn.id == id) {
            *slot = None;
        }
    }

    match &transport_error {
        Some(reason) => warn!("Native host connection {} lost: {}", id, reason),
        None => info!("Native host connection {} closed gracefully", id),
    }
    publish(events, InboundEvent::disconnected(transport_error));
}

/// Error to report once a host closed its output, judged by its exit status
async fn exit_error(process: Option<Child>) -> Option<String> {
    let mut child = process?;
    match timeout(HOST_EXIT_GRACE, child.wait()).await {
        Ok(Ok(status)) if status.success() => None,
        Ok(Ok(status)) => Some(format!("Native host has exited ({})", status)),
        Ok(Err(e)) => Some(format!("Native host has exited: {}", e)),
        Err(_) => {
            debug!("Native host closed its output but is still running");
            None
        }
    }
}

fn publish(events: &broadcast::Sender<InboundEvent>, event: InboundEvent) {
    if events.send(event).is_err() {
        debug!("No subscribers for channel event; dropped");
    }
}
