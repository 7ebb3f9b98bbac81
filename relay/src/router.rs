//! Relay router between UI contexts and the channel manager
//!
//! UI contexts never touch the channel manager. They hold a [`RelayClient`],
//! send `executeNativeCommand` requests through it, and subscribe to the
//! router's broadcast of channel events. A UI context can come and go at any
//! time; events published while nobody listens are dropped.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::channel::ChannelManager;
use crate::error::{Error, Result};
use crate::protocol::{InboundEvent, RelayMessage};

/// Pending requests a router accepts before clients wait
const REQUEST_QUEUE_CAPACITY: usize = 16;

/// A request from a UI context and the slot for its dispatch result
struct Envelope {
    message: RelayMessage,
    reply: oneshot::Sender<Result<()>>,
}

/// Routes UI requests to the channel manager and channel events back to UI
pub struct RelayRouter {
    channel: Arc<ChannelManager>,
    requests: mpsc::Receiver<Envelope>,
    channel_events: broadcast::Receiver<InboundEvent>,
    outbox: broadcast::Sender<RelayMessage>,
}

/// UI-side endpoint of a relay router
#[derive(Clone)]
pub struct RelayClient {
    requests: mpsc::Sender<Envelope>,
    outbox: broadcast::Sender<RelayMessage>,
}

impl RelayRouter {
    /// Create a router and the client UI contexts use to reach it.
    ///
    /// The router subscribes to the channel manager here, once, so no event
    /// published after construction is missed.
    pub fn new(channel: Arc<ChannelManager>, event_capacity: usize) -> (Self, RelayClient) {
        let (requests_tx, requests) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let (outbox, _) = broadcast::channel(event_capacity);
        let channel_events = channel.subscribe();

        let router = Self {
            channel,
            requests,
            channel_events,
            outbox: outbox.clone(),
        };
        let client = RelayClient {
            requests: requests_tx,
            outbox,
        };
        (router, client)
    }

    /// Forward a command to the native host.
    ///
    /// The host's answer arrives later as a broadcast event. Errors here
    /// mean the command never reached the host.
    pub async fn handle_execute_request(&self, command: &str) -> Result<()> {
        info!("Executing native command: {}", command);
        self.channel.send(command).await
    }

    /// Dispatch one message received from a UI context
    pub async fn handle_message(&self, message: RelayMessage) -> Result<()> {
        match message {
            RelayMessage::ExecuteNativeCommand { command } => {
                self.handle_execute_request(&command).await
            }
            other => Err(Error::UnexpectedMessage(other.kind().to_string())),
        }
    }

    /// Re-broadcast a channel event to whichever UI context is listening
    fn forward(&self, event: InboundEvent) {
        let message = RelayMessage::from(event);
        let kind = message.kind();
        if self.outbox.send(message).is_err() {
            debug!("No UI context listening; dropped {}", kind);
        }
    }

    /// Run until every client is gone, then close the channel
    pub async fn run(mut self) {
        info!("Relay router started for host {}", self.channel.host_name());

        loop {
            tokio::select! {
                request = self.requests.recv() => {
                    let Some(envelope) = request else {
                        info!("All relay clients closed");
                        break;
                    };
                    let result = self.handle_message(envelope.message).await;
                    if let Err(e) = &result {
                        warn!(code = e.code(), "Relay request failed: {}", e);
                    }
                    // The requester may have gone away; nothing to report to.
                    let _ = envelope.reply.send(result);
                }
                event = self.channel_events.recv() => {
                    match event {
                        Ok(event) => self.forward(event),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Relay router lagged; {} channel events skipped", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("Channel event stream closed");
                            break;
                        }
                    }
                }
            }
        }

        self.channel.disconnect().await;
        info!("Relay router stopped");
    }
}

impl RelayClient {
    /// Attach a UI context to the router's event broadcast
    pub fn subscribe(&self) -> broadcast::Receiver<RelayMessage> {
        self.outbox.subscribe()
    }

    /// Ask the router to run a command on the native host.
    ///
    /// Resolves once the command has been handed to the host (or failed to
    /// be), not when the host answers.
    pub async fn execute(&self, command: impl Into<String>) -> Result<()> {
        self.send(RelayMessage::ExecuteNativeCommand {
            command: command.into(),
        })
        .await
    }

    /// Send a raw relay message to the router
    pub async fn send(&self, message: RelayMessage) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.requests
            .send(Envelope { message, reply })
            .await
            .map_err(|_| Error::RouterUnavailable)?;

        reply_rx.await.map_err(|_| Error::RouterUnavailable)?
    }
}
