//! Channel and relay message types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Disconnect reason used when the transport reports no error
pub const GRACEFUL_DISCONNECT: &str = "graceful";

/// Request written to the native host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    pub command: String,
}

impl OutboundRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Message received from the native host.
///
/// Fields the relay does not interpret are kept in `extra` and passed on
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(
        rename = "current_dir_for_browser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_directory_hint: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HostResponse {
    /// Output text, if the host sent any
    pub fn output_text(&self) -> Option<&str> {
        non_empty(&self.output)
    }

    /// Error text, if the host sent any.
    /// Hosts commonly send `"error": ""` on success; that counts as absent.
    pub fn error_text(&self) -> Option<&str> {
        non_empty(&self.error)
    }

    /// Working directory hint, if the host sent one
    pub fn directory_hint(&self) -> Option<&str> {
        non_empty(&self.current_directory_hint)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Event produced by the channel manager
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Response(HostResponse),
    Disconnected { reason: String },
    ConnectionFailed { reason: String },
}

impl InboundEvent {
    /// Build a disconnect event from the transport's optional error
    pub fn disconnected(error: Option<String>) -> Self {
        InboundEvent::Disconnected {
            reason: error.unwrap_or_else(|| GRACEFUL_DISCONNECT.to_string()),
        }
    }
}

/// Message crossing the relay boundary between UI and router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayMessage {
    ExecuteNativeCommand { command: String },
    NativeHostResponse { payload: HostResponse },
    NativeHostDisconnected { error: String },
    NativeHostConnectionFailed { error: String },
}

impl RelayMessage {
    /// Wire name of the message type
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::ExecuteNativeCommand { .. } => "executeNativeCommand",
            RelayMessage::NativeHostResponse { .. } => "nativeHostResponse",
            RelayMessage::NativeHostDisconnected { .. } => "nativeHostDisconnected",
            RelayMessage::NativeHostConnectionFailed { .. } => "nativeHostConnectionFailed",
        }
    }
}

impl From<InboundEvent> for RelayMessage {
    fn from(event: InboundEvent) -> Self {
        match event {
            InboundEvent::Response(payload) => RelayMessage::NativeHostResponse { payload },
            InboundEvent::Disconnected { reason } => {
                RelayMessage::NativeHostDisconnected { error: reason }
            }
            InboundEvent::ConnectionFailed { reason } => {
                RelayMessage::NativeHostConnectionFailed { error: reason }
            }
        }
    }
}
