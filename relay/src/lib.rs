//! Console relay
//!
//! Carries commands from a console UI to a native messaging host and the
//! host's answers back. The [`ChannelManager`] owns the single connection to
//! the host; the [`RelayRouter`] sits between it and any number of UI
//! contexts.

pub mod channel;
pub mod config;
pub mod error;
pub mod protocol;
pub mod router;

pub use channel::{ChannelManager, Connector, NativeHostConnector, Port};
pub use config::Config;
pub use error::{Error, Result};
pub use protocol::{HostResponse, InboundEvent, OutboundRequest, RelayMessage};
pub use router::{RelayClient, RelayRouter};
