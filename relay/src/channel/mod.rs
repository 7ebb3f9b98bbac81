//! Native host channel: transport seam, host launch, connection lifecycle

pub mod host;
pub mod manager;
pub mod transport;

pub use host::{validate_host_name, HostManifest, NativeHostConnector};
pub use manager::{ChannelManager, ConnectionId};
pub use transport::{Connector, Port, PortReader, PortWriter};
