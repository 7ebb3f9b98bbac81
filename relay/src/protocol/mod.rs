//! Wire protocols: native messaging framing and relay messages

pub mod messages;
pub mod native;

pub use messages::{
    HostResponse, InboundEvent, OutboundRequest, RelayMessage, GRACEFUL_DISCONNECT,
};
pub use native::{read_message, write_message, NativeCodec};
