//! Network boundary: wire protocol and the gateway abstraction

pub mod gateway;
pub mod protocol;

pub use gateway::{
    ChannelEvent, ChannelGateway, ConnectionState, Gateway, GatewayError, MemoryGateway,
};
pub use protocol::{
    ClientMessage, ProtocolError, ServerMessage, SessionDto, decode, encode,
};
