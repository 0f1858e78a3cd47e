//! Connection gateway
//!
//! The duplex channel to the server, seen from the simulation. Sends are fire
//! and forget; inbound traffic is queued by the transport and polled between
//! frames.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use thiserror::Error;

use super::protocol::{ClientMessage, ProtocolError, encode};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("channel closed")]
    Closed,
    #[error("outbound buffer full ({0} messages)")]
    Full(usize),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Something the transport observed
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    /// One text frame from the server
    Message(String),
    Closed,
    Error(String),
}

/// Channel health as last reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// Duplex message channel to the server
pub trait Gateway {
    /// Queue a message for the server
    fn send(&mut self, message: &ClientMessage) -> Result<(), GatewayError>;

    /// Next inbound event, if any is waiting
    fn poll(&mut self) -> Option<ChannelEvent>;
}

/// In-process gateway: inbound events are pushed by hand, outbound frames are
/// kept for inspection. Used by the headless driver and tests.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inbound: VecDeque<ChannelEvent>,
    sent: Vec<String>,
    capacity: Option<usize>,
    closed: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that refuses sends once `capacity` frames are buffered
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Queue an inbound event
    pub fn push(&mut self, event: ChannelEvent) {
        self.inbound.push_back(event);
    }

    /// Queue an inbound text frame
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.push(ChannelEvent::Message(text.into()));
    }

    /// Mark the channel closed and report it to the client
    pub fn close(&mut self) {
        self.closed = true;
        self.push(ChannelEvent::Closed);
    }

    /// Frames sent so far
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Take all frames sent so far
    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl Gateway for MemoryGateway {
    fn send(&mut self, message: &ClientMessage) -> Result<(), GatewayError> {
        if self.closed {
            return Err(GatewayError::Closed);
        }
        if let Some(capacity) = self.capacity {
            if self.sent.len() >= capacity {
                return Err(GatewayError::Full(capacity));
            }
        }
        self.sent.push(encode(message)?);
        Ok(())
    }

    fn poll(&mut self) -> Option<ChannelEvent> {
        self.inbound.pop_front()
    }
}

/// Gateway over std channels, for a transport running on its own thread
#[derive(Debug)]
pub struct ChannelGateway {
    outbound: Sender<String>,
    inbound: Receiver<ChannelEvent>,
    disconnected: bool,
}

impl ChannelGateway {
    pub fn new(outbound: Sender<String>, inbound: Receiver<ChannelEvent>) -> Self {
        Self {
            outbound,
            inbound,
            disconnected: false,
        }
    }
}

impl Gateway for ChannelGateway {
    fn send(&mut self, message: &ClientMessage) -> Result<(), GatewayError> {
        let text = encode(message)?;
        self.outbound.send(text).map_err(|_| GatewayError::Closed)
    }

    fn poll(&mut self) -> Option<ChannelEvent> {
        if self.disconnected {
            return None;
        }
        match self.inbound.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                // Report the dropped transport once
                self.disconnected = true;
                Some(ChannelEvent::Closed)
            }
        }
    }
}
