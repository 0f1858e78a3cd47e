//! Frame scheduler
//!
//! Turns wall-clock time into whole simulation frames and wires the simulation
//! to a [`Gateway`]: inbound events are applied before each frame, outbound
//! messages are flushed after it.

use crate::consts::{MAX_FRAME_DELTA, MAX_SUBSTEPS};
use crate::net::gateway::{ConnectionState, Gateway};
use crate::net::protocol::ClientMessage;
use crate::settings::Settings;
use crate::sim::{SimState, TickInput, handle_event, tick};

/// Accumulator that hands out fixed-length frames
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f64,
    accumulator: f64,
}

impl FixedTimestep {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            dt: 1.0 / frame_rate.max(1) as f64,
            accumulator: 0.0,
        }
    }

    /// Add elapsed wall time (clamped so a stall doesn't queue a burst)
    pub fn accumulate(&mut self, elapsed: f64) {
        if elapsed.is_finite() && elapsed > 0.0 {
            self.accumulator += elapsed.min(MAX_FRAME_DELTA);
        }
    }

    pub fn consume_frame(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// A running client session
pub struct Client<G: Gateway> {
    state: SimState,
    gateway: G,
    input: TickInput,
    timestep: FixedTimestep,
    connection: ConnectionState,
    outbox: Vec<ClientMessage>,
    dropped: u64,
}

impl<G: Gateway> Client<G> {
    pub fn new(settings: Settings, gateway: G) -> Self {
        let timestep = FixedTimestep::new(settings.frame_rate);
        Self {
            state: SimState::new(settings),
            gateway,
            input: TickInput::default(),
            timestep,
            connection: ConnectionState::default(),
            outbox: Vec::new(),
            dropped: 0,
        }
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Input state read by the next frame
    pub fn input_mut(&mut self) -> &mut TickInput {
        &mut self.input
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Outbound messages the gateway refused
    pub fn dropped_messages(&self) -> u64 {
        self.dropped
    }

    /// Apply every inbound event waiting on the gateway
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.gateway.poll() {
            self.connection = handle_event(&mut self.state, event, self.connection);
            handled += 1;
        }
        handled
    }

    /// Run exactly one frame
    pub fn step(&mut self) {
        self.pump();
        tick(&mut self.state, &self.input, &mut self.outbox);
        // One-shot actions are consumed by the first frame that sees them
        self.input.clear_actions();
        self.flush();
    }

    /// Advance by elapsed wall time; returns the number of frames run
    pub fn update(&mut self, elapsed: f64) -> u32 {
        self.timestep.accumulate(elapsed);
        let mut frames = 0;
        while frames < MAX_SUBSTEPS && self.timestep.consume_frame() {
            self.step();
            frames += 1;
        }
        frames
    }

    fn flush(&mut self) {
        for message in self.outbox.drain(..) {
            if let Err(e) = self.gateway.send(&message) {
                self.dropped += 1;
                log::warn!("Dropped outbound message: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::gateway::{ChannelEvent, MemoryGateway};

    #[test]
    fn test_fixed_timestep() {
        let mut ts = FixedTimestep::new(8);
        ts.accumulate(0.25);
        assert!(ts.consume_frame());
        assert!(ts.consume_frame());
        assert!(!ts.consume_frame());

        // Long stalls are clamped
        ts.reset();
        ts.accumulate(10.0);
        let mut n = 0;
        while ts.consume_frame() {
            n += 1;
        }
        assert_eq!(n, 2);
    }

    #[test]
    fn test_zero_frame_rate_runs_at_one_fps() {
        let mut ts = FixedTimestep::new(0);
        ts.accumulate(0.25);
        assert!(!ts.consume_frame());
        for _ in 0..3 {
            ts.accumulate(0.25);
        }
        assert!(ts.consume_frame());
    }

    #[test]
    fn test_update_caps_substeps() {
        let mut client = Client::new(Settings::default(), MemoryGateway::new());
        assert_eq!(client.update(0.25), MAX_SUBSTEPS);
        assert_eq!(client.state().frame, MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_fire_consumed_once() {
        let mut client = Client::new(Settings::default(), MemoryGateway::new());
        client
            .gateway_mut()
            .push_text(r#"{"type":"id","id":"me"}"#);
        client.input_mut().fire = true;
        client.step();
        client.step();
        assert_eq!(client.state().world.bullets.len(), 1);
    }

    #[test]
    fn test_keeps_running_after_disconnect() {
        let mut client = Client::new(Settings::default(), MemoryGateway::new());
        client.gateway_mut().push(ChannelEvent::Connected);
        client.gateway_mut().push_text(r#"{"type":"id","id":"me"}"#);
        client.step();
        assert_eq!(client.connection(), ConnectionState::Connected);

        client.gateway_mut().close();
        client.input_mut().right = true;
        client.step();
        client.step();
        assert_eq!(client.connection(), ConnectionState::Disconnected);
        assert_eq!(client.dropped_messages(), 2);
        assert_eq!(client.state().world.local_player().unwrap().pos.x, 404.0);
    }
}
