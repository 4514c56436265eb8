//! Headless client session: prediction, jitter buffering, reconciliation
//!
//! Composes the jitter buffer, ping/offset estimator, roster shadow and
//! control reconciler into the client half of the sync protocol. Rendering
//! is a separate collaborator that only reads vessel state, so this runs
//! (and tests) without a display.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::game::controls::{apply_remote, ControlReconciler, InputSample};
use crate::game::{sync_roster, Roster};
use crate::sync::{PingEstimator, TimedEventQueue};
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Fatal session failures
///
/// There is no partial recovery: the caller abandons the session entirely
/// and reconnects from scratch.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("server error {code}: {message}")]
    ServerFault { code: String, message: String },
}

/// Client-side synchronization core for one connection
pub struct ClientSession {
    /// Our connection identity, supplied by the transport at connect time;
    /// doubles as our vessel id once joined
    player_id: Uuid,
    joined: bool,
    vessels: Roster,
    queue: TimedEventQueue<ServerMsg>,
    ping: PingEstimator,
    clock_offset: i64,
    reconciler: ControlReconciler,
}

impl ClientSession {
    pub fn new(player_id: Uuid) -> Self {
        Self {
            player_id,
            joined: false,
            vessels: Roster::new(),
            queue: TimedEventQueue::new(),
            ping: PingEstimator::new(),
            clock_offset: 0,
            reconciler: ControlReconciler::new(),
        }
    }

    pub fn player_id(&self) -> Uuid {
        self.player_id
    }

    pub fn vessels(&self) -> &Roster {
        &self.vessels
    }

    /// Estimated offset from the local clock to the server clock, millis
    pub fn clock_offset(&self) -> i64 {
        self.clock_offset
    }

    /// Our best estimate of the shared clock
    pub fn shared_now(&self, local_now: u64) -> u64 {
        (local_now as i64 + self.clock_offset).max(0) as u64
    }

    /// Feed one inbound message from the transport
    ///
    /// Ping probes are answered immediately (buffering them would poison the
    /// latency estimate); a server error is fatal. Everything else goes into
    /// the jitter buffer stamped with its server timestamp and is applied on
    /// the next tick once the shared clock reaches it.
    pub fn ingest(
        &mut self,
        msg: ServerMsg,
        local_now: u64,
    ) -> Result<Option<ClientMsg>, ClientError> {
        match msg {
            ServerMsg::ClientPing {
                start_time,
                average_ping_ms,
            } => {
                self.ping.adopt(average_ping_ms);
                self.clock_offset = self.ping.clock_offset(start_time, local_now);
                debug!(
                    average_ping_ms,
                    clock_offset = self.clock_offset,
                    "Ping probe"
                );
                Ok(Some(ClientMsg::ClientPong { start_time }))
            }
            ServerMsg::Error { code, message } => {
                warn!(code = %code, "Server reported fatal error");
                Err(ClientError::ServerFault { code, message })
            }
            other => {
                let ts = other.timestamp();
                self.queue.push(ts, other);
                Ok(None)
            }
        }
    }

    /// Run one fixed simulation step; returns the messages to send
    ///
    /// Drains due events in server-intended order, samples input, emits a
    /// control delta only on change, advances every vessel's predicted
    /// motion, and reports our own predicted body.
    pub fn tick(&mut self, input: &InputSample, local_now: u64, dt: f32) -> Vec<ClientMsg> {
        let mut outbound = Vec::new();

        if !self.joined {
            self.joined = true;
            outbound.push(ClientMsg::JoinGame);
            return outbound;
        }

        for event in self.queue.drain(local_now, self.clock_offset) {
            self.apply(event);
        }

        self.reconciler.sample_input(input);
        if let Some(controls) = self.reconciler.take_change() {
            // Prediction applies our intent immediately; the server echo
            // carries the same values and converges remotes
            if let Some(own) = self.vessels.get_mut(&self.player_id) {
                apply_remote(own, controls.steering, controls.sail_state);
            }
            outbound.push(ClientMsg::ControlsSend {
                id: self.player_id,
                steering: controls.steering,
                sail_state: controls.sail_state,
                ts: self.shared_now(local_now),
            });
        }

        for vessel in self.vessels.values_mut() {
            vessel.update(dt);
        }

        if let Some(own) = self.vessels.get(&self.player_id) {
            outbound.push(ClientMsg::BodySend {
                x: own.x,
                y: own.y,
                rotation: own.rotation,
                current_speed: own.current_speed,
            });
        }

        outbound
    }

    /// Apply one released event to the shadow world
    fn apply(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::JoinOk { ships } | ServerMsg::PlayerListChange { ships } => {
                sync_roster(&mut self.vessels, &ships);
            }
            ServerMsg::ControlsReceive {
                id,
                steering,
                sail_state,
                ..
            } => {
                // Unknown vessel ids are ignored idempotently
                if let Some(vessel) = self.vessels.get_mut(&id) {
                    apply_remote(vessel, steering, sail_state);
                }
            }
            ServerMsg::BodyReceive { ships } => {
                for snap in &ships {
                    // Never overwrite our own predicted body; the server
                    // trusts our reports, not the other way around
                    if snap.id == self.player_id {
                        continue;
                    }
                    if let Some(vessel) = self.vessels.get_mut(&snap.id) {
                        vessel.apply_snapshot(snap);
                    }
                }
            }
            // Handled in ingest, never buffered
            ServerMsg::ClientPing { .. } | ServerMsg::Error { .. } => {}
        }
    }
}
