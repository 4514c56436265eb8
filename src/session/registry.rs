//! Authoritative session registry and tick loop
//!
//! Single source of truth for the vessel roster, keyed by connection
//! identity. One tokio task owns all of this state: network callbacks never
//! touch it directly, they enqueue a `SessionEvent` on a bounded channel and
//! every mutation happens during the tick's event-processing phase.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::controls::apply_remote;
use crate::game::{Roster, Vessel};
use crate::sync::PingEstimator;
use crate::util::time::{tick_delta, unix_millis, SIMULATION_TPS, TICK_DURATION_MICROS};
use crate::ws::protocol::{ClientMsg, ServerMsg, VesselSnapshot};

/// Capacity of the registry's inbound event channel
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Capacity of each connection's outbound message channel
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Events fed to the registry by transport callbacks and timers
#[derive(Debug)]
pub enum SessionEvent {
    /// Transport established a connection; `tx` is its outbound channel
    Connected {
        conn_id: Uuid,
        tx: mpsc::Sender<ServerMsg>,
    },
    /// A parsed message arrived on a connection
    Inbound {
        conn_id: Uuid,
        msg: ClientMsg,
        received_at: u64,
    },
    /// Transport-level disconnect notification
    Disconnected { conn_id: Uuid },
}

/// Lifecycle of a connection
///
/// Only Joined connections may steer a vessel; everything else from them is
/// dropped silently. Disconnection is terminal (entry removal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnPhase {
    Connected,
    Joined,
}

struct Connection {
    phase: ConnPhase,
    tx: mpsc::Sender<ServerMsg>,
    ping: PingEstimator,
    next_probe_at: u64,
}

/// Shared counters surfaced on the health endpoint
#[derive(Clone, Default)]
pub struct SessionStats {
    connections: Arc<AtomicUsize>,
    vessels: Arc<AtomicUsize>,
}

impl SessionStats {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn vessels(&self) -> usize {
        self.vessels.load(Ordering::Relaxed)
    }
}

/// Cloneable handle for feeding events into the registry task
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<SessionEvent>,
    pub stats: SessionStats,
}

/// The authoritative session registry
pub struct SessionRegistry {
    connections: HashMap<Uuid, Connection>,
    vessels: Roster,
    event_rx: mpsc::Receiver<SessionEvent>,
    stats: SessionStats,
    heartbeat_interval_ms: u64,
    ping_probe_interval_ms: u64,
    next_heartbeat_at: u64,
}

impl SessionRegistry {
    pub fn new(heartbeat_interval_ms: u64, ping_probe_interval_ms: u64) -> (Self, SessionHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let stats = SessionStats::default();

        let registry = Self {
            connections: HashMap::new(),
            vessels: Roster::new(),
            event_rx,
            stats: stats.clone(),
            heartbeat_interval_ms,
            ping_probe_interval_ms,
            next_heartbeat_at: 0,
        };

        (registry, SessionHandle { event_tx, stats })
    }

    /// Run the fixed-step tick loop
    pub async fn run(mut self) {
        info!(tps = SIMULATION_TPS, "Session registry started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            let now = unix_millis();

            // Drain everything the transport enqueued since the last tick
            while let Ok(event) = self.event_rx.try_recv() {
                self.process_event(event, now);
            }

            self.tick(now);
        }
    }

    /// Apply one event; no event ever aborts the loop
    pub fn process_event(&mut self, event: SessionEvent, now: u64) {
        match event {
            SessionEvent::Connected { conn_id, tx } => {
                info!(conn_id = %conn_id, "Connection registered");
                self.connections.insert(
                    conn_id,
                    Connection {
                        phase: ConnPhase::Connected,
                        tx,
                        ping: PingEstimator::new(),
                        next_probe_at: now + self.ping_probe_interval_ms,
                    },
                );
                self.publish_stats();
            }
            SessionEvent::Inbound {
                conn_id,
                msg,
                received_at,
            } => self.handle_inbound(conn_id, msg, received_at),
            SessionEvent::Disconnected { conn_id } => self.handle_disconnect(conn_id),
        }
    }

    /// Advance the world one tick and fire due timers
    pub fn tick(&mut self, now: u64) {
        let dt = tick_delta();
        for vessel in self.vessels.values_mut() {
            vessel.update(dt);
        }

        if now >= self.next_heartbeat_at {
            self.next_heartbeat_at = now + self.heartbeat_interval_ms;
            let snapshot = ServerMsg::BodyReceive {
                ships: self.roster_snapshot(),
            };
            self.broadcast(snapshot, None);
        }

        // Per-connection latency probes; removal of the entry on disconnect
        // is what cancels a connection's probe timer
        let probe_interval = self.ping_probe_interval_ms;
        let mut probes = Vec::new();
        for (conn_id, conn) in self.connections.iter_mut() {
            if now >= conn.next_probe_at {
                conn.next_probe_at = now + probe_interval;
                probes.push((
                    *conn_id,
                    ServerMsg::ClientPing {
                        start_time: now,
                        average_ping_ms: conn.ping.smoothed_ms(),
                    },
                ));
            }
        }
        for (conn_id, probe) in probes {
            self.send_to(conn_id, probe);
        }
    }

    fn handle_inbound(&mut self, conn_id: Uuid, msg: ClientMsg, received_at: u64) {
        let Some(conn) = self.connections.get_mut(&conn_id) else {
            debug!(conn_id = %conn_id, "Message from unknown connection, dropping");
            return;
        };

        match msg {
            ClientMsg::JoinGame => {
                if conn.phase == ConnPhase::Joined {
                    warn!(conn_id = %conn_id, "Duplicate join, ignoring");
                    return;
                }
                conn.phase = ConnPhase::Joined;

                // Vessel id is the connection identity: unique and stable
                // for the connection's lifetime
                self.vessels.insert(conn_id, Vessel::at_spawn(conn_id));
                self.publish_stats();

                let ships = self.roster_snapshot();
                info!(conn_id = %conn_id, vessel_count = ships.len(), "Player joined");

                self.send_to(conn_id, ServerMsg::JoinOk { ships: ships.clone() });
                self.broadcast(ServerMsg::PlayerListChange { ships }, Some(conn_id));
            }
            ClientMsg::ControlsSend {
                id,
                steering,
                sail_state,
                ts,
            } => {
                if conn.phase != ConnPhase::Joined {
                    debug!(conn_id = %conn_id, "Controls before join, dropping");
                    return;
                }
                // Clients only speak for their own vessel
                if id != conn_id {
                    warn!(conn_id = %conn_id, claimed = %id, "Control delta for foreign vessel, dropping");
                    return;
                }
                if let Some(vessel) = self.vessels.get_mut(&conn_id) {
                    apply_remote(vessel, steering, sail_state);
                }

                // Echo-and-relay: origin gets the delta back too
                let delta = ServerMsg::ControlsReceive {
                    id: conn_id,
                    steering,
                    sail_state,
                    ts,
                };
                self.send_to(conn_id, delta.clone());
                self.broadcast(delta, Some(conn_id));
            }
            ClientMsg::BodySend {
                x,
                y,
                rotation,
                current_speed,
            } => {
                if conn.phase != ConnPhase::Joined {
                    debug!(conn_id = %conn_id, "Body report before join, dropping");
                    return;
                }
                if !(x.is_finite() && y.is_finite() && rotation.is_finite() && current_speed.is_finite())
                {
                    warn!(conn_id = %conn_id, "Non-finite body report, dropping");
                    return;
                }
                // The server trusts client-reported positions
                if let Some(vessel) = self.vessels.get_mut(&conn_id) {
                    vessel.x = x;
                    vessel.y = y;
                    vessel.rotation = rotation;
                    vessel.current_speed = current_speed;
                }
            }
            ClientMsg::ClientPong { start_time } => {
                let sample = PingEstimator::sample_from_echo(received_at, start_time);
                let smoothed = conn.ping.record(sample);
                debug!(conn_id = %conn_id, sample_ms = sample, smoothed_ms = smoothed, "Pong");
            }
        }
    }

    fn handle_disconnect(&mut self, conn_id: Uuid) {
        // Removing the connection entry discards its ping estimator and
        // cancels its probe timer
        let known = self.connections.remove(&conn_id).is_some();
        let had_vessel = self.vessels.remove(&conn_id).is_some();
        if !known && !had_vessel {
            return; // idempotent: disconnect for an unknown id is a no-op
        }
        self.publish_stats();

        info!(conn_id = %conn_id, "Connection closed");

        if had_vessel {
            let ships = self.roster_snapshot();
            self.broadcast(ServerMsg::PlayerListChange { ships }, None);
        }
    }

    fn roster_snapshot(&self) -> Vec<VesselSnapshot> {
        self.vessels.values().map(Vessel::snapshot).collect()
    }

    /// Send to one connection; a stalled consumer loses messages rather than
    /// growing an unbounded queue
    fn send_to(&self, conn_id: Uuid, msg: ServerMsg) {
        let Some(conn) = self.connections.get(&conn_id) else {
            return;
        };
        match conn.tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %conn_id, "Outbound queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Writer is gone; the disconnect event will clean up
                debug!(conn_id = %conn_id, "Outbound channel closed");
            }
        }
    }

    fn broadcast(&self, msg: ServerMsg, exclude: Option<Uuid>) {
        for conn_id in self.connections.keys() {
            if Some(*conn_id) == exclude {
                continue;
            }
            self.send_to(*conn_id, msg.clone());
        }
    }

    fn publish_stats(&self) {
        self.stats
            .connections
            .store(self.connections.len(), Ordering::Relaxed);
        self.stats
            .vessels
            .store(self.vessels.len(), Ordering::Relaxed);
    }

    #[cfg(test)]
    fn vessel(&self, id: &Uuid) -> Option<&Vessel> {
        self.vessels.get(id)
    }
}
