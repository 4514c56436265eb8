//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request to join the game world
    JoinGame,

    /// Control delta, sent only when the control state actually changed
    ControlsSend {
        /// Sender's vessel id; the server verifies it against the
        /// connection identity and drops mismatches
        id: Uuid,
        /// Steering direction: -1, 0 or 1
        steering: i8,
        /// Sail deployment in [0, 1]
        sail_state: f32,
        /// Sender's estimate of the shared clock, unix millis
        ts: u64,
    },

    /// Client-predicted body state for the sender's own vessel
    BodySend {
        x: f32,
        y: f32,
        /// Heading in radians
        rotation: f32,
        current_speed: f32,
    },

    /// Echo of a server ping probe
    ClientPong {
        /// Server clock at probe send time, echoed back verbatim
        start_time: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Reply to the joiner with the full roster
    JoinOk { ships: Vec<VesselSnapshot> },

    /// Roster membership changed (join or disconnect), sent to everyone else
    PlayerListChange { ships: Vec<VesselSnapshot> },

    /// Control delta relayed to the origin and to all other connections
    ControlsReceive {
        /// Vessel the delta applies to
        id: Uuid,
        steering: i8,
        sail_state: f32,
        /// Server-stamped shared-clock time, unix millis
        ts: u64,
    },

    /// Heartbeat snapshot of every vessel's body state
    BodyReceive { ships: Vec<VesselSnapshot> },

    /// Latency probe; the client echoes `start_time` back in a pong
    ClientPing {
        /// Server clock at probe send time
        start_time: u64,
        /// Server's current smoothed round-trip/2 estimate for this connection
        average_ping_ms: f32,
    },

    /// Fatal error; the client abandons the session on receipt
    Error { code: String, message: String },
}

impl ServerMsg {
    /// Server-stamped logical time carried by this message, if any
    ///
    /// Messages without a stamp sort at time zero and are released by the
    /// jitter buffer immediately, in arrival order.
    pub fn timestamp(&self) -> u64 {
        match self {
            ServerMsg::ControlsReceive { ts, .. } => *ts,
            _ => 0,
        }
    }
}

/// Full body + control state of one vessel on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselSnapshot {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Heading in radians
    pub rotation: f32,
    pub current_speed: f32,
    pub sail_state: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msg_round_trips_with_type_tag() {
        let msg = ClientMsg::ControlsSend {
            id: Uuid::new_v4(),
            steering: -1,
            sail_state: 0.5,
            ts: 1234,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"controls_send\""));
        let back: ClientMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn join_game_serializes_as_bare_tag() {
        let json = serde_json::to_string(&ClientMsg::JoinGame).unwrap();
        assert_eq!(json, "{\"type\":\"join_game\"}");
    }

    #[test]
    fn unknown_message_kind_fails_to_parse() {
        // Fail closed: an unrecognized tag is a parse error, dropped upstream
        let result = serde_json::from_str::<ClientMsg>("{\"type\":\"teleport\",\"x\":0}");
        assert!(result.is_err());
    }

    #[test]
    fn only_control_deltas_carry_a_timestamp() {
        let delta = ServerMsg::ControlsReceive {
            id: Uuid::new_v4(),
            steering: 1,
            sail_state: 0.25,
            ts: 9000,
        };
        assert_eq!(delta.timestamp(), 9000);
        assert_eq!(ServerMsg::BodyReceive { ships: vec![] }.timestamp(), 0);
    }
}
