//! Vessel state and per-tick propulsion integration

use uuid::Uuid;

use crate::game::physics::{
    self, normalize_rotation_deg, rotation_to_vector, Vec2, TURN_RATE_DEG_PER_SEC, WORLD_SIZE,
};
use crate::ws::protocol::VesselSnapshot;

/// Current control intent for a vessel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlState {
    /// Steering direction: -1 (port), 0, or 1 (starboard)
    pub steering: i8,
    /// Sail deployment in [0, 1]
    pub sail_state: f32,
}

/// A tracked moving entity: hull position, heading, sail and control state
///
/// The id is assigned at join from the connection identity and never changes
/// for the vessel's lifetime.
#[derive(Debug, Clone)]
pub struct Vessel {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Heading in radians, kept normalized
    pub rotation: f32,
    /// Scalar forward speed along the heading
    pub current_speed: f32,
    /// Absolute sail trim in radians, recomputed every tick
    pub sail_rotation: f32,
    pub controls: ControlState,
}

impl Vessel {
    pub fn new(id: Uuid, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            rotation: 0.0,
            current_speed: 0.0,
            sail_rotation: 0.0,
            controls: ControlState::default(),
        }
    }

    /// Construct a vessel at the fixed spawn coordinate
    pub fn at_spawn(id: Uuid) -> Self {
        Self::new(id, physics::SPAWN_X, physics::SPAWN_Y)
    }

    /// Advance one tick of deterministic propulsion
    ///
    /// Heading turns with the steering input; speed is the sail state times
    /// the wind pressure projected onto the hull axis; position advances
    /// along the heading and is clamped to the world bounds.
    pub fn update(&mut self, dt: f32) {
        let turn = self.controls.steering as f32 * TURN_RATE_DEG_PER_SEC * dt;
        let rotation_deg = normalize_rotation_deg(self.rotation.to_degrees() + turn);
        self.rotation = rotation_deg.to_radians();

        let heading = rotation_to_vector(self.rotation);
        let wind = physics::wind_vector_at(Vec2::new(self.x, self.y));

        self.sail_rotation = physics::sail_rotation(heading, wind);
        let sail = rotation_to_vector(self.sail_rotation);

        self.current_speed =
            self.controls.sail_state * physics::projected_pressure(heading, sail, wind);

        let half = WORLD_SIZE / 2.0;
        self.x = (self.x + heading.x * self.current_speed * dt).clamp(-half, half);
        self.y = (self.y + heading.y * self.current_speed * dt).clamp(-half, half);
    }

    pub fn snapshot(&self) -> VesselSnapshot {
        VesselSnapshot {
            id: self.id,
            x: self.x,
            y: self.y,
            rotation: self.rotation,
            current_speed: self.current_speed,
            sail_state: self.controls.sail_state,
        }
    }

    /// Overwrite body state from an authoritative snapshot
    ///
    /// Control state is not touched: controls travel on their own channel.
    pub fn apply_snapshot(&mut self, snap: &VesselSnapshot) {
        self.x = snap.x;
        self.y = snap.y;
        self.rotation = snap.rotation;
        self.current_speed = snap.current_speed;
    }
}
