//! Edge-triggered control reconciliation
//!
//! Raw directional input is sampled into a control state every tick, but a
//! delta goes on the wire only when the state actually changed. Remote deltas
//! are applied verbatim.

use crate::game::physics::SAIL_STEP_PER_TICK;
use crate::game::vessel::{ControlState, Vessel};

/// Raw directional input for one tick
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSample {
    pub turn_left: bool,
    pub turn_right: bool,
    pub sail_up: bool,
    pub sail_down: bool,
}

/// Translates per-tick input into control intent and emits only the edges
#[derive(Debug, Default)]
pub struct ControlReconciler {
    current: ControlState,
    previous: ControlState,
}

impl ControlReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ControlState {
        self.current
    }

    /// Sample raw input into the current control state
    ///
    /// Steering is level-based: it reflects the input held this tick and is
    /// not integrated. Sail state is integrated, stepping by a fixed
    /// increment per tick and clamped to [0, 1].
    pub fn sample_input(&mut self, input: &InputSample) {
        self.current.steering = match (input.turn_left, input.turn_right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        };

        if input.sail_up && !input.sail_down {
            self.current.sail_state = (self.current.sail_state + SAIL_STEP_PER_TICK).min(1.0);
        } else if input.sail_down && !input.sail_up {
            self.current.sail_state = (self.current.sail_state - SAIL_STEP_PER_TICK).max(0.0);
        }
    }

    /// Return the current state if it differs from the last emitted one
    ///
    /// Edge-triggered: unchanged input across any number of ticks produces
    /// nothing, bounding control traffic.
    pub fn take_change(&mut self) -> Option<ControlState> {
        if self.current != self.previous {
            self.previous = self.current;
            Some(self.current)
        } else {
            None
        }
    }
}

/// Apply a remote control delta to a vessel, verbatim
///
/// No validation or clamping happens here: the server trusts client intent at
/// this layer.
pub fn apply_remote(vessel: &mut Vessel, steering: i8, sail_state: f32) {
    vessel.controls = ControlState {
        steering,
        sail_state,
    };
}
