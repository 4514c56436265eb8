//! Game simulation modules

pub mod controls;
pub mod physics;
pub mod roster;
pub mod vessel;

pub use roster::{sync_roster, Roster};
pub use vessel::{ControlState, Vessel};

/// Raw per-tick directional input, re-exported for frontends
pub use controls::{ControlReconciler, InputSample};
