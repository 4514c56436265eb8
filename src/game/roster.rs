//! Roster reconciliation against an authoritative vessel list

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::game::vessel::Vessel;
use crate::ws::protocol::VesselSnapshot;

/// The set of vessels known to a participant, keyed by id
pub type Roster = HashMap<Uuid, Vessel>;

/// Reconcile a local roster against an authoritative membership list
///
/// Ids missing locally are constructed at the spawn coordinate; ids absent
/// from the authoritative list are removed. Vessels present on both sides are
/// left untouched — body state arrives separately through body snapshots, so
/// this routine only corrects membership. Postcondition: the local id set
/// equals the authoritative id set.
pub fn sync_roster(local: &mut Roster, authoritative: &[VesselSnapshot]) {
    for snap in authoritative {
        if !local.contains_key(&snap.id) {
            debug!(vessel_id = %snap.id, "adding vessel");
            local.insert(snap.id, Vessel::at_spawn(snap.id));
        }
    }

    local.retain(|id, _| {
        let keep = authoritative.iter().any(|snap| snap.id == *id);
        if !keep {
            debug!(vessel_id = %id, "removing vessel");
        }
        keep
    });
}
