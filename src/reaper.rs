use tracing::debug;

use crate::store::TrackStore;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reaped {
    pub removed: usize,
    pub frozen: usize,
}

/// Ages out tracks that were not matched in the current processed frame.
///
/// A track absent for more than `tolerance` frames is removed, unless it
/// carries a speed: then it is deactivated and kept.
pub fn sweep(store: &mut TrackStore, tolerance: u32) -> Reaped {
    let mut reaped = Reaped::default();
    let mut expired = Vec::new();

    for t in store.iter_mut().filter(|t| !t.matched_this_frame) {
        t.frames_absent = t.frames_absent.saturating_add(1);

        if t.frames_absent <= tolerance {
            continue;
        }

        if t.speed().is_some() {
            if t.active {
                t.active = false;
                reaped.frozen += 1;
                debug!(id = t.id, label = %t.label, "track frozen");
            }
        } else {
            expired.push(t.id);
        }
    }

    for id in expired {
        if store.remove(id).is_some() {
            reaped.removed += 1;
            debug!(id, "track removed");
        }
    }

    reaped
}
