//! Adapter-id correlation between a saved profile and the live topology.
//!
//! Adapter ids change across reboots and driver reloads, while source and
//! target ids usually survive. Two strategies are provided:
//!
//! - `match_adapter_ids`: the primary strategy. Paths are correlated by
//!   exact (source id, target id); modes then borrow the corrected ids from
//!   their saved paths. Paths must be fixed first because target ids are only
//!   unique per adapter, so modes cannot be matched against live data alone.
//! - `match_by_friendly_name`: the alternate strategy, used after the primary
//!   apply failed. Correlates by exact friendly-name equality only.

use crate::types::topology::{AdapterId, Snapshot};


/// Result of the primary correlation pass.
#[derive(Debug, Clone)]
pub struct AdapterCorrection {
    pub snapshot: Snapshot,
    /// Paths whose adapter ids actually changed.
    pub paths_corrected: usize,
    /// Modes whose adapter ids actually changed.
    pub modes_corrected: usize,
}

impl AdapterCorrection {
    pub fn is_noop(&self) -> bool {
        self.paths_corrected == 0 && self.modes_corrected == 0
    }
}


/// Rewrite saved adapter ids to the live values wherever a path matches.
pub fn match_adapter_ids(saved: &Snapshot, live: &Snapshot) -> AdapterCorrection {
    let mut snapshot = saved.clone();
    let mut paths_corrected = 0;
    let mut modes_corrected = 0;

    for path in &mut snapshot.paths {
        let Some(current) = live
            .paths
            .iter()
            .find(|c| c.source.id == path.source.id && c.target.id == path.target.id)
        else {
            continue;
        };
        if path.source.adapter != current.source.adapter
            || path.target.adapter != current.target.adapter
        {
            paths_corrected += 1;
        }
        path.source.adapter = current.source.adapter;
        path.target.adapter = current.target.adapter;
    }

    for i in 0..snapshot.modes.len() {
        if !snapshot.modes[i].is_target() {
            continue;
        }
        let target_id = snapshot.modes[i].id;
        let Some(path) = snapshot.paths.iter().find(|p| p.target.id == target_id) else {
            continue;
        };
        let (source_id, source_adapter, target_adapter) =
            (path.source.id, path.source.adapter, path.target.adapter);

        // The paired source mode still carries the pre-correction adapter, so
        // it is recognised by sharing the target mode's original low part.
        let original_low = snapshot.modes[i].adapter.low;
        if let Some(source) = snapshot.modes.iter_mut().find(|m| {
            m.id == source_id && m.adapter.low == original_low && m.source().is_some()
        }) {
            modes_corrected += usize::from(source.adapter != source_adapter);
            source.adapter = source_adapter;
        }

        let mode = &mut snapshot.modes[i];
        modes_corrected += usize::from(mode.adapter != target_adapter);
        mode.adapter = target_adapter;
    }

    AdapterCorrection {
        snapshot,
        paths_corrected,
        modes_corrected,
    }
}


/// Correlate by exact friendly-name equality between saved identity slots and
/// live identity slots, starting from the unmodified saved profile.
///
/// Names are compared verbatim (no case folding, no EDID fallback): this
/// strategy rewrites target ids as well as adapter ids, so a loose match
/// would re-point a path at the wrong monitor.
pub fn match_by_friendly_name(saved: &Snapshot, live: &Snapshot) -> Snapshot {
    let mut snapshot = saved.clone();

    for i in 0..snapshot.modes.len() {
        let Some(name) = saved.identity(i).map(|id| id.friendly_name.as_str()) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let Some((live_adapter, live_id)) = live
            .identities
            .iter()
            .enumerate()
            .filter(|(_, cur)| !cur.friendly_name.is_empty() && cur.friendly_name == name)
            .find_map(|(j, _)| live.modes.get(j).map(|m| (m.adapter, m.id)))
        else {
            continue;
        };

        let original = snapshot.modes[i].adapter;
        repoint_adapter(&mut snapshot, original, live_adapter, live_id);
        snapshot.modes[i].adapter = live_adapter;
        snapshot.modes[i].id = live_id;
    }

    snapshot
}

fn repoint_adapter(snapshot: &mut Snapshot, original: AdapterId, adapter: AdapterId, target_id: u32) {
    for path in snapshot.paths.iter_mut().filter(|p| p.target.adapter == original) {
        path.target.adapter = adapter;
        path.source.adapter = adapter;
        path.target.id = target_id;
    }
    for mode in snapshot.modes.iter_mut().filter(|m| m.adapter == original) {
        mode.adapter = adapter;
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::testing::{identity, path, source, target};
    use crate::types::topology::MonitorIdentity;

    fn old() -> AdapterId {
        AdapterId::new(0x1111, 0)
    }

    fn new() -> AdapterId {
        AdapterId::new(0x2222, 0)
    }

    fn single(adapter: AdapterId, source_id: u32, target_id: u32) -> Snapshot {
        Snapshot::new(
            vec![path(adapter, source_id, target_id, 0, 1)],
            vec![source(adapter, source_id), target(adapter, target_id)],
            vec![MonitorIdentity::default(), identity("DELL U2720Q", "", 0, 0)],
        )
    }

    #[test]
    fn drifted_adapter_is_rewritten() {
        let saved = single(old(), 1, 2);
        let live = single(new(), 1, 2);
        let fixed = match_adapter_ids(&saved, &live);
        assert_eq!(fixed.paths_corrected, 1);
        assert_eq!(fixed.modes_corrected, 2);
        let snap = &fixed.snapshot;
        assert_eq!(snap.paths[0].source.adapter, new());
        assert_eq!(snap.paths[0].target.adapter, new());
        assert_eq!(snap.modes[0].adapter, new());
        assert_eq!(snap.modes[1].adapter, new());
    }

    #[test]
    fn same_topology_needs_no_correction() {
        let saved = single(old(), 1, 2);
        let fixed = match_adapter_ids(&saved, &saved);
        assert!(fixed.is_noop());
        assert_eq!(fixed.snapshot, saved);
    }

    #[test]
    fn unmatched_ids_are_left_alone() {
        let saved = single(old(), 1, 2);
        let live = single(new(), 1, 3);
        let fixed = match_adapter_ids(&saved, &live);
        assert!(fixed.is_noop());
        assert_eq!(fixed.snapshot, saved);
    }

    #[test]
    fn original_is_not_mutated() {
        let saved = single(old(), 1, 2);
        let before = saved.clone();
        let _ = match_adapter_ids(&saved, &single(new(), 1, 2));
        assert_eq!(saved, before);
    }

    #[test]
    fn source_mode_on_other_adapter_is_not_touched() {
        // Source mode id 1 exists on two adapters; only the one sharing the
        // target's original adapter is paired with the path.
        let other = AdapterId::new(0x9999, 0);
        let mut saved = single(old(), 1, 2);
        saved.modes.insert(0, source(other, 1));
        saved.identities.insert(0, MonitorIdentity::default());
        saved.paths[0].source.mode_index = 1;
        saved.paths[0].target.mode_index = 2;

        let fixed = match_adapter_ids(&saved, &single(new(), 1, 2)).snapshot;
        assert_eq!(fixed.modes[0].adapter, other);
        assert_eq!(fixed.modes[1].adapter, new());
        assert_eq!(fixed.modes[2].adapter, new());
    }

    #[test]
    fn friendly_name_match_repoints_paths_and_modes() {
        let saved = single(old(), 1, 2);
        // Same monitor now enumerates as target 7 on a new adapter.
        let live = single(new(), 1, 7);
        let fixed = match_by_friendly_name(&saved, &live);
        assert_eq!(fixed.paths[0].target.id, 7);
        assert_eq!(fixed.paths[0].target.adapter, new());
        assert_eq!(fixed.paths[0].source.adapter, new());
        assert_eq!(fixed.modes[0].adapter, new());
        assert_eq!(fixed.modes[1].adapter, new());
        assert_eq!(fixed.modes[1].id, 7);
        // Source mode keeps its id.
        assert_eq!(fixed.modes[0].id, 1);
    }

    #[test]
    fn friendly_name_match_is_exact() {
        let saved = single(old(), 1, 2);
        let mut live = single(new(), 1, 7);
        live.identities[1].friendly_name = "dell u2720q".into();
        let fixed = match_by_friendly_name(&saved, &live);
        assert_eq!(fixed, saved);
    }

    #[test]
    fn empty_names_never_match() {
        let mut saved = single(old(), 1, 2);
        saved.identities[1].friendly_name.clear();
        let mut live = single(new(), 1, 7);
        live.identities[1].friendly_name.clear();
        assert_eq!(match_by_friendly_name(&saved, &live), saved);
    }
}
