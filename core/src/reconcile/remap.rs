//! Filter & remap: drop paths, compact the mode array, rewrite indices.
//!
//! Paths address modes by array position, so removing paths leaves holes in
//! the mode array that the apply primitive rejects. Compaction keeps only
//! referenced modes (in their original relative order) and rewrites every
//! surviving path through an old→new position table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::ReconcileError;
use crate::reconcile::index::{self, ModeSlots};
use crate::types::topology::{
    Mode, ModeBody, ModeKind, MonitorIdentity, Snapshot, PATH_SUPPORT_VIRTUAL_MODE,
};


/// Drop every path whose target id is in `drop`, then compact modes.
///
/// When at least one path was dropped, source and desktop-image bodies of the
/// remaining modes are refreshed from `live`: the saved geometry may assume a
/// neighbour that is no longer there.
pub fn filter_and_remap(
    snapshot: &Snapshot,
    drop: &BTreeSet<u32>,
    live: &Snapshot,
) -> Result<Snapshot, ReconcileError> {
    let mut paths: Vec<_> = snapshot
        .paths
        .iter()
        .filter(|p| !drop.contains(&p.target.id))
        .cloned()
        .collect();
    if paths.is_empty() {
        return Err(ReconcileError::NothingToApply);
    }
    let dropped_any = paths.len() < snapshot.paths.len();

    let decoded: Vec<ModeSlots> = paths.iter().map(index::slots).collect();
    let used: BTreeSet<usize> = decoded
        .iter()
        .flat_map(|s| s.positions())
        .filter(|&i| i < snapshot.modes.len())
        .collect();

    let mut remap: HashMap<usize, usize> = HashMap::with_capacity(used.len());
    let mut modes = Vec::with_capacity(used.len());
    let mut identities = Vec::new();
    for &old in &used {
        remap.insert(old, modes.len());
        modes.push(snapshot.modes[old].clone());
        if !snapshot.identities.is_empty() {
            identities.push(snapshot.identity(old).cloned().unwrap_or_default());
        }
    }

    for (path, slots) in paths.iter_mut().zip(&decoded) {
        let rewritten = slots.remap(|old| remap.get(&old).copied().or(Some(old)));
        index::set_slots(path, &rewritten);
    }

    if dropped_any {
        overlay_live_geometry(&mut modes, live);
    }

    Ok(Snapshot::new(paths, modes, identities))
}


/// Replace source / desktop-image bodies with the live body for the same
/// (kind, id). Target timing is kept from the saved profile.
fn overlay_live_geometry(modes: &mut [Mode], live: &Snapshot) {
    let current: HashMap<(ModeKind, u32), &Mode> =
        live.modes.iter().map(|m| ((m.kind(), m.id), m)).collect();
    for mode in modes.iter_mut() {
        if !matches!(mode.body, ModeBody::Source(_) | ModeBody::DesktopImage(_)) {
            continue;
        }
        if let Some(cur) = current.get(&(mode.kind(), mode.id)) {
            mode.body = cur.body;
        }
    }
}


/// Borrow live desktop-image modes for a profile saved without any.
///
/// For each saved path whose target id has both a saved target mode and a
/// live desktop-image mode, the live mode is appended and the path switches
/// to the packed virtual-mode layout pointing at (saved target, appended
/// desktop image). Returns `None` when nothing was injected.
pub fn inject_desktop_images(saved: &Snapshot, live: &Snapshot) -> Option<Snapshot> {
    if saved.modes.is_empty() || live.modes.is_empty() {
        return None;
    }
    if saved.modes.iter().any(|m| m.kind() == ModeKind::DesktopImage) {
        return None;
    }

    let live_desktop: BTreeMap<u32, &Mode> = live
        .modes
        .iter()
        .filter(|m| m.kind() == ModeKind::DesktopImage)
        .map(|m| (m.id, m))
        .collect();
    if live_desktop.is_empty() {
        return None;
    }
    let saved_target: BTreeMap<u32, usize> = saved
        .modes
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_target())
        .map(|(i, m)| (m.id, i))
        .collect();

    let mut snapshot = saved.clone();
    let mut changed = false;
    for i in 0..snapshot.paths.len() {
        let target_id = snapshot.paths[i].target.id;
        let (Some(desktop), Some(&target_idx)) =
            (live_desktop.get(&target_id), saved_target.get(&target_id))
        else {
            continue;
        };

        let desktop_idx = snapshot.modes.len();
        snapshot.modes.push((*desktop).clone());
        if !snapshot.identities.is_empty() {
            snapshot.identities.resize(desktop_idx, MonitorIdentity::default());
            snapshot.identities.push(MonitorIdentity::default());
        }

        let path = &mut snapshot.paths[i];
        let mut slots = index::slots(path);
        slots.target = Some(target_idx);
        slots.desktop = Some(desktop_idx);
        path.flags |= PATH_SUPPORT_VIRTUAL_MODE;
        index::set_slots(path, &slots);
        changed = true;
    }

    changed.then_some(snapshot)
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::classify::{classify_missing, SOFTWARE_DISPLAY_VIDEO_STANDARD};
    use crate::reconcile::index::{pack_target_indices, unpack_target_indices};
    use crate::reconcile::testing::{desktop, identity, path, source, source_at, target, with_standard};
    use crate::types::topology::{AdapterId, MonitorIdentity};

    fn adapter() -> AdapterId {
        AdapterId::new(0x100, 0)
    }

    /// Targets 10 (physical) and 11 (virtual), interleaved source/target modes.
    fn two_display_profile() -> Snapshot {
        Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1), path(adapter(), 1, 11, 2, 3)],
            vec![
                source_at(adapter(), 0, 0),
                target(adapter(), 10),
                source_at(adapter(), 1, 1920),
                with_standard(target(adapter(), 11), SOFTWARE_DISPLAY_VIDEO_STANDARD),
            ],
            vec![
                MonitorIdentity::default(),
                identity("DELL U2720Q", "", 0, 0),
                MonitorIdentity::default(),
                identity("Virtual Display", "", 0, 0),
            ],
        )
    }

    fn ids(set: &[u32]) -> BTreeSet<u32> {
        set.iter().copied().collect()
    }

    #[test]
    fn dropping_last_path_compacts_tail() {
        let saved = two_display_profile();
        let out = filter_and_remap(&saved, &ids(&[11]), &Snapshot::default()).unwrap();
        assert_eq!(out.paths.len(), 1);
        assert_eq!(out.modes.len(), 2);
        assert_eq!(out.identities.len(), 2);
        assert_eq!(out.paths[0].target.id, 10);
        assert!(index::validate(&out).is_ok());
    }

    #[test]
    fn dropping_first_path_shifts_indices() {
        let saved = two_display_profile();
        let out = filter_and_remap(&saved, &ids(&[10]), &Snapshot::default()).unwrap();
        assert_eq!(out.paths.len(), 1);
        assert_eq!(out.paths[0].source.mode_index, 0);
        assert_eq!(out.paths[0].target.mode_index, 1);
        assert_eq!(out.modes[0].id, 1);
        assert_eq!(out.modes[1].id, 11);
        assert_eq!(out.identities[1].friendly_name, "Virtual Display");
    }

    #[test]
    fn dropping_everything_is_fatal() {
        let saved = two_display_profile();
        let err = filter_and_remap(&saved, &ids(&[10, 11]), &Snapshot::default()).unwrap_err();
        assert!(matches!(err, ReconcileError::NothingToApply));
    }

    #[test]
    fn empty_drop_set_on_compact_input_is_noop() {
        let saved = two_display_profile();
        let once = filter_and_remap(&saved, &BTreeSet::new(), &Snapshot::default()).unwrap();
        let twice = filter_and_remap(&once, &BTreeSet::new(), &Snapshot::default()).unwrap();
        assert_eq!(once, saved);
        assert_eq!(twice, once);
    }

    #[test]
    fn second_pass_over_compacted_output_is_noop() {
        // Stray source mode at position 2 pushes the second path to 3/4.
        let mut saved = two_display_profile();
        saved.modes.insert(2, source(adapter(), 9));
        saved.identities.insert(2, MonitorIdentity::default());
        saved.paths[1].source.mode_index = 3;
        saved.paths[1].target.mode_index = 4;
        assert!(index::validate(&saved).is_ok());

        let once = filter_and_remap(&saved, &BTreeSet::new(), &Snapshot::default()).unwrap();
        assert_eq!(once.modes.len(), 4);
        assert!(once.modes.iter().all(|m| m.id != 9));
        assert_eq!(once.paths[1].source.mode_index, 2);
        assert_eq!(once.paths[1].target.mode_index, 3);
        assert_eq!(once, two_display_profile());

        let twice = filter_and_remap(&once, &BTreeSet::new(), &Snapshot::default()).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn unreferenced_modes_are_removed() {
        let mut saved = two_display_profile();
        saved.modes.push(source(adapter(), 9));
        saved.identities.push(MonitorIdentity::default());
        let out = filter_and_remap(&saved, &BTreeSet::new(), &Snapshot::default()).unwrap();
        assert_eq!(out.modes.len(), 4);
    }

    #[test]
    fn virtual_mode_paths_are_repacked() {
        let mut saved = two_display_profile();
        saved.modes.push(desktop(adapter(), 10, 1920));
        saved.modes.push(desktop(adapter(), 11, 1920));
        saved.identities.push(MonitorIdentity::default());
        saved.identities.push(MonitorIdentity::default());
        for (i, p) in saved.paths.iter_mut().enumerate() {
            p.flags |= PATH_SUPPORT_VIRTUAL_MODE;
            p.source.mode_index = pack_target_indices(2 * i as u16, 0);
            p.target.mode_index = pack_target_indices(2 * i as u16 + 1, 4 + i as u16);
        }
        assert!(index::validate(&saved).is_ok());

        let out = filter_and_remap(&saved, &ids(&[10]), &Snapshot::default()).unwrap();
        assert_eq!(out.modes.len(), 3);
        assert_eq!(unpack_target_indices(out.paths[0].source.mode_index), (0, 0));
        assert_eq!(unpack_target_indices(out.paths[0].target.mode_index), (1, 2));
        assert_eq!(out.modes[2].kind(), ModeKind::DesktopImage);
        assert!(index::validate(&out).is_ok());
    }

    #[test]
    fn live_source_geometry_overlays_after_drop() {
        let saved = two_display_profile();
        let live = Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source_at(adapter(), 0, -1920), target(adapter(), 10)],
            vec![],
        );
        let out = filter_and_remap(&saved, &ids(&[11]), &live).unwrap();
        assert_eq!(out.modes[0].source().unwrap().position.x, -1920);
    }

    #[test]
    fn no_overlay_without_drop() {
        let saved = two_display_profile();
        let live = Snapshot::new(
            vec![],
            vec![source_at(adapter(), 0, -1920)],
            vec![],
        );
        let out = filter_and_remap(&saved, &BTreeSet::new(), &live).unwrap();
        assert_eq!(out.modes[0].source().unwrap().position.x, 0);
    }

    #[test]
    fn virtual_target_gone_leaves_one_path() {
        let saved = two_display_profile();
        let live = Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source(adapter(), 0), target(adapter(), 10)],
            vec![MonitorIdentity::default(), identity("DELL U2720Q", "", 0, 0)],
        );
        let missing = classify_missing(&saved, &live);
        assert_eq!(missing.virtual_ids, ids(&[11]));
        let out = filter_and_remap(&saved, &missing.virtual_ids, &live).unwrap();
        assert_eq!(out.paths.len(), 1);
        assert_eq!(out.modes.len(), 2);
    }

    #[test]
    fn inject_desktop_image_from_live() {
        let saved = Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source(adapter(), 0), target(adapter(), 10)],
            vec![MonitorIdentity::default(), identity("DELL U2720Q", "", 0, 0)],
        );
        let live = Snapshot::new(
            vec![],
            vec![source(adapter(), 0), target(adapter(), 10), desktop(adapter(), 10, 2560)],
            vec![],
        );
        let out = inject_desktop_images(&saved, &live).unwrap();
        assert_eq!(out.modes.len(), 3);
        assert_eq!(out.identities.len(), 3);
        assert!(out.paths[0].supports_virtual_mode());
        assert_eq!(unpack_target_indices(out.paths[0].target.mode_index), (1, 2));
        assert_eq!(unpack_target_indices(out.paths[0].source.mode_index).0, 0);
        assert!(index::validate(&out).is_ok());
    }

    #[test]
    fn no_injection_when_profile_has_desktop_images() {
        let mut saved = two_display_profile();
        saved.modes.push(desktop(adapter(), 10, 1920));
        let live = Snapshot::new(vec![], vec![desktop(adapter(), 10, 2560)], vec![]);
        assert!(inject_desktop_images(&saved, &live).is_none());
    }

    #[test]
    fn no_injection_without_live_desktop_images() {
        let saved = two_display_profile();
        assert!(inject_desktop_images(&saved, &saved).is_none());
    }
}
