//! Merge fallback: live topology structure with saved display characteristics.
//!
//! Last resort for virtual-aware profiles. Every identifier comes from the
//! live topology, so the result always addresses hardware that exists; mode
//! bodies and per-path display attributes are carried over from the saved
//! profile wherever the keys line up.

use std::collections::HashMap;

use crate::types::topology::{Mode, ModeKind, Path, Snapshot};


/// Build the merged snapshot. `None` when the live topology has no paths or
/// no modes to root the merge in.
pub fn merge_with_live(saved: &Snapshot, live: &Snapshot) -> Option<Snapshot> {
    if live.paths.is_empty() || live.modes.is_empty() {
        return None;
    }
    let mut merged = live.clone();

    let saved_modes: HashMap<(ModeKind, u32), &Mode> =
        saved.modes.iter().map(|m| ((m.kind(), m.id), m)).collect();
    for mode in &mut merged.modes {
        if let Some(saved) = saved_modes.get(&(mode.kind(), mode.id)) {
            mode.body = saved.body;
        }
    }

    let saved_paths: HashMap<(u32, u32), &Path> = saved
        .paths
        .iter()
        .map(|p| ((p.source.id, p.target.id), p))
        .collect();
    for path in &mut merged.paths {
        if let Some(saved) = saved_paths.get(&(path.source.id, path.target.id)) {
            path.target.output_technology = saved.target.output_technology;
            path.target.rotation = saved.target.rotation;
            path.target.scaling = saved.target.scaling;
            path.target.refresh_rate = saved.target.refresh_rate;
            path.target.scan_line_ordering = saved.target.scan_line_ordering;
        }
    }

    Some(merged)
}
