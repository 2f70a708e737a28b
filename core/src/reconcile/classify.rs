//! Missing-target classification.
//!
//! A saved target with no counterpart in the live topology is either
//! *virtual* (an indirect or software display whose driver may simply not be
//! running; safe to drop) or *real* (a physical monitor believed to be
//! disconnected; the apply attempt goes ahead anyway).

use std::collections::{BTreeMap, BTreeSet};

use crate::types::topology::{
    ModeBody, Snapshot, OUTPUT_TECHNOLOGY_INDIRECT_VIRTUAL, OUTPUT_TECHNOLOGY_INDIRECT_WIRED,
    PATH_SUPPORT_VIRTUAL_MODE,
};

/// Video signal standard reported for software (USB / indirect) displays.
pub const SOFTWARE_DISPLAY_VIDEO_STANDARD: u32 = 65791;

/// Lower-case substrings that mark a friendly name as a virtual display.
pub const VIRTUAL_NAME_MARKERS: [&str; 2] = ["vdd", "virtual"];


/// Missing targets split by recoverability.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MissingTargets {
    pub virtual_ids: BTreeSet<u32>,
    pub virtual_descriptions: Vec<String>,
    pub real_descriptions: Vec<String>,
}

impl MissingTargets {
    pub fn is_empty(&self) -> bool {
        self.virtual_descriptions.is_empty() && self.real_descriptions.is_empty()
    }
}


#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct TargetSignature {
    id: u32,
    device_path: String,
    friendly: String,
    manufacturer: u16,
    product: u16,
}

impl TargetSignature {
    fn is_blank(&self) -> bool {
        self.id == 0 && self.device_path.is_empty() && self.friendly.is_empty()
    }

    fn description(&self) -> Option<&str> {
        if !self.friendly.is_empty() {
            Some(&self.friendly)
        } else if !self.device_path.is_empty() {
            Some(&self.device_path)
        } else {
            None
        }
    }

    /// Present if any live target matches by id, device path, or friendly
    /// name (the name match also requires equal EDID ids when we have them).
    fn present_in(&self, live: &[TargetSignature]) -> bool {
        if self.is_blank() {
            return false;
        }
        live.iter().any(|cur| {
            if self.id != 0 && cur.id == self.id {
                return true;
            }
            if !self.device_path.is_empty() && cur.device_path == self.device_path {
                return true;
            }
            if !self.friendly.is_empty() && cur.friendly == self.friendly {
                if self.manufacturer != 0 || self.product != 0 {
                    return cur.manufacturer == self.manufacturer && cur.product == self.product;
                }
                return true;
            }
            false
        })
    }
}

#[derive(Debug, Clone, Default)]
struct SavedTarget {
    signature: TargetSignature,
    output_technology: u32,
    video_standard: u32,
}

impl SavedTarget {
    fn is_virtual(&self) -> bool {
        self.video_standard == SOFTWARE_DISPLAY_VIDEO_STANDARD
            || self.output_technology == OUTPUT_TECHNOLOGY_INDIRECT_VIRTUAL
            || self.output_technology == OUTPUT_TECHNOLOGY_INDIRECT_WIRED
            || has_virtual_marker(&self.signature.friendly)
    }
}


/// Classify every saved path whose target is absent from `live`.
///
/// Paths are visited in order, so descriptions come out in path order and
/// the result is identical across runs for identical inputs.
pub fn classify_missing(saved: &Snapshot, live: &Snapshot) -> MissingTargets {
    let live_targets = target_signatures(live);
    let saved_targets = saved_target_info(saved);

    let mut result = MissingTargets::default();
    for path in &saved.paths {
        let id = path.target.id;
        let signature = saved_targets
            .get(&id)
            .map(|t| t.signature.clone())
            .unwrap_or_default();
        if signature.present_in(&live_targets) {
            continue;
        }
        let description = signature
            .description()
            .map(str::to_string)
            .unwrap_or_else(|| format!("id {}", id));
        let is_virtual = saved_targets
            .get(&id)
            .map(SavedTarget::is_virtual)
            .unwrap_or(false)
            || is_virtual_technology(path.target.output_technology);
        if is_virtual {
            result.virtual_descriptions.push(description);
            result.virtual_ids.insert(id);
        } else {
            result.real_descriptions.push(description);
        }
    }
    result
}


/// Whether a saved profile involves virtual displays, which selects the
/// virtual-mode-aware query/apply flags and enables the merge fallback.
pub fn is_virtual_aware(snapshot: &Snapshot) -> bool {
    let virtual_mode = snapshot.modes.iter().any(|m| match &m.body {
        ModeBody::DesktopImage(_) => true,
        ModeBody::Target(t) => t.signal.video_standard == SOFTWARE_DISPLAY_VIDEO_STANDARD,
        ModeBody::Source(_) => false,
    });
    virtual_mode
        || snapshot
            .paths
            .iter()
            .any(|p| p.flags & PATH_SUPPORT_VIRTUAL_MODE != 0)
        || snapshot
            .identities
            .iter()
            .any(|i| has_virtual_marker(&i.friendly_name.to_lowercase()))
}


// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn has_virtual_marker(lowercase_name: &str) -> bool {
    VIRTUAL_NAME_MARKERS
        .iter()
        .any(|marker| lowercase_name.contains(marker))
}

fn is_virtual_technology(technology: u32) -> bool {
    technology == OUTPUT_TECHNOLOGY_INDIRECT_VIRTUAL || technology == OUTPUT_TECHNOLOGY_INDIRECT_WIRED
}

fn target_signatures(snapshot: &Snapshot) -> Vec<TargetSignature> {
    snapshot
        .targets()
        .map(|(mode, identity)| {
            let identity = identity.cloned().unwrap_or_default();
            TargetSignature {
                id: mode.id,
                device_path: identity.device_path.to_lowercase(),
                friendly: identity.friendly_name.to_lowercase(),
                manufacturer: identity.manufacturer_id,
                product: identity.product_id,
            }
        })
        .collect()
}

/// Saved targets keyed by id. Later target modes with the same id win, and
/// output technology comes from the last path that references the id.
fn saved_target_info(saved: &Snapshot) -> BTreeMap<u32, SavedTarget> {
    let mut info: BTreeMap<u32, SavedTarget> = BTreeMap::new();
    for (signature, mode) in target_signatures(saved)
        .into_iter()
        .zip(saved.modes.iter().filter(|m| m.is_target()))
    {
        let video_standard = mode.target().map(|t| t.signal.video_standard).unwrap_or(0);
        info.insert(
            signature.id,
            SavedTarget {
                signature,
                output_technology: 0,
                video_standard,
            },
        );
    }
    for path in &saved.paths {
        if let Some(entry) = info.get_mut(&path.target.id) {
            entry.output_technology = path.target.output_technology;
        }
    }
    info
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::testing::{identity, path, source, target, with_standard};
    use crate::types::topology::{AdapterId, MonitorIdentity};

    fn adapter() -> AdapterId {
        AdapterId::new(0x100, 0)
    }

    /// Two-display profile: target 10 physical, target 11 on the software sentinel.
    fn saved_profile() -> Snapshot {
        Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1), path(adapter(), 1, 11, 2, 3)],
            vec![
                source(adapter(), 0),
                target(adapter(), 10),
                source(adapter(), 1),
                with_standard(target(adapter(), 11), SOFTWARE_DISPLAY_VIDEO_STANDARD),
            ],
            vec![
                MonitorIdentity::default(),
                identity("DELL U2720Q", r"\\?\DISPLAY#DEL1#10", 0x10AC, 0xA0F1),
                MonitorIdentity::default(),
                identity("Parsec Display", r"\\?\DISPLAY#PSC#11", 0, 0),
            ],
        )
    }

    fn live_with_first_only() -> Snapshot {
        Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source(adapter(), 0), target(adapter(), 10)],
            vec![
                MonitorIdentity::default(),
                identity("DELL U2720Q", r"\\?\DISPLAY#DEL1#10", 0x10AC, 0xA0F1),
            ],
        )
    }

    #[test]
    fn same_topology_has_nothing_missing() {
        let saved = saved_profile();
        let missing = classify_missing(&saved, &saved);
        assert!(missing.is_empty());
        assert!(missing.virtual_ids.is_empty());
    }

    #[test]
    fn absent_sentinel_target_is_virtual() {
        let missing = classify_missing(&saved_profile(), &live_with_first_only());
        assert_eq!(missing.virtual_ids.iter().copied().collect::<Vec<_>>(), vec![11]);
        assert_eq!(missing.virtual_descriptions, vec!["parsec display"]);
        assert!(missing.real_descriptions.is_empty());
    }

    #[test]
    fn absent_physical_target_is_real() {
        let live = Snapshot::new(
            vec![path(adapter(), 1, 11, 0, 1)],
            vec![
                source(adapter(), 1),
                with_standard(target(adapter(), 11), SOFTWARE_DISPLAY_VIDEO_STANDARD),
            ],
            vec![MonitorIdentity::default(), MonitorIdentity::default()],
        );
        let missing = classify_missing(&saved_profile(), &live);
        assert!(missing.virtual_ids.is_empty());
        assert_eq!(missing.real_descriptions, vec!["dell u2720q"]);
    }

    #[test]
    fn device_path_match_counts_as_present() {
        // Same monitor, new target id after a driver reload.
        let live = Snapshot::new(
            vec![],
            vec![target(adapter(), 99)],
            vec![identity("", r"\\?\DISPLAY#DEL1#10", 0, 0)],
        );
        let saved = Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source(adapter(), 0), target(adapter(), 10)],
            vec![
                MonitorIdentity::default(),
                identity("DELL U2720Q", r"\\?\DISPLAY#DEL1#10", 0x10AC, 0xA0F1),
            ],
        );
        assert!(classify_missing(&saved, &live).is_empty());
    }

    #[test]
    fn friendly_name_match_requires_edid_ids() {
        let saved = Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source(adapter(), 0), target(adapter(), 10)],
            vec![MonitorIdentity::default(), identity("LG HDR 4K", "", 0x1E6D, 0x7707)],
        );
        let wrong_edid = Snapshot::new(
            vec![],
            vec![target(adapter(), 20)],
            vec![identity("LG HDR 4K", "", 0x1E6D, 0x0001)],
        );
        let right_edid = Snapshot::new(
            vec![],
            vec![target(adapter(), 20)],
            vec![identity("lg hdr 4k", "", 0x1E6D, 0x7707)],
        );
        assert_eq!(classify_missing(&saved, &wrong_edid).real_descriptions.len(), 1);
        assert!(classify_missing(&saved, &right_edid).is_empty());
    }

    #[test]
    fn friendly_name_without_edid_ids_matches_on_name() {
        let saved = Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source(adapter(), 0), target(adapter(), 10)],
            vec![MonitorIdentity::default(), identity("Projector", "", 0, 0)],
        );
        let live = Snapshot::new(
            vec![],
            vec![target(adapter(), 30)],
            vec![identity("PROJECTOR", "", 0x1234, 0x1)],
        );
        assert!(classify_missing(&saved, &live).is_empty());
    }

    #[test]
    fn path_without_target_mode_is_missing_by_id() {
        let saved = Snapshot::new(vec![path(adapter(), 0, 42, 0, 1)], vec![], vec![]);
        let missing = classify_missing(&saved, &live_with_first_only());
        assert_eq!(missing.real_descriptions, vec!["id 42"]);
    }

    #[test]
    fn indirect_output_technology_is_virtual() {
        let mut saved = saved_profile();
        saved.paths[0].target.output_technology = OUTPUT_TECHNOLOGY_INDIRECT_WIRED;
        let live = Snapshot::default();
        let missing = classify_missing(&saved, &live);
        assert_eq!(missing.virtual_ids.iter().copied().collect::<Vec<_>>(), vec![10, 11]);
        assert!(missing.real_descriptions.is_empty());
    }

    #[test]
    fn virtual_name_marker_is_virtual() {
        let saved = Snapshot::new(
            vec![path(adapter(), 0, 10, 0, 1)],
            vec![source(adapter(), 0), target(adapter(), 10)],
            vec![MonitorIdentity::default(), identity("IddSampleDriver VDD", "", 0, 0)],
        );
        let missing = classify_missing(&saved, &Snapshot::default());
        assert_eq!(missing.virtual_descriptions, vec!["iddsampledriver vdd"]);
    }

    #[test]
    fn classification_is_stable_across_runs() {
        let saved = saved_profile();
        let live = Snapshot::default();
        let first = classify_missing(&saved, &live);
        for _ in 0..10 {
            assert_eq!(classify_missing(&saved, &live), first);
        }
        assert_eq!(first.real_descriptions, vec!["dell u2720q"]);
        assert_eq!(first.virtual_descriptions, vec!["parsec display"]);
    }

    #[test]
    fn virtual_awareness_signals() {
        assert!(is_virtual_aware(&saved_profile()));
        assert!(!is_virtual_aware(&live_with_first_only()));

        let mut flagged = live_with_first_only();
        flagged.paths[0].flags |= PATH_SUPPORT_VIRTUAL_MODE;
        assert!(is_virtual_aware(&flagged));

        let mut named = live_with_first_only();
        named.identities[1].friendly_name = "Virtual Monitor".into();
        assert!(is_virtual_aware(&named));
    }
}
