//! Mode-index codec.
//!
//! A plain path stores one mode position per `mode_index` field. A path
//! flagged `PATH_SUPPORT_VIRTUAL_MODE` packs two 16-bit halves into each
//! field instead:
//!
//! - target field: high half = target mode, low half = desktop-image mode
//! - source field: high half = source mode, low half = clone group
//!
//! `0xFFFF` in a half (or `u32::MAX` for a plain field) means "no index".
//! Everything that reads or rewrites a path's mode positions goes through
//! `slots` / `set_slots`.

use crate::error::ReconcileError;
use crate::types::topology::{Mode, ModeKind, MonitorIdentity, Path, Snapshot};

/// Sentinel for "no index" in one packed half.
pub const NO_INDEX: u16 = 0xFFFF;

/// Sentinel for "no index" in a plain mode-index field.
const PLAIN_NO_INDEX: u32 = u32::MAX;


/// Pack a target/desktop-image index pair into one field.
pub fn pack_target_indices(target: u16, desktop: u16) -> u32 {
    (u32::from(target) << 16) | u32::from(desktop)
}

/// Split a packed field into its (target, desktop-image) halves.
pub fn unpack_target_indices(packed: u32) -> (u16, u16) {
    ((packed >> 16) as u16, (packed & 0xFFFF) as u16)
}


/// Decoded mode positions of one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ModeSlots {
    pub source: Option<usize>,
    pub target: Option<usize>,
    pub desktop: Option<usize>,
    clone_group: u16,
}

impl ModeSlots {
    /// Every referenced position, in source/target/desktop order.
    pub fn positions(&self) -> impl Iterator<Item = usize> {
        [self.source, self.target, self.desktop].into_iter().flatten()
    }

    /// Apply `f` to each referenced position. `None` results clear the slot.
    pub fn remap(&self, mut f: impl FnMut(usize) -> Option<usize>) -> ModeSlots {
        ModeSlots {
            source: self.source.and_then(&mut f),
            target: self.target.and_then(&mut f),
            desktop: self.desktop.and_then(&mut f),
            clone_group: self.clone_group,
        }
    }
}


pub(crate) fn slots(path: &Path) -> ModeSlots {
    if path.supports_virtual_mode() {
        let (source, clone_group) = unpack_target_indices(path.source.mode_index);
        let (target, desktop) = unpack_target_indices(path.target.mode_index);
        ModeSlots {
            source: half_to_slot(source),
            target: half_to_slot(target),
            desktop: half_to_slot(desktop),
            clone_group,
        }
    } else {
        ModeSlots {
            source: plain_to_slot(path.source.mode_index),
            target: plain_to_slot(path.target.mode_index),
            desktop: None,
            clone_group: 0,
        }
    }
}

/// Encode `slots` into `path` using the layout its flags call for.
pub(crate) fn set_slots(path: &mut Path, slots: &ModeSlots) {
    if path.supports_virtual_mode() {
        path.source.mode_index =
            pack_target_indices(slot_to_half(slots.source), slots.clone_group);
        path.target.mode_index =
            pack_target_indices(slot_to_half(slots.target), slot_to_half(slots.desktop));
    } else {
        path.source.mode_index = slot_to_plain(slots.source);
        path.target.mode_index = slot_to_plain(slots.target);
    }
}


/// Check that every mode reference resolves to a mode of the right kind.
pub fn validate(snapshot: &Snapshot) -> Result<(), ReconcileError> {
    for (i, path) in snapshot.paths.iter().enumerate() {
        let s = slots(path);
        let checks = [
            ("source", s.source, ModeKind::Source),
            ("target", s.target, ModeKind::Target),
            ("desktop image", s.desktop, ModeKind::DesktopImage),
        ];
        for (slot, position, expected) in checks {
            let Some(index) = position else { continue };
            match snapshot.modes.get(index) {
                Some(mode) if mode.kind() == expected => {}
                _ => {
                    return Err(ReconcileError::InvalidModeReference {
                        path: i,
                        slot,
                        index,
                        expected,
                    })
                }
            }
        }
    }
    Ok(())
}


/// Source mode referenced by `path`, if it resolves to one.
pub fn source_mode<'a>(snapshot: &'a Snapshot, path: &Path) -> Option<&'a Mode> {
    slots(path)
        .source
        .and_then(|i| snapshot.modes.get(i))
        .filter(|m| m.kind() == ModeKind::Source)
}

/// Target mode referenced by `path` together with its identity slot.
pub fn target_mode<'a>(
    snapshot: &'a Snapshot,
    path: &Path,
) -> Option<(&'a Mode, Option<&'a MonitorIdentity>)> {
    let index = slots(path).target?;
    let mode = snapshot.modes.get(index).filter(|m| m.is_target())?;
    Some((mode, snapshot.identity(index)))
}


// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn half_to_slot(half: u16) -> Option<usize> {
    (half != NO_INDEX).then_some(usize::from(half))
}

fn slot_to_half(slot: Option<usize>) -> u16 {
    slot.and_then(|i| u16::try_from(i).ok())
        .filter(|h| *h != NO_INDEX)
        .unwrap_or(NO_INDEX)
}

fn plain_to_slot(raw: u32) -> Option<usize> {
    (raw != PLAIN_NO_INDEX).then_some(raw as usize)
}

fn slot_to_plain(slot: Option<usize>) -> u32 {
    slot.and_then(|i| u32::try_from(i).ok())
        .unwrap_or(PLAIN_NO_INDEX)
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
