//! Profile load orchestration.
//!
//! Applying a saved profile escalates through three stages, strictly forward
//! and short-circuiting on the first successful apply:
//!
//! 1. `Direct`: adapter-id correction, optional desktop-image injection.
//! 2. `AlternateIdentity`: friendly-name correlation from the untouched
//!    saved snapshot. Needs identity data on both sides.
//! 3. `VirtualMerge`: live-rooted merge. Virtual-aware profiles only, and
//!    only once the alternate stage has been tried.
//!
//! Every stage classifies missing targets against the live topology and
//! drops the virtual ones before calling the backend. Each stage works on its
//! own copy; the loaded snapshot is never modified.

use std::fmt;

use tracing::{debug, info, warn};

use crate::display::{ApplyFlags, DisplayBackend, QueryFilter};
use crate::error::{BackendError, ReconcileError};
use crate::reconcile::capture::query_with_fallback;
use crate::reconcile::classify::{self, MissingTargets};
use crate::reconcile::{identity, index, merge, remap};
use crate::types::topology::Snapshot;

/// Flags for every profile apply; `VIRTUAL_MODE_AWARE` is added per profile.
pub const PROFILE_APPLY_FLAGS: ApplyFlags = ApplyFlags::APPLY
    .union(ApplyFlags::USE_SUPPLIED_DISPLAY_CONFIG)
    .union(ApplyFlags::SAVE_TO_DATABASE)
    .union(ApplyFlags::NO_OPTIMIZATION)
    .union(ApplyFlags::ALLOW_CHANGES);


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Correct drifted adapter ids before the direct apply.
    pub match_adapter_ids: bool,
    /// Borrow live desktop-image modes when the profile has none.
    pub inject_desktop_images: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            match_adapter_ids: true,
            inject_desktop_images: false,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Direct,
    AlternateIdentity,
    VirtualMerge,
}

impl Stage {
    pub const ESCALATION: [Stage; 3] = [Stage::Direct, Stage::AlternateIdentity, Stage::VirtualMerge];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Direct => "direct",
            Stage::AlternateIdentity => "alternate identity",
            Stage::VirtualMerge => "virtual merge",
        })
    }
}


/// What a successful load applied, and how it got there.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub stage: Stage,
    pub flags: ApplyFlags,
    pub missing: MissingTargets,
    pub applied: Snapshot,
}


struct Escalation<'a> {
    saved: &'a Snapshot,
    live: &'a Snapshot,
    options: ApplyOptions,
    virtual_aware: bool,
    alternate_tried: bool,
}

impl Escalation<'_> {
    fn is_eligible(&self, stage: Stage) -> bool {
        match stage {
            Stage::Direct => true,
            Stage::AlternateIdentity => {
                !self.saved.identities.is_empty() && !self.live.identities.is_empty()
            }
            Stage::VirtualMerge => self.virtual_aware && self.alternate_tried,
        }
    }

    /// Stage-specific candidate, before missing-target filtering.
    fn prepare(&self, stage: Stage) -> Option<Snapshot> {
        match stage {
            Stage::Direct => {
                let mut candidate = if self.options.match_adapter_ids {
                    let corrected = identity::match_adapter_ids(self.saved, self.live);
                    debug!(
                        paths = corrected.paths_corrected,
                        modes = corrected.modes_corrected,
                        "matched adapter ids"
                    );
                    corrected.snapshot
                } else {
                    self.saved.clone()
                };
                if self.options.inject_desktop_images {
                    if let Some(injected) = remap::inject_desktop_images(&candidate, self.live) {
                        debug!("injected missing desktop image info from current configuration");
                        candidate = injected;
                    }
                }
                Some(candidate)
            }
            Stage::AlternateIdentity => Some(identity::match_by_friendly_name(self.saved, self.live)),
            Stage::VirtualMerge => merge::merge_with_live(self.saved, self.live),
        }
    }
}


/// Apply `saved` through `backend`, escalating until a stage succeeds.
pub fn apply_profile(
    backend: &mut dyn DisplayBackend,
    saved: &Snapshot,
    options: ApplyOptions,
) -> Result<ApplyOutcome, ReconcileError> {
    index::validate(saved)?;

    let virtual_aware = classify::is_virtual_aware(saved);
    let flags = if virtual_aware {
        PROFILE_APPLY_FLAGS | ApplyFlags::VIRTUAL_MODE_AWARE
    } else {
        PROFILE_APPLY_FLAGS
    };
    let live = query_with_fallback(backend, QueryFilter::all(virtual_aware)).map_err(ReconcileError::Query)?;

    let mut escalation = Escalation {
        saved,
        live: &live,
        options,
        virtual_aware,
        alternate_tried: false,
    };
    let mut direct_error: Option<BackendError> = None;
    let mut alternate_error: Option<BackendError> = None;

    for stage in Stage::ESCALATION {
        if !escalation.is_eligible(stage) {
            debug!(%stage, "stage skipped");
            continue;
        }
        let Some(candidate) = escalation.prepare(stage) else {
            debug!(%stage, "stage has nothing to try");
            continue;
        };
        debug!(%stage, paths = candidate.paths.len(), modes = candidate.modes.len(), "trying stage");

        let (applicable, missing) = drop_missing_virtual(candidate, &live)?;
        match backend.apply(&applicable.paths, &applicable.modes, flags) {
            Ok(()) => {
                info!(%stage, paths = applicable.paths.len(), "profile applied");
                return Ok(ApplyOutcome {
                    stage,
                    flags,
                    missing,
                    applied: applicable,
                });
            }
            Err(err) => {
                debug!(%stage, error = %err, "apply failed");
                match stage {
                    Stage::Direct => direct_error = Some(err),
                    Stage::AlternateIdentity => {
                        escalation.alternate_tried = true;
                        alternate_error = Some(err);
                    }
                    Stage::VirtualMerge => debug!(error = %err, "merge fallback failed"),
                }
            }
        }
    }

    match (alternate_error, direct_error) {
        (Some(err), _) => Err(ReconcileError::AlternativeApplyFailed(err)),
        (None, Some(err)) => Err(ReconcileError::ApplyFailed(err)),
        (None, None) => Err(ReconcileError::NothingToApply),
    }
}


/// Classify `candidate` against `live`, warn about every missing target and
/// drop the virtual ones.
fn drop_missing_virtual(
    candidate: Snapshot,
    live: &Snapshot,
) -> Result<(Snapshot, MissingTargets), ReconcileError> {
    let missing = classify::classify_missing(&candidate, live);
    for description in &missing.virtual_descriptions {
        warn!("missing virtual target ignored: {}", description);
    }
    for description in &missing.real_descriptions {
        warn!("missing target; attempting to apply full profile: {}", description);
    }
    let applicable = if missing.virtual_ids.is_empty() {
        candidate
    } else {
        remap::filter_and_remap(&candidate, &missing.virtual_ids, live)?
    };
    Ok((applicable, missing))
}
