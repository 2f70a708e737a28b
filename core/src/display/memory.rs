//! In-memory display backend.
//!
//! Holds one topology and answers queries from it. Applies are recorded and
//! checked the way the platform would check them: every path must name a
//! source and a target that exist on the live adapters, and every mode
//! reference must resolve. Outcomes can also be scripted up front.

use std::collections::VecDeque;

use tracing::debug;

use crate::display::{ApplyFlags, DisplayBackend, QueryFilter};
use crate::error::BackendError;
use crate::reconcile::index;
use crate::types::topology::{Mode, MonitorIdentity, Path, Snapshot};

/// Status returned for rejected parameters (`ERROR_INVALID_PARAMETER`).
pub const ERROR_INVALID_PARAMETER: i64 = 87;


/// One recorded apply call.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTopology {
    pub paths: Vec<Path>,
    pub modes: Vec<Mode>,
    pub flags: ApplyFlags,
}


#[derive(Debug, Clone)]
pub struct MemoryBackend {
    topology: Snapshot,
    virtual_mode_supported: bool,
    commit: bool,
    scripted: VecDeque<Result<(), BackendError>>,
    applied: Vec<AppliedTopology>,
}

impl MemoryBackend {
    pub fn new(topology: Snapshot) -> Self {
        MemoryBackend {
            topology,
            virtual_mode_supported: true,
            commit: true,
            scripted: VecDeque::new(),
            applied: Vec::new(),
        }
    }

    /// Reject virtual-mode-aware queries, like drivers that predate them.
    pub fn without_virtual_mode(mut self) -> Self {
        self.virtual_mode_supported = false;
        self
    }

    /// Validate applies but never change the held topology.
    pub fn dry_run(mut self) -> Self {
        self.commit = false;
        self
    }

    /// Queue the outcome of the next apply call, bypassing validation.
    pub fn script_apply(&mut self, outcome: Result<(), BackendError>) {
        self.scripted.push_back(outcome);
    }

    pub fn applied(&self) -> &[AppliedTopology] {
        &self.applied
    }

    pub fn topology(&self) -> &Snapshot {
        &self.topology
    }

    fn check(&self, paths: &[Path], modes: &[Mode]) -> Result<(), BackendError> {
        let rejected = || BackendError::call("SetDisplayConfig", ERROR_INVALID_PARAMETER);
        for path in paths {
            let source_known = self.topology.paths.iter().any(|p| {
                p.source.adapter == path.source.adapter && p.source.id == path.source.id
            });
            let target_known = self.topology.paths.iter().any(|p| {
                p.target.adapter == path.target.adapter && p.target.id == path.target.id
            });
            if !source_known || !target_known {
                debug!(
                    source = path.source.id,
                    target = path.target.id,
                    adapter = %path.target.adapter,
                    "rejecting path with unknown source or target"
                );
                return Err(rejected());
            }
        }
        let candidate = Snapshot::new(paths.to_vec(), modes.to_vec(), Vec::new());
        index::validate(&candidate).map_err(|_| rejected())
    }

    fn commit(&mut self, paths: &[Path], modes: &[Mode]) {
        let identities = modes
            .iter()
            .map(|m| {
                self.topology
                    .modes
                    .iter()
                    .position(|cur| cur.adapter == m.adapter && cur.id == m.id && cur.kind() == m.kind())
                    .and_then(|i| self.topology.identity(i).cloned())
                    .unwrap_or_else(MonitorIdentity::default)
            })
            .collect();
        self.topology = Snapshot::new(paths.to_vec(), modes.to_vec(), identities);
    }
}

impl DisplayBackend for MemoryBackend {
    fn query(&mut self, filter: QueryFilter) -> Result<Snapshot, BackendError> {
        if filter.virtual_mode_aware && !self.virtual_mode_supported {
            return Err(BackendError::call("QueryDisplayConfig", ERROR_INVALID_PARAMETER));
        }
        let mut snapshot = self.topology.clone();
        snapshot
            .paths
            .retain(|p| p.target.available && (!filter.active_only || p.is_active()));
        Ok(snapshot)
    }

    fn apply(&mut self, paths: &[Path], modes: &[Mode], flags: ApplyFlags) -> Result<(), BackendError> {
        self.applied.push(AppliedTopology {
            paths: paths.to_vec(),
            modes: modes.to_vec(),
            flags,
        });
        if let Some(outcome) = self.scripted.pop_front() {
            return outcome;
        }
        self.check(paths, modes)?;
        if self.commit {
            self.commit(paths, modes);
        }
        Ok(())
    }
}
