//! Display backends: the query/apply primitives the reconciler drives.
//!
//! `DisplayBackend` is the seam between the portable reconciliation logic and
//! the platform. `MemoryBackend` holds a topology in memory (tests, dry runs);
//! `WindowsBackend` talks to the CCD API and only exists on Windows.

use std::ops::BitOr;

use crate::error::BackendError;
use crate::types::topology::{Mode, Path, Snapshot};

pub mod memory;
#[cfg(windows)]
pub mod ccd;

pub use memory::MemoryBackend;


/// Which paths a query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryFilter {
    pub active_only: bool,
    pub virtual_mode_aware: bool,
}

impl QueryFilter {
    pub const ALL_PATHS: u32 = 0x0000_0001;
    pub const ONLY_ACTIVE_PATHS: u32 = 0x0000_0002;
    pub const VIRTUAL_MODE_AWARE: u32 = 0x0000_0010;

    pub fn active(virtual_mode_aware: bool) -> Self {
        QueryFilter {
            active_only: true,
            virtual_mode_aware,
        }
    }

    pub fn all(virtual_mode_aware: bool) -> Self {
        QueryFilter {
            active_only: false,
            virtual_mode_aware,
        }
    }

    /// Native flag word for this filter.
    pub fn bits(self) -> u32 {
        let base = if self.active_only {
            Self::ONLY_ACTIVE_PATHS
        } else {
            Self::ALL_PATHS
        };
        if self.virtual_mode_aware {
            base | Self::VIRTUAL_MODE_AWARE
        } else {
            base
        }
    }
}


/// Flag word passed to the apply primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyFlags(u32);

impl ApplyFlags {
    pub const USE_SUPPLIED_DISPLAY_CONFIG: ApplyFlags = ApplyFlags(0x0000_0020);
    pub const VALIDATE: ApplyFlags = ApplyFlags(0x0000_0040);
    pub const APPLY: ApplyFlags = ApplyFlags(0x0000_0080);
    pub const NO_OPTIMIZATION: ApplyFlags = ApplyFlags(0x0000_0100);
    pub const SAVE_TO_DATABASE: ApplyFlags = ApplyFlags(0x0000_0200);
    pub const ALLOW_CHANGES: ApplyFlags = ApplyFlags(0x0000_0400);
    pub const VIRTUAL_MODE_AWARE: ApplyFlags = ApplyFlags(0x0000_8000);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: ApplyFlags) -> ApplyFlags {
        ApplyFlags(self.0 | other.0)
    }

    pub const fn contains(self, other: ApplyFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ApplyFlags {
    type Output = ApplyFlags;

    fn bitor(self, rhs: ApplyFlags) -> ApplyFlags {
        self.union(rhs)
    }
}


/// Platform primitives. Calls block until the platform answers.
pub trait DisplayBackend {
    /// Enumerate the live topology, including identity for each target mode.
    fn query(&mut self, filter: QueryFilter) -> Result<Snapshot, BackendError>;

    /// Commit a topology. Atomic from the caller's point of view.
    fn apply(&mut self, paths: &[Path], modes: &[Mode], flags: ApplyFlags) -> Result<(), BackendError>;
}


/// The backend for the current platform.
#[cfg(windows)]
pub fn native_backend() -> Result<Box<dyn DisplayBackend>, BackendError> {
    Ok(Box::new(ccd::WindowsBackend::new()))
}

/// The backend for the current platform.
#[cfg(not(windows))]
pub fn native_backend() -> Result<Box<dyn DisplayBackend>, BackendError> {
    Err(BackendError::Unsupported)
}
