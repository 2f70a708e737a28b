//! Display topology model: paths, modes, and monitor identity.
//!
//! A `Snapshot` is the in-memory form of one captured topology. Paths point at
//! modes by position in `modes`, and `identities` runs parallel to `modes`
//! (populated only for target modes). The packed index encoding used by
//! virtual-mode paths is decoded in `crate::reconcile::index`; nothing else
//! should interpret `mode_index` directly.

use std::fmt;

/// Path flag: the path is active.
pub const PATH_ACTIVE: u32 = 0x0000_0001;
/// Path flag: the path's mode indices use the packed virtual-mode layout.
pub const PATH_SUPPORT_VIRTUAL_MODE: u32 = 0x0000_0008;

/// Output technology reported by indirect display drivers over a wired link.
pub const OUTPUT_TECHNOLOGY_INDIRECT_WIRED: u32 = 16;
/// Output technology reported by purely virtual indirect display drivers.
pub const OUTPUT_TECHNOLOGY_INDIRECT_VIRTUAL: u32 = 17;


/// Graphics adapter identifier. Not stable across reboots or driver reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AdapterId {
    pub low: u32,
    pub high: u32,
}

impl AdapterId {
    pub fn new(low: u32, high: u32) -> Self {
        AdapterId { low, high }
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}:{:08X}", self.high, self.low)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Rational { numerator, denominator }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub cx: u32,
    pub cy: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}


// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSource {
    pub adapter: AdapterId,
    pub id: u32,
    pub mode_index: u32,
    pub status_flags: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathTarget {
    pub adapter: AdapterId,
    pub id: u32,
    pub mode_index: u32,
    pub output_technology: u32,
    pub rotation: u32,
    pub scaling: u32,
    pub refresh_rate: Rational,
    pub scan_line_ordering: u32,
    pub available: bool,
    pub status_flags: u32,
}

/// One source-to-target connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    pub source: PathSource,
    pub target: PathTarget,
    pub flags: u32,
}

impl Path {
    pub fn is_active(&self) -> bool {
        self.flags & PATH_ACTIVE != 0
    }

    pub fn supports_virtual_mode(&self) -> bool {
        self.flags & PATH_SUPPORT_VIRTUAL_MODE != 0
    }
}


// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// Discriminant of a `Mode`. The numeric values match the on-disk `infoType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModeKind {
    Source = 1,
    Target = 2,
    DesktopImage = 3,
}

impl ModeKind {
    pub fn from_raw(raw: u32) -> Option<ModeKind> {
        match raw {
            1 => Some(ModeKind::Source),
            2 => Some(ModeKind::Target),
            3 => Some(ModeKind::DesktopImage),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeKind::Source => "source",
            ModeKind::Target => "target",
            ModeKind::DesktopImage => "desktop image",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoSignalInfo {
    pub pixel_rate: u64,
    pub h_sync_freq: Rational,
    pub v_sync_freq: Rational,
    pub active_size: Region,
    pub total_size: Region,
    pub video_standard: u32,
    pub scan_line_ordering: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetMode {
    pub signal: VideoSignalInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceMode {
    pub width: u32,
    pub height: u32,
    pub pixel_format: u32,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DesktopImageInfo {
    pub path_source_size: Point,
    pub desktop_image_region: Rect,
    pub desktop_image_clip: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeBody {
    Source(SourceMode),
    Target(TargetMode),
    DesktopImage(DesktopImageInfo),
}

/// One entry of the positional mode array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    pub adapter: AdapterId,
    pub id: u32,
    pub body: ModeBody,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self.body {
            ModeBody::Source(_) => ModeKind::Source,
            ModeBody::Target(_) => ModeKind::Target,
            ModeBody::DesktopImage(_) => ModeKind::DesktopImage,
        }
    }

    pub fn is_target(&self) -> bool {
        self.kind() == ModeKind::Target
    }

    pub fn target(&self) -> Option<&TargetMode> {
        match &self.body {
            ModeBody::Target(t) => Some(t),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<&SourceMode> {
        match &self.body {
            ModeBody::Source(s) => Some(s),
            _ => None,
        }
    }
}


/// EDID and device naming for one target mode slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitorIdentity {
    pub manufacturer_id: u16,
    pub product_id: u16,
    pub valid: bool,
    pub device_path: String,
    pub friendly_name: String,
}


/// A captured display topology.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub paths: Vec<Path>,
    pub modes: Vec<Mode>,
    pub identities: Vec<MonitorIdentity>,
}

impl Snapshot {
    pub fn new(paths: Vec<Path>, modes: Vec<Mode>, identities: Vec<MonitorIdentity>) -> Self {
        Snapshot { paths, modes, identities }
    }

    /// Identity slot paired with mode position `index`, if one was recorded.
    pub fn identity(&self, index: usize) -> Option<&MonitorIdentity> {
        self.identities.get(index)
    }

    /// Iterate over target modes with their identity slot.
    pub fn targets(&self) -> impl Iterator<Item = (&Mode, Option<&MonitorIdentity>)> + '_ {
        self.modes
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_target())
            .map(move |(i, m)| (m, self.identity(i)))
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
