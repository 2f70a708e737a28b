//! Topology fixtures shared by the integration tests.
//!
//! The crate's own reconcile fixtures are `cfg(test)` only, so integration
//! tests build theirs here from the public types.

#![allow(dead_code)]

use std::path::Path as FsPath;

use monswitch_core::data::profile;
use monswitch_core::display::MemoryBackend;
pub use monswitch_core::reconcile::classify::SOFTWARE_DISPLAY_VIDEO_STANDARD;
use monswitch_core::sys::Sys;
use monswitch_core::types::config::SwitcherSettings;
use monswitch_core::types::topology::{
    AdapterId, DesktopImageInfo, Mode, ModeBody, MonitorIdentity, Path, PathSource, PathTarget,
    Point, Rational, Rect, Region, Snapshot, SourceMode, TargetMode, VideoSignalInfo, PATH_ACTIVE,
};

pub fn adapter(low: u32) -> AdapterId {
    AdapterId::new(low, 0)
}

pub fn path(adapter: AdapterId, source_id: u32, target_id: u32, source_idx: u32, target_idx: u32) -> Path {
    Path {
        source: PathSource {
            adapter,
            id: source_id,
            mode_index: source_idx,
            status_flags: 1,
        },
        target: PathTarget {
            adapter,
            id: target_id,
            mode_index: target_idx,
            output_technology: 10,
            rotation: 1,
            scaling: 1,
            refresh_rate: Rational::new(60_000, 1_000),
            scan_line_ordering: 1,
            available: true,
            status_flags: 1,
        },
        flags: PATH_ACTIVE,
    }
}

pub fn source(adapter: AdapterId, id: u32, x: i32) -> Mode {
    Mode {
        adapter,
        id,
        body: ModeBody::Source(SourceMode {
            width: 2560,
            height: 1440,
            pixel_format: 4,
            position: Point { x, y: 0 },
        }),
    }
}

pub fn target(adapter: AdapterId, id: u32, video_standard: u32) -> Mode {
    Mode {
        adapter,
        id,
        body: ModeBody::Target(TargetMode {
            signal: VideoSignalInfo {
                pixel_rate: 241_500_000,
                h_sync_freq: Rational::new(88_790, 1),
                v_sync_freq: Rational::new(60_000, 1_000),
                active_size: Region { cx: 2560, cy: 1440 },
                total_size: Region { cx: 2720, cy: 1481 },
                video_standard,
                scan_line_ordering: 1,
            },
        }),
    }
}

pub fn desktop(adapter: AdapterId, id: u32) -> Mode {
    let rect = Rect {
        left: 0,
        top: 0,
        right: 2560,
        bottom: 1440,
    };
    Mode {
        adapter,
        id,
        body: ModeBody::DesktopImage(DesktopImageInfo {
            path_source_size: Point { x: 2560, y: 1440 },
            desktop_image_region: rect,
            desktop_image_clip: rect,
        }),
    }
}

pub fn named(name: &str) -> MonitorIdentity {
    MonitorIdentity {
        valid: true,
        friendly_name: name.into(),
        ..MonitorIdentity::default()
    }
}

/// One monitor: source 0 driving `target_id`.
pub fn single(adapter: AdapterId, target_id: u32, name: &str) -> Snapshot {
    Snapshot::new(
        vec![path(adapter, 0, target_id, 0, 1)],
        vec![source(adapter, 0, 0), target(adapter, target_id, 255)],
        vec![MonitorIdentity::default(), named(name)],
    )
}

/// A runtime whose bare profile names resolve into `dir`.
pub fn sys(dir: &FsPath, live: Snapshot) -> Sys {
    let settings = SwitcherSettings {
        profile_dir: dir.to_path_buf(),
        ..SwitcherSettings::default()
    };
    Sys::new(settings, Box::new(MemoryBackend::new(live)))
}

/// Write `snapshot` as `<dir>/<name>.monitorprofile`.
pub fn write_profile(dir: &FsPath, name: &str, snapshot: &Snapshot) {
    profile::save(&dir.join(format!("{name}.monitorprofile")), snapshot).unwrap();
}

pub fn read_profile(dir: &FsPath, name: &str) -> Snapshot {
    profile::load(&dir.join(format!("{name}.monitorprofile"))).unwrap()
}
