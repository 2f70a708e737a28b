//! Fixture builders shared by the reconcile unit tests.

use crate::types::topology::{
    AdapterId, DesktopImageInfo, Mode, ModeBody, MonitorIdentity, Path, PathSource, PathTarget,
    Point, Rational, Rect, SourceMode, TargetMode, VideoSignalInfo, PATH_ACTIVE,
};

/// Active plain path on a single adapter.
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
            output_technology: 5,
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

pub fn source(adapter: AdapterId, id: u32) -> Mode {
    Mode {
        adapter,
        id,
        body: ModeBody::Source(SourceMode {
            width: 1920,
            height: 1080,
            pixel_format: 4,
            position: Point { x: 0, y: 0 },
        }),
    }
}

pub fn source_at(adapter: AdapterId, id: u32, x: i32) -> Mode {
    let mut mode = source(adapter, id);
    if let ModeBody::Source(ref mut s) = mode.body {
        s.position.x = x;
    }
    mode
}

pub fn target(adapter: AdapterId, id: u32) -> Mode {
    Mode {
        adapter,
        id,
        body: ModeBody::Target(TargetMode {
            signal: VideoSignalInfo {
                pixel_rate: 148_500_000,
                v_sync_freq: Rational::new(60_000, 1_000),
                ..VideoSignalInfo::default()
            },
        }),
    }
}

pub fn with_standard(mut mode: Mode, standard: u32) -> Mode {
    if let ModeBody::Target(ref mut t) = mode.body {
        t.signal.video_standard = standard;
    }
    mode
}

pub fn desktop(adapter: AdapterId, id: u32, width: i32) -> Mode {
    Mode {
        adapter,
        id,
        body: ModeBody::DesktopImage(DesktopImageInfo {
            path_source_size: Point { x: width, y: 1080 },
            desktop_image_region: Rect {
                left: 0,
                top: 0,
                right: width,
                bottom: 1080,
            },
            desktop_image_clip: Rect {
                left: 0,
                top: 0,
                right: width,
                bottom: 1080,
            },
        }),
    }
}

pub fn identity(name: &str, device_path: &str, manufacturer: u16, product: u16) -> MonitorIdentity {
    MonitorIdentity {
        manufacturer_id: manufacturer,
        product_id: product,
        valid: true,
        device_path: device_path.into(),
        friendly_name: name.into(),
    }
}
