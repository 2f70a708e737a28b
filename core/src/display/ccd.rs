//! Connecting and Configuring Displays (CCD) backend.
//!
//! Thin conversion layer between the `DISPLAYCONFIG_*` structures and the
//! portable topology types. Modes with type zero and paths whose target is
//! not available are dropped from every query result.

use tracing::{debug, trace};
use windows::Win32::Devices::Display::{
    DisplayConfigGetDeviceInfo, GetDisplayConfigBufferSizes, QueryDisplayConfig, SetDisplayConfig,
    DISPLAYCONFIG_2DREGION, DISPLAYCONFIG_DESKTOP_IMAGE_INFO, DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME,
    DISPLAYCONFIG_DEVICE_INFO_HEADER, DISPLAYCONFIG_MODE_INFO, DISPLAYCONFIG_MODE_INFO_0,
    DISPLAYCONFIG_MODE_INFO_TYPE, DISPLAYCONFIG_PATH_INFO, DISPLAYCONFIG_PATH_SOURCE_INFO,
    DISPLAYCONFIG_PATH_SOURCE_INFO_0, DISPLAYCONFIG_PATH_TARGET_INFO, DISPLAYCONFIG_PATH_TARGET_INFO_0,
    DISPLAYCONFIG_PIXELFORMAT, DISPLAYCONFIG_RATIONAL, DISPLAYCONFIG_ROTATION, DISPLAYCONFIG_SCALING,
    DISPLAYCONFIG_SCANLINE_ORDERING, DISPLAYCONFIG_SOURCE_MODE, DISPLAYCONFIG_TARGET_DEVICE_NAME,
    DISPLAYCONFIG_TARGET_MODE, DISPLAYCONFIG_VIDEO_OUTPUT_TECHNOLOGY, DISPLAYCONFIG_VIDEO_SIGNAL_INFO,
    DISPLAYCONFIG_VIDEO_SIGNAL_INFO_0, QUERY_DISPLAY_CONFIG_FLAGS, SET_DISPLAY_CONFIG_FLAGS,
};
use windows::Win32::Foundation::{BOOL, ERROR_SUCCESS, LUID, POINTL, RECTL};

use crate::display::{ApplyFlags, DisplayBackend, QueryFilter};
use crate::error::BackendError;
use crate::types::topology::{
    AdapterId, DesktopImageInfo, Mode, ModeBody, ModeKind, MonitorIdentity, Path, PathSource,
    PathTarget, Point, Rational, Rect, Region, Snapshot, SourceMode, TargetMode, VideoSignalInfo,
};


#[derive(Debug, Default)]
pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        WindowsBackend
    }
}

impl DisplayBackend for WindowsBackend {
    fn query(&mut self, filter: QueryFilter) -> Result<Snapshot, BackendError> {
        let flags = QUERY_DISPLAY_CONFIG_FLAGS(filter.bits());
        let mut path_count = 0u32;
        let mut mode_count = 0u32;
        let status = unsafe { GetDisplayConfigBufferSizes(flags, &mut path_count, &mut mode_count) };
        if status != ERROR_SUCCESS {
            return Err(BackendError::call("GetDisplayConfigBufferSizes", status.0));
        }

        let mut raw_paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_count as usize];
        let mut raw_modes = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_count as usize];
        let status = unsafe {
            QueryDisplayConfig(
                flags,
                &mut path_count,
                raw_paths.as_mut_ptr(),
                &mut mode_count,
                raw_modes.as_mut_ptr(),
                None,
            )
        };
        if status != ERROR_SUCCESS {
            return Err(BackendError::call("QueryDisplayConfig", status.0));
        }
        raw_paths.truncate(path_count as usize);
        raw_modes.truncate(mode_count as usize);

        let modes: Vec<Mode> = raw_modes.iter().filter_map(mode_from_raw).collect();
        let paths: Vec<Path> = raw_paths
            .iter()
            .filter(|p| p.targetInfo.targetAvailable.as_bool())
            .map(path_from_raw)
            .collect();
        let identities = modes
            .iter()
            .map(|m| {
                if m.is_target() {
                    target_identity(m.adapter, m.id).unwrap_or_default()
                } else {
                    MonitorIdentity::default()
                }
            })
            .collect();

        debug!(
            flags = filter.bits(),
            paths = paths.len(),
            modes = modes.len(),
            "queried display configuration"
        );
        Ok(Snapshot::new(paths, modes, identities))
    }

    fn apply(&mut self, paths: &[Path], modes: &[Mode], flags: ApplyFlags) -> Result<(), BackendError> {
        let raw_paths: Vec<DISPLAYCONFIG_PATH_INFO> = paths.iter().map(path_to_raw).collect();
        let raw_modes: Vec<DISPLAYCONFIG_MODE_INFO> = modes.iter().map(mode_to_raw).collect();
        let status = unsafe {
            SetDisplayConfig(
                (!raw_paths.is_empty()).then_some(raw_paths.as_slice()),
                (!raw_modes.is_empty()).then_some(raw_modes.as_slice()),
                SET_DISPLAY_CONFIG_FLAGS(flags.bits()),
            )
        };
        if status != 0 {
            return Err(BackendError::call("SetDisplayConfig", status));
        }
        Ok(())
    }
}


/// Identity of one target, or `None` when the device-info call fails.
fn target_identity(adapter: AdapterId, target_id: u32) -> Option<MonitorIdentity> {
    let mut name = DISPLAYCONFIG_TARGET_DEVICE_NAME {
        header: DISPLAYCONFIG_DEVICE_INFO_HEADER {
            r#type: DISPLAYCONFIG_DEVICE_INFO_GET_TARGET_NAME,
            size: std::mem::size_of::<DISPLAYCONFIG_TARGET_DEVICE_NAME>() as u32,
            adapterId: luid(adapter),
            id: target_id,
        },
        ..Default::default()
    };
    let status = unsafe { DisplayConfigGetDeviceInfo(&mut name.header) };
    if status != 0 {
        trace!(target_id, status, "DisplayConfigGetDeviceInfo failed");
        return None;
    }
    Some(MonitorIdentity {
        manufacturer_id: name.edidManufactureId,
        product_id: name.edidProductCodeId,
        valid: true,
        device_path: utf16(&name.monitorDevicePath),
        friendly_name: utf16(&name.monitorFriendlyDeviceName),
    })
}

fn utf16(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}


// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn adapter_id(luid: LUID) -> AdapterId {
    AdapterId::new(luid.LowPart, luid.HighPart as u32)
}

fn luid(adapter: AdapterId) -> LUID {
    LUID {
        LowPart: adapter.low,
        HighPart: adapter.high as i32,
    }
}

fn rational(r: DISPLAYCONFIG_RATIONAL) -> Rational {
    Rational::new(r.Numerator, r.Denominator)
}

fn raw_rational(r: Rational) -> DISPLAYCONFIG_RATIONAL {
    DISPLAYCONFIG_RATIONAL {
        Numerator: r.numerator,
        Denominator: r.denominator,
    }
}

fn region(r: DISPLAYCONFIG_2DREGION) -> Region {
    Region { cx: r.cx, cy: r.cy }
}

fn raw_region(r: Region) -> DISPLAYCONFIG_2DREGION {
    DISPLAYCONFIG_2DREGION { cx: r.cx, cy: r.cy }
}

fn point(p: POINTL) -> Point {
    Point { x: p.x, y: p.y }
}

fn raw_point(p: Point) -> POINTL {
    POINTL { x: p.x, y: p.y }
}

fn rect(r: RECTL) -> Rect {
    Rect {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

fn raw_rect(r: Rect) -> RECTL {
    RECTL {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

fn path_from_raw(raw: &DISPLAYCONFIG_PATH_INFO) -> Path {
    let s = &raw.sourceInfo;
    let t = &raw.targetInfo;
    Path {
        source: PathSource {
            adapter: adapter_id(s.adapterId),
            id: s.id,
            mode_index: unsafe { s.Anonymous.modeInfoIdx },
            status_flags: s.statusFlags,
        },
        target: PathTarget {
            adapter: adapter_id(t.adapterId),
            id: t.id,
            mode_index: unsafe { t.Anonymous.modeInfoIdx },
            output_technology: t.outputTechnology.0 as u32,
            rotation: t.rotation.0 as u32,
            scaling: t.scaling.0 as u32,
            refresh_rate: rational(t.refreshRate),
            scan_line_ordering: t.scanLineOrdering.0 as u32,
            available: t.targetAvailable.as_bool(),
            status_flags: t.statusFlags,
        },
        flags: raw.flags,
    }
}

fn path_to_raw(path: &Path) -> DISPLAYCONFIG_PATH_INFO {
    DISPLAYCONFIG_PATH_INFO {
        sourceInfo: DISPLAYCONFIG_PATH_SOURCE_INFO {
            adapterId: luid(path.source.adapter),
            id: path.source.id,
            Anonymous: DISPLAYCONFIG_PATH_SOURCE_INFO_0 {
                modeInfoIdx: path.source.mode_index,
            },
            statusFlags: path.source.status_flags,
        },
        targetInfo: DISPLAYCONFIG_PATH_TARGET_INFO {
            adapterId: luid(path.target.adapter),
            id: path.target.id,
            Anonymous: DISPLAYCONFIG_PATH_TARGET_INFO_0 {
                modeInfoIdx: path.target.mode_index,
            },
            outputTechnology: DISPLAYCONFIG_VIDEO_OUTPUT_TECHNOLOGY(path.target.output_technology as i32),
            rotation: DISPLAYCONFIG_ROTATION(path.target.rotation as i32),
            scaling: DISPLAYCONFIG_SCALING(path.target.scaling as i32),
            refreshRate: raw_rational(path.target.refresh_rate),
            scanLineOrdering: DISPLAYCONFIG_SCANLINE_ORDERING(path.target.scan_line_ordering as i32),
            targetAvailable: BOOL::from(path.target.available),
            statusFlags: path.target.status_flags,
        },
        flags: path.flags,
    }
}

/// `None` for type-zero slots and unknown types.
fn mode_from_raw(raw: &DISPLAYCONFIG_MODE_INFO) -> Option<Mode> {
    let kind = ModeKind::from_raw(raw.infoType.0 as u32)?;
    let body = unsafe {
        match kind {
            ModeKind::Source => {
                let s = raw.Anonymous.sourceMode;
                ModeBody::Source(SourceMode {
                    width: s.width,
                    height: s.height,
                    pixel_format: s.pixelFormat.0 as u32,
                    position: point(s.position),
                })
            }
            ModeKind::Target => {
                let v = raw.Anonymous.targetMode.targetVideoSignalInfo;
                ModeBody::Target(TargetMode {
                    signal: VideoSignalInfo {
                        pixel_rate: v.pixelRate,
                        h_sync_freq: rational(v.hSyncFreq),
                        v_sync_freq: rational(v.vSyncFreq),
                        active_size: region(v.activeSize),
                        total_size: region(v.totalSize),
                        video_standard: v.Anonymous.videoStandard,
                        scan_line_ordering: v.scanLineOrdering.0 as u32,
                    },
                })
            }
            ModeKind::DesktopImage => {
                let d = raw.Anonymous.desktopImageInfo;
                ModeBody::DesktopImage(DesktopImageInfo {
                    path_source_size: point(d.PathSourceSize),
                    desktop_image_region: rect(d.DesktopImageRegion),
                    desktop_image_clip: rect(d.DesktopImageClip),
                })
            }
        }
    };
    Some(Mode {
        adapter: adapter_id(raw.adapterId),
        id: raw.id,
        body,
    })
}

fn mode_to_raw(mode: &Mode) -> DISPLAYCONFIG_MODE_INFO {
    let anonymous = match mode.body {
        ModeBody::Source(s) => DISPLAYCONFIG_MODE_INFO_0 {
            sourceMode: DISPLAYCONFIG_SOURCE_MODE {
                width: s.width,
                height: s.height,
                pixelFormat: DISPLAYCONFIG_PIXELFORMAT(s.pixel_format as i32),
                position: raw_point(s.position),
            },
        },
        ModeBody::Target(t) => DISPLAYCONFIG_MODE_INFO_0 {
            targetMode: DISPLAYCONFIG_TARGET_MODE {
                targetVideoSignalInfo: DISPLAYCONFIG_VIDEO_SIGNAL_INFO {
                    pixelRate: t.signal.pixel_rate,
                    hSyncFreq: raw_rational(t.signal.h_sync_freq),
                    vSyncFreq: raw_rational(t.signal.v_sync_freq),
                    activeSize: raw_region(t.signal.active_size),
                    totalSize: raw_region(t.signal.total_size),
                    Anonymous: DISPLAYCONFIG_VIDEO_SIGNAL_INFO_0 {
                        videoStandard: t.signal.video_standard,
                    },
                    scanLineOrdering: DISPLAYCONFIG_SCANLINE_ORDERING(t.signal.scan_line_ordering as i32),
                },
            },
        },
        ModeBody::DesktopImage(d) => DISPLAYCONFIG_MODE_INFO_0 {
            desktopImageInfo: DISPLAYCONFIG_DESKTOP_IMAGE_INFO {
                PathSourceSize: raw_point(d.path_source_size),
                DesktopImageRegion: raw_rect(d.desktop_image_region),
                DesktopImageClip: raw_rect(d.desktop_image_clip),
            },
        },
    };
    DISPLAYCONFIG_MODE_INFO {
        infoType: DISPLAYCONFIG_MODE_INFO_TYPE(mode.kind().as_raw() as i32),
        id: mode.id,
        adapterId: luid(mode.adapter),
        Anonymous: anonymous,
    }
}
