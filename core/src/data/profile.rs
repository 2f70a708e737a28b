//! Profile document: the JSON form of a `Snapshot`.
//!
//! Layout (camelCase keys):
//!   - `pathInfo`: paths, each with `sourceInfo` / `targetInfo` / `flags`
//!   - `modeInfo`: modes tagged by numeric `infoType` (1 source, 2 target,
//!     3 desktop image) carrying exactly one of `sourceMode`, `targetMode`,
//!     `desktopImageInfo`
//!   - `additionalInfo`: monitor identity, parallel to `modeInfo`
//!
//! Mode-index fields are stored verbatim; packed virtual-mode indices are
//! only decoded by the reconciler.

use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProfileError;
use crate::types::topology::{
    AdapterId, DesktopImageInfo, Mode, ModeBody, ModeKind, MonitorIdentity, Path, PathSource,
    PathTarget, Point, Rational, Rect, Region, Snapshot, SourceMode, TargetMode, VideoSignalInfo,
};


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub path_info: Vec<PathInfo>,
    pub mode_info: Vec<ModeInfo>,
    #[serde(default)]
    pub additional_info: Vec<AdditionalInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Luid {
    pub low_part: u32,
    pub high_part: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RationalDoc {
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionDoc {
    pub cx: u32,
    pub cy: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointDoc {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RectDoc {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    pub source_info: PathSourceInfo,
    pub target_info: PathTargetInfo,
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSourceInfo {
    pub adapter_id: Luid,
    pub id: u32,
    pub mode_info_idx: u32,
    pub status_flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTargetInfo {
    pub adapter_id: Luid,
    pub id: u32,
    pub mode_info_idx: u32,
    pub output_technology: u32,
    pub rotation: u32,
    pub scaling: u32,
    pub refresh_rate: RationalDoc,
    pub scan_line_ordering: u32,
    pub target_available: bool,
    pub status_flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeInfo {
    pub info_type: u32,
    pub id: u32,
    pub adapter_id: Luid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mode: Option<TargetModeDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mode: Option<SourceModeDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_image_info: Option<DesktopImageDoc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetModeDoc {
    pub target_video_signal_info: VideoSignalDoc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSignalDoc {
    pub pixel_rate: i64,
    pub h_sync_freq: RationalDoc,
    pub v_sync_freq: RationalDoc,
    pub active_size: RegionDoc,
    pub total_size: RegionDoc,
    pub video_standard: u32,
    pub scan_line_ordering: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceModeDoc {
    pub width: u32,
    pub height: u32,
    pub pixel_format: u32,
    pub position: PointDoc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopImageDoc {
    pub path_source_size: PointDoc,
    pub desktop_image_region: RectDoc,
    pub desktop_image_clip: RectDoc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    #[serde(rename = "manufactureId")]
    pub manufacture_id: u16,
    #[serde(rename = "productCodeId")]
    pub product_code_id: u16,
    pub valid: bool,
    #[serde(rename = "monitorDevicePath")]
    pub monitor_device_path: String,
    #[serde(rename = "monitorFriendlyDevice")]
    pub monitor_friendly_device: String,
}


// ---------------------------------------------------------------------------
// Snapshot <-> document
// ---------------------------------------------------------------------------

impl From<AdapterId> for Luid {
    fn from(a: AdapterId) -> Self {
        Luid {
            low_part: a.low,
            high_part: a.high,
        }
    }
}

impl From<Luid> for AdapterId {
    fn from(l: Luid) -> Self {
        AdapterId::new(l.low_part, l.high_part)
    }
}

impl From<Rational> for RationalDoc {
    fn from(r: Rational) -> Self {
        RationalDoc {
            numerator: r.numerator,
            denominator: r.denominator,
        }
    }
}

impl From<RationalDoc> for Rational {
    fn from(r: RationalDoc) -> Self {
        Rational::new(r.numerator, r.denominator)
    }
}

impl From<Region> for RegionDoc {
    fn from(r: Region) -> Self {
        RegionDoc { cx: r.cx, cy: r.cy }
    }
}

impl From<RegionDoc> for Region {
    fn from(r: RegionDoc) -> Self {
        Region { cx: r.cx, cy: r.cy }
    }
}

impl From<Point> for PointDoc {
    fn from(p: Point) -> Self {
        PointDoc { x: p.x, y: p.y }
    }
}

impl From<PointDoc> for Point {
    fn from(p: PointDoc) -> Self {
        Point { x: p.x, y: p.y }
    }
}

impl From<Rect> for RectDoc {
    fn from(r: Rect) -> Self {
        RectDoc {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
        }
    }
}

impl From<RectDoc> for Rect {
    fn from(r: RectDoc) -> Self {
        Rect {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
        }
    }
}

impl From<&Path> for PathInfo {
    fn from(p: &Path) -> Self {
        PathInfo {
            source_info: PathSourceInfo {
                adapter_id: p.source.adapter.into(),
                id: p.source.id,
                mode_info_idx: p.source.mode_index,
                status_flags: p.source.status_flags,
            },
            target_info: PathTargetInfo {
                adapter_id: p.target.adapter.into(),
                id: p.target.id,
                mode_info_idx: p.target.mode_index,
                output_technology: p.target.output_technology,
                rotation: p.target.rotation,
                scaling: p.target.scaling,
                refresh_rate: p.target.refresh_rate.into(),
                scan_line_ordering: p.target.scan_line_ordering,
                target_available: p.target.available,
                status_flags: p.target.status_flags,
            },
            flags: p.flags,
        }
    }
}

impl From<&PathInfo> for Path {
    fn from(p: &PathInfo) -> Self {
        let s = &p.source_info;
        let t = &p.target_info;
        Path {
            source: PathSource {
                adapter: s.adapter_id.into(),
                id: s.id,
                mode_index: s.mode_info_idx,
                status_flags: s.status_flags,
            },
            target: PathTarget {
                adapter: t.adapter_id.into(),
                id: t.id,
                mode_index: t.mode_info_idx,
                output_technology: t.output_technology,
                rotation: t.rotation,
                scaling: t.scaling,
                refresh_rate: t.refresh_rate.into(),
                scan_line_ordering: t.scan_line_ordering,
                available: t.target_available,
                status_flags: t.status_flags,
            },
            flags: p.flags,
        }
    }
}

impl From<&Mode> for ModeInfo {
    fn from(m: &Mode) -> Self {
        let mut info = ModeInfo {
            info_type: m.kind().as_raw(),
            id: m.id,
            adapter_id: m.adapter.into(),
            ..ModeInfo::default()
        };
        match m.body {
            ModeBody::Target(t) => {
                let v = t.signal;
                info.target_mode = Some(TargetModeDoc {
                    target_video_signal_info: VideoSignalDoc {
                        pixel_rate: v.pixel_rate as i64,
                        h_sync_freq: v.h_sync_freq.into(),
                        v_sync_freq: v.v_sync_freq.into(),
                        active_size: v.active_size.into(),
                        total_size: v.total_size.into(),
                        video_standard: v.video_standard,
                        scan_line_ordering: v.scan_line_ordering,
                    },
                });
            }
            ModeBody::Source(s) => {
                info.source_mode = Some(SourceModeDoc {
                    width: s.width,
                    height: s.height,
                    pixel_format: s.pixel_format,
                    position: s.position.into(),
                });
            }
            ModeBody::DesktopImage(d) => {
                info.desktop_image_info = Some(DesktopImageDoc {
                    path_source_size: d.path_source_size.into(),
                    desktop_image_region: d.desktop_image_region.into(),
                    desktop_image_clip: d.desktop_image_clip.into(),
                });
            }
        }
        info
    }
}

impl ModeInfo {
    fn to_mode(&self, index: usize) -> Result<Mode, ProfileError> {
        let kind = ModeKind::from_raw(self.info_type).ok_or(ProfileError::UnknownModeType {
            index,
            info_type: self.info_type,
        })?;
        let missing = || ProfileError::MissingModeBody { index, kind };
        let body = match kind {
            ModeKind::Target => {
                let v = self.target_mode.ok_or_else(missing)?.target_video_signal_info;
                ModeBody::Target(TargetMode {
                    signal: VideoSignalInfo {
                        pixel_rate: v.pixel_rate as u64,
                        h_sync_freq: v.h_sync_freq.into(),
                        v_sync_freq: v.v_sync_freq.into(),
                        active_size: v.active_size.into(),
                        total_size: v.total_size.into(),
                        video_standard: v.video_standard,
                        scan_line_ordering: v.scan_line_ordering,
                    },
                })
            }
            ModeKind::Source => {
                let s = self.source_mode.ok_or_else(missing)?;
                ModeBody::Source(SourceMode {
                    width: s.width,
                    height: s.height,
                    pixel_format: s.pixel_format,
                    position: s.position.into(),
                })
            }
            ModeKind::DesktopImage => {
                let d = self.desktop_image_info.ok_or_else(missing)?;
                ModeBody::DesktopImage(DesktopImageInfo {
                    path_source_size: d.path_source_size.into(),
                    desktop_image_region: d.desktop_image_region.into(),
                    desktop_image_clip: d.desktop_image_clip.into(),
                })
            }
        };
        Ok(Mode {
            adapter: self.adapter_id.into(),
            id: self.id,
            body,
        })
    }
}

impl From<&MonitorIdentity> for AdditionalInfo {
    fn from(i: &MonitorIdentity) -> Self {
        AdditionalInfo {
            manufacture_id: i.manufacturer_id,
            product_code_id: i.product_id,
            valid: i.valid,
            monitor_device_path: i.device_path.clone(),
            monitor_friendly_device: i.friendly_name.clone(),
        }
    }
}

impl From<&AdditionalInfo> for MonitorIdentity {
    fn from(a: &AdditionalInfo) -> Self {
        MonitorIdentity {
            manufacturer_id: a.manufacture_id,
            product_id: a.product_code_id,
            valid: a.valid,
            device_path: a.monitor_device_path.clone(),
            friendly_name: a.monitor_friendly_device.clone(),
        }
    }
}

impl From<&Snapshot> for ProfileDocument {
    fn from(s: &Snapshot) -> Self {
        ProfileDocument {
            path_info: s.paths.iter().map(PathInfo::from).collect(),
            mode_info: s.modes.iter().map(ModeInfo::from).collect(),
            additional_info: s.identities.iter().map(AdditionalInfo::from).collect(),
        }
    }
}

impl TryFrom<&ProfileDocument> for Snapshot {
    type Error = ProfileError;

    fn try_from(doc: &ProfileDocument) -> Result<Snapshot, ProfileError> {
        let modes = doc
            .mode_info
            .iter()
            .enumerate()
            .map(|(i, m)| m.to_mode(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Snapshot::new(
            doc.path_info.iter().map(Path::from).collect(),
            modes,
            doc.additional_info.iter().map(MonitorIdentity::from).collect(),
        ))
    }
}


// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Parse a profile from JSON text.
pub fn from_json(text: &str) -> Result<Snapshot, ProfileError> {
    let doc: ProfileDocument = serde_json::from_str(text).map_err(ProfileError::Parse)?;
    Snapshot::try_from(&doc)
}

/// Pretty-printed JSON with a trailing newline.
pub fn to_json(snapshot: &Snapshot) -> Result<String, ProfileError> {
    let mut text =
        serde_json::to_string_pretty(&ProfileDocument::from(snapshot)).map_err(ProfileError::Serialize)?;
    text.push('\n');
    Ok(text)
}

pub fn load(path: &FsPath) -> Result<Snapshot, ProfileError> {
    debug!(path = %path.display(), "loading profile");
    let text = std::fs::read_to_string(path).map_err(ProfileError::Read)?;
    from_json(&text)
}

pub fn save(path: &FsPath, snapshot: &Snapshot) -> Result<(), ProfileError> {
    debug!(path = %path.display(), "saving profile");
    let text = to_json(snapshot)?;
    std::fs::write(path, text).map_err(ProfileError::Write)
}
