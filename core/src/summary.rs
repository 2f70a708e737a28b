//! Human-readable topology summary.

use std::fmt::Write;

use crate::reconcile::index;
use crate::types::topology::{Rational, Snapshot};


pub fn format_summary(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Active display paths: {}", snapshot.paths.len());

    for (i, path) in snapshot.paths.iter().enumerate() {
        let state = if path.is_active() { "active" } else { "inactive" };
        let _ = writeln!(out, "Path {} ({})", i + 1, state);

        let target = index::target_mode(snapshot, path);
        let name = target
            .and_then(|(_, identity)| identity)
            .filter(|id| id.valid && !id.friendly_name.is_empty())
            .map(|id| id.friendly_name.as_str())
            .unwrap_or("Unknown");
        let _ = writeln!(
            out,
            "  Target: {} (id {}, adapter {})",
            name, path.target.id, path.target.adapter
        );

        if let Some(signal) = target.and_then(|(mode, _)| mode.target()).map(|t| t.signal) {
            let _ = writeln!(out, "  Refresh: {}", format_refresh_rate(signal.v_sync_freq));
            let _ = writeln!(
                out,
                "  Active size: {}x{}",
                signal.active_size.cx, signal.active_size.cy
            );
        }

        if let Some(source) = index::source_mode(snapshot, path).and_then(|m| m.source()) {
            let _ = writeln!(
                out,
                "  Source: {}x{} @ ({},{}), pixel format {}",
                source.width, source.height, source.position.x, source.position.y, source.pixel_format
            );
        }

        let _ = writeln!(
            out,
            "  Rotation: {}, Scaling: {}, TargetAvailable: {}",
            path.target.rotation, path.target.scaling, path.target.available
        );
    }
    out
}

fn format_refresh_rate(r: Rational) -> String {
    if r.denominator == 0 {
        return format!("{}/{} Hz", r.numerator, r.denominator);
    }
    let hz = f64::from(r.numerator) / f64::from(r.denominator);
    format!("{:.2} Hz ({}/{})", hz, r.numerator, r.denominator)
}
