//! Live topology capture.

use tracing::debug;

use crate::display::{DisplayBackend, QueryFilter};
use crate::error::BackendError;
use crate::types::topology::Snapshot;


/// Query with `filter`; if a virtual-mode-aware query is refused, retry once
/// without the virtual-mode bit.
pub fn query_with_fallback(
    backend: &mut dyn DisplayBackend,
    filter: QueryFilter,
) -> Result<Snapshot, BackendError> {
    match backend.query(filter) {
        Ok(snapshot) => Ok(snapshot),
        Err(err) if filter.virtual_mode_aware => {
            debug!(error = %err, "virtual-mode-aware query failed, falling back to standard query");
            backend.query(QueryFilter {
                virtual_mode_aware: false,
                ..filter
            })
        }
        Err(err) => Err(err),
    }
}

/// Snapshot of the active paths, as written to a profile.
pub fn capture(backend: &mut dyn DisplayBackend) -> Result<Snapshot, BackendError> {
    query_with_fallback(backend, QueryFilter::active(true))
}
