//! Profile reconciliation.
//!
//! A saved snapshot is rarely applicable as is: adapter ids drift, virtual
//! displays come and go, and mode positions shift when paths are removed.
//! The submodules repair a saved snapshot against the live one step by step;
//! `apply` chains them into the escalating load sequence.

pub mod apply;
pub mod capture;
pub mod classify;
pub mod identity;
pub mod index;
pub mod merge;
pub mod remap;

#[cfg(test)]
pub(crate) mod testing;

pub use apply::{apply_profile, ApplyOptions, ApplyOutcome, Stage};
pub use capture::{capture, query_with_fallback};
