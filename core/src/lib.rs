//! monswitch core: capture, persist and re-apply Windows display layouts.
//!
//! `Sys` is the entry point: it resolves profile names, talks to a
//! `DisplayBackend`, and runs saved profiles through `reconcile::apply_profile`.

pub mod command;
pub mod data;
pub mod display;
pub mod error;
pub mod help;
pub mod reconcile;
pub mod summary;
pub mod sys;
pub mod types;
