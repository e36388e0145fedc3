//! Core types for the retreat ecosystem.
//!
//! This crate provides everything the CLI and mirror providers share:
//! - the record store and the named records it holds (journals,
//!   worksheets, the idea board, the packing checklist)
//! - the itinerary and schedule lookup
//! - ICS export
//! - the `remote` module for the CLI-provider mirroring protocol
//! - the auto-save debouncer and the assist (generative-text) client

pub mod assist;
pub mod autosave;
pub mod config;
pub mod error;
pub mod ics;
pub mod journal;
pub mod kanban;
pub mod record;
pub mod remote;
pub mod schedule;
pub mod store;
pub mod supplies;
pub mod sync;
pub mod workspace;
pub mod worksheets;

pub use error::{RetreatError, RetreatResult};
