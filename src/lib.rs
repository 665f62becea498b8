//! Rulewire – reactive rule dispatch for build-model wiring
//!
//! This crate implements the engine that lets subsystems declare
//! "when an entity looks like this, run that" against an in-process
//! entity/component graph:
//! - Identity snapshots recomputed from the facts written onto each entity
//! - A closed predicate algebra (`ModelSpec`) over those snapshots
//! - Action registrations stored as entities of the graph itself
//! - A dispatcher that runs each matching action exactly once per entity,
//!   deferring re-entrant firings into a per-entity FIFO

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Entity graph substrate, lifecycle states and configuration
pub mod model;

/// Identity, specs, action registrations and the dispatcher
pub mod actions;

// Re-export key types for convenience
pub use model::{Model, ModelConfig};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
