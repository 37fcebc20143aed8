//! # Patchbank
//!
//! State engine for a bank-of-patches synthesizer: serialize parameter
//! state to a tree-structured text format or a legacy fixed-layout binary
//! container, detect and decode either one from an opaque buffer, and
//! publish the result to a concurrently rendering audio thread.
//!
//! Hosts talk to the [`StateManager`] facade:
//!
//! ```rust
//! use std::sync::Arc;
//! use patchbank::{ParameterSchema, SchemaEntry, StateManager};
//!
//! let schema = Arc::new(
//!     ParameterSchema::new(vec![
//!         SchemaEntry::with_default("VOLUME", 0.5),
//!         SchemaEntry::with_default("VOICE_COUNT", 0.2),
//!     ])
//!     .with_voice_count("VOICE_COUNT"),
//! );
//! let manager = StateManager::new(schema, 8);
//!
//! let saved = manager.serialize_bank();
//! manager.load_bank(&saved, false).expect("own output loads");
//!
//! // The audio thread keeps this handle and never blocks on it.
//! let active = manager.active_patch();
//! assert_eq!(active.snapshot().value(0), Some(0.5));
//! ```

pub mod chunk;
mod error;
pub mod manager;
pub mod text;

pub use error::{Result, StateError};
pub use manager::StateManager;

// Re-export the data model crate.
pub use patchbank_core as core;
pub use patchbank_core::{
    ActivePatch, Bank, ChangeBroadcaster, ListenerId, ParameterSchema, Patch, SchemaEntry,
    DEFAULT_PATCH_NAME, MAX_PROGRAMS,
};
