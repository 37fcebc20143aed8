//! Data model for the Patchbank synthesizer state engine.
//!
//! This crate holds the pieces the codecs and the host-facing facade
//! share: the immutable parameter schema, the [`Patch`] value set, the
//! [`Bank`] of programs with its lock-free [`ActivePatch`] handle, and
//! the [`ChangeBroadcaster`] used for state-change notifications.

mod bank;
mod broadcast;
mod patch;
mod schema;

pub use bank::{ActivePatch, Bank, MAX_PROGRAMS};
pub use broadcast::{ChangeBroadcaster, ListenerId};
pub use patch::{Patch, DEFAULT_PATCH_NAME};
pub use schema::{ParameterSchema, SchemaEntry};
