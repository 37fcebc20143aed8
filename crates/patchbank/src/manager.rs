//! Host-facing state facade.
//!
//! All load and save entry points live here. Loads validate and decode
//! before any state becomes visible, publish the active patch, and raise
//! one change message per successful call. Failed loads raise nothing and
//! leave nothing changed.
//!
//! The facade runs on the host's control thread. The audio thread never
//! takes the bank mutex; it reads the published snapshot through the
//! [`ActivePatch`] handle returned by [`StateManager::active_patch`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use patchbank_core::{ActivePatch, Bank, ChangeBroadcaster, ListenerId, ParameterSchema};

use crate::chunk;
use crate::error::Result;
use crate::text;

pub struct StateManager {
    schema: Arc<ParameterSchema>,
    bank: Arc<Mutex<Bank>>,
    listeners: Mutex<ChangeBroadcaster>,
}

impl StateManager {
    /// Create a manager over a fresh bank of `program_count` default
    /// patches.
    pub fn new(schema: Arc<ParameterSchema>, program_count: usize) -> Self {
        let bank = Bank::new(&schema, program_count);
        Self {
            schema,
            bank: Arc::new(Mutex::new(bank)),
            listeners: Mutex::new(ChangeBroadcaster::new()),
        }
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    /// Shared bank handle for control-thread collaborators (engine
    /// parameter writes, program switching from the GUI).
    pub fn bank(&self) -> Arc<Mutex<Bank>> {
        Arc::clone(&self.bank)
    }

    /// Lock-free handle the audio thread reads the selected patch from.
    pub fn active_patch(&self) -> ActivePatch {
        self.bank_guard().active()
    }

    /// Serialize the whole bank to a text document. Always succeeds.
    pub fn serialize_bank(&self) -> Vec<u8> {
        let bank = self.bank_guard();
        log::debug!("serializing bank: {} programs", bank.program_count());
        text::serialize_bank(&bank, &self.schema)
    }

    /// Serialize the selected program to a text document. Always succeeds.
    pub fn serialize_current_patch(&self) -> Vec<u8> {
        text::serialize_patch(self.bank_guard().current(), &self.schema)
    }

    /// Load a text bank document.
    ///
    /// With `restore_current_program` the pre-call selection survives the
    /// load; otherwise the document's index is selected. Hosts restoring a
    /// session pass `false`; a user importing a bank mid-performance
    /// passes `true`.
    pub fn load_bank(&self, bytes: &[u8], restore_current_program: bool) -> Result<()> {
        log::debug!("loading text bank: {} bytes", bytes.len());
        {
            let mut bank = self.bank_guard();
            let previous = bank.current_program();
            let document_index = text::apply_bank(&mut bank, &self.schema, bytes)
                .inspect_err(|e| log::warn!("bank load rejected: {e}"))?;
            let index = if restore_current_program {
                previous
            } else {
                document_index
            };
            bank.set_current_program(index);
        }
        self.send_change_message();
        Ok(())
    }

    /// Load a text patch document into the selected program.
    pub fn load_current_patch(&self, bytes: &[u8]) -> Result<()> {
        log::debug!("loading text patch: {} bytes", bytes.len());
        {
            let mut bank = self.bank_guard();
            text::apply_patch(&mut bank, &self.schema, bytes)
                .inspect_err(|e| log::warn!("patch load rejected: {e}"))?;
            bank.publish();
        }
        self.send_change_message();
        Ok(())
    }

    /// Load a legacy binary buffer, detecting its sub-format.
    pub fn load_legacy_chunk(&self, bytes: &[u8]) -> Result<()> {
        {
            let mut bank = self.bank_guard();
            chunk::load_chunk(&mut bank, &self.schema, bytes)
                .inspect_err(|e| log::warn!("legacy chunk rejected: {e}"))?;
        }
        self.send_change_message();
        Ok(())
    }

    /// Encode the bank as a legacy bank container. Always succeeds.
    pub fn save_bank_chunk(&self) -> Vec<u8> {
        chunk::encode_bank_chunk(&self.bank_guard(), &self.schema)
    }

    /// Encode the selected program as a legacy program container. Always
    /// succeeds.
    pub fn save_patch_chunk(&self) -> Vec<u8> {
        chunk::encode_program_chunk(&self.bank_guard(), &self.schema)
    }

    /// `true` when `bytes` holds a single program rather than a bank.
    pub fn is_program_chunk(&self, bytes: &[u8]) -> bool {
        chunk::is_program_chunk(bytes)
    }

    /// Register a listener called after every successful load.
    pub fn add_change_listener(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> ListenerId {
        self.listeners_guard().add_listener(listener)
    }

    /// Unregister a listener. Returns `false` for unknown tokens.
    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.listeners_guard().remove_listener(id)
    }

    fn send_change_message(&self) {
        self.listeners_guard().send_change_message();
    }

    // A poisoned mutex still holds structurally valid state, so recover
    // the guard instead of propagating the panic.
    fn bank_guard(&self) -> MutexGuard<'_, Bank> {
        self.bank.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners_guard(&self) -> MutexGuard<'_, ChangeBroadcaster> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
