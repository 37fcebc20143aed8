//! Program bank and the lock-free handle the audio thread reads from.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::patch::Patch;
use crate::schema::ParameterSchema;

/// Hard cap on the number of programs a bank holds.
pub const MAX_PROGRAMS: usize = 128;

/// Read-only handle onto the currently selected patch.
///
/// Cloning is cheap and the handle stays valid for the lifetime of the
/// bank it came from. [`ActivePatch::snapshot`] never blocks, which is
/// what lets the audio callback call it per block.
#[derive(Clone)]
pub struct ActivePatch {
    inner: Arc<ArcSwap<Patch>>,
}

impl ActivePatch {
    /// Latest published snapshot of the selected patch.
    pub fn snapshot(&self) -> Arc<Patch> {
        self.inner.load_full()
    }
}

/// Fixed-size collection of programs with one selected at a time.
///
/// Mutations go through the bank on the edit thread; every mutation that
/// touches the selected program republishes a fresh snapshot so readers
/// holding an [`ActivePatch`] observe either the old state or the new
/// state in full, never a half-applied edit.
pub struct Bank {
    programs: Vec<Patch>,
    current_program: usize,
    active: Arc<ArcSwap<Patch>>,
}

impl Bank {
    /// Create a bank of `program_count` default patches, clamped to
    /// [`MAX_PROGRAMS`], with program 0 selected.
    pub fn new(schema: &ParameterSchema, program_count: usize) -> Self {
        let count = program_count.clamp(1, MAX_PROGRAMS);
        let programs: Vec<Patch> = (0..count).map(|_| Patch::new(schema)).collect();
        let active = Arc::new(ArcSwap::from_pointee(programs[0].clone()));
        Self {
            programs,
            current_program: 0,
            active,
        }
    }

    /// Number of programs in the bank.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Index of the selected program.
    pub fn current_program(&self) -> usize {
        self.current_program
    }

    /// Select a program and republish. Out-of-range indices are clamped
    /// to the last program rather than rejected, matching how hosts send
    /// stale indices after a bank shrinks.
    pub fn set_current_program(&mut self, index: usize) {
        self.current_program = index.min(self.programs.len() - 1);
        self.publish();
    }

    /// Borrow the program at `index`.
    pub fn program(&self, index: usize) -> Option<&Patch> {
        self.programs.get(index)
    }

    /// Mutably borrow the program at `index`.
    ///
    /// The caller is responsible for calling [`Bank::publish`] afterwards
    /// if the selected program was touched. The codecs batch their edits
    /// and publish once at the end of a load.
    pub fn program_mut(&mut self, index: usize) -> Option<&mut Patch> {
        self.programs.get_mut(index)
    }

    /// Borrow the selected program.
    pub fn current(&self) -> &Patch {
        &self.programs[self.current_program]
    }

    /// Set one parameter on the selected program and republish.
    pub fn set_parameter_value(&mut self, position: usize, value: f32) {
        self.programs[self.current_program].set_value(position, value);
        self.publish();
    }

    /// Rename the program at `index`, republishing when it is selected.
    pub fn change_program_name(&mut self, index: usize, name: impl Into<String>) {
        if let Some(program) = self.programs.get_mut(index) {
            program.set_name(name);
            if index == self.current_program {
                self.publish();
            }
        }
    }

    /// Handle the audio thread keeps to read the selected patch.
    pub fn active(&self) -> ActivePatch {
        ActivePatch {
            inner: Arc::clone(&self.active),
        }
    }

    /// Publish a snapshot of the selected program.
    ///
    /// Readers that loaded the previous snapshot keep it alive until they
    /// drop their `Arc`; the swap itself is wait-free.
    pub fn publish(&self) {
        self.active
            .store(Arc::new(self.programs[self.current_program].clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaEntry;

    fn schema() -> ParameterSchema {
        ParameterSchema::new(vec![
            SchemaEntry::with_default("VOLUME", 0.5),
            SchemaEntry::new("CUTOFF"),
        ])
    }

    #[test]
    fn test_new_bank_selects_program_zero() {
        let s = schema();
        let bank = Bank::new(&s, 4);
        assert_eq!(bank.program_count(), 4);
        assert_eq!(bank.current_program(), 0);
        assert_eq!(bank.active().snapshot().values(), &[0.5, 0.0]);
    }

    #[test]
    fn test_program_count_clamped() {
        let s = schema();
        assert_eq!(Bank::new(&s, 0).program_count(), 1);
        assert_eq!(Bank::new(&s, 1000).program_count(), MAX_PROGRAMS);
    }

    #[test]
    fn test_set_parameter_value_republishes() {
        let s = schema();
        let mut bank = Bank::new(&s, 2);
        let active = bank.active();

        let before = active.snapshot();
        bank.set_parameter_value(1, 0.9);

        assert_eq!(before.values(), &[0.5, 0.0]);
        assert_eq!(active.snapshot().values(), &[0.5, 0.9]);
    }

    #[test]
    fn test_set_current_program_swaps_snapshot() {
        let s = schema();
        let mut bank = Bank::new(&s, 2);
        bank.program_mut(1).unwrap().set_value(0, 1.0);

        let active = bank.active();
        bank.set_current_program(1);
        assert_eq!(bank.current_program(), 1);
        assert_eq!(active.snapshot().values(), &[1.0, 0.0]);
    }

    #[test]
    fn test_set_current_program_clamps() {
        let s = schema();
        let mut bank = Bank::new(&s, 3);
        bank.set_current_program(99);
        assert_eq!(bank.current_program(), 2);
    }

    #[test]
    fn test_change_program_name_republishes_selected_only() {
        let s = schema();
        let mut bank = Bank::new(&s, 2);
        let active = bank.active();

        bank.change_program_name(1, "Other");
        assert_eq!(active.snapshot().name(), "Default");

        bank.change_program_name(0, "Lead");
        assert_eq!(active.snapshot().name(), "Lead");
    }

    #[test]
    fn test_snapshot_outlives_swap() {
        let s = schema();
        let mut bank = Bank::new(&s, 1);
        let active = bank.active();
        let held = active.snapshot();

        bank.set_parameter_value(0, 0.1);
        bank.set_parameter_value(0, 0.2);

        assert_eq!(held.values(), &[0.5, 0.0]);
        assert_eq!(active.snapshot().values(), &[0.2, 0.0]);
    }
}
