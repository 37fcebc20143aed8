//! Ordered, immutable parameter schema.
//!
//! The schema is supplied by the host synthesizer at startup and never
//! mutated by this crate. It defines the active parameter count `N`, the
//! position → identifier mapping used by the legacy binary format, and the
//! per-slot default values that [`Patch::reset_to_defaults`] restores.
//!
//! [`Patch::reset_to_defaults`]: crate::Patch::reset_to_defaults

/// One schema slot: a stable textual identifier plus its default value.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    /// Stable identifier, used as the key in the text format.
    pub id: &'static str,
    /// Default normalized value for this slot.
    pub default: f32,
}

impl SchemaEntry {
    /// Create an entry with a default value of `0.0`.
    pub const fn new(id: &'static str) -> Self {
        Self { id, default: 0.0 }
    }

    /// Create an entry with an explicit default value.
    pub const fn with_default(id: &'static str, default: f32) -> Self {
        Self { id, default }
    }
}

/// Ordered parameter descriptor table.
///
/// Positions are significant: the legacy binary format stores values by
/// position, the text format stores them by identifier. Both orderings are
/// derived from this table.
pub struct ParameterSchema {
    entries: Vec<SchemaEntry>,
    voice_count_slot: Option<usize>,
}

impl ParameterSchema {
    /// Build a schema from an ordered entry list.
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        Self {
            entries,
            voice_count_slot: None,
        }
    }

    /// Designate the voice-count parameter by identifier.
    ///
    /// The legacy voice-count migration (×0.25 for pre-marker text files)
    /// only ever touches this slot. Unknown identifiers leave the schema
    /// without a designated slot, disabling the migration.
    pub fn with_voice_count(mut self, id: &str) -> Self {
        self.voice_count_slot = self.index_of(id);
        self
    }

    /// Number of parameters (`N`).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the schema has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifier at `position`, or `None` past the end.
    pub fn id(&self, position: usize) -> Option<&'static str> {
        self.entries.get(position).map(|e| e.id)
    }

    /// Default value at `position`, or `None` past the end.
    pub fn default_value(&self, position: usize) -> Option<f32> {
        self.entries.get(position).map(|e| e.default)
    }

    /// Position of `id`, or `None` if the schema does not contain it.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Position of the designated voice-count parameter, if any.
    pub fn voice_count_slot(&self) -> Option<usize> {
        self.voice_count_slot
    }

    /// Iterate entries in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParameterSchema {
        ParameterSchema::new(vec![
            SchemaEntry::with_default("VOLUME", 0.5),
            SchemaEntry::with_default("VOICE_COUNT", 0.2),
            SchemaEntry::new("CUTOFF"),
        ])
        .with_voice_count("VOICE_COUNT")
    }

    #[test]
    fn test_ordering_and_lookup() {
        let s = schema();
        assert_eq!(s.len(), 3);
        assert_eq!(s.id(0), Some("VOLUME"));
        assert_eq!(s.id(2), Some("CUTOFF"));
        assert_eq!(s.id(3), None);
        assert_eq!(s.index_of("CUTOFF"), Some(2));
        assert_eq!(s.index_of("NOPE"), None);
    }

    #[test]
    fn test_voice_count_slot() {
        assert_eq!(schema().voice_count_slot(), Some(1));

        let without = ParameterSchema::new(vec![SchemaEntry::new("VOLUME")])
            .with_voice_count("VOICE_COUNT");
        assert_eq!(without.voice_count_slot(), None);
    }

    #[test]
    fn test_defaults() {
        let s = schema();
        assert_eq!(s.default_value(0), Some(0.5));
        assert_eq!(s.default_value(2), Some(0.0));
        assert_eq!(s.default_value(9), None);
    }
}
