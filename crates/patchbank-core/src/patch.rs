//! A single named set of parameter values.

use crate::schema::ParameterSchema;

/// Name given to freshly initialized patches.
pub const DEFAULT_PATCH_NAME: &str = "Default";

/// One named set of `N` normalized parameter values.
///
/// The value vector always has exactly `schema.len()` slots. Codecs mutate
/// patches in place during a load; slots a document does not mention keep
/// whatever value they already held.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    name: String,
    values: Vec<f32>,
}

impl Patch {
    /// Create a patch with the schema's default content.
    pub fn new(schema: &ParameterSchema) -> Self {
        Self {
            name: DEFAULT_PATCH_NAME.to_string(),
            values: schema.iter().map(|e| e.default).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Value at `position`, or `None` past the schema length.
    pub fn value(&self, position: usize) -> Option<f32> {
        self.values.get(position).copied()
    }

    /// Set the value at `position`. Positions past the schema length are
    /// ignored, matching the tolerance the decoders rely on when a legacy
    /// record declares more parameters than the schema has.
    pub fn set_value(&mut self, position: usize, value: f32) {
        if let Some(slot) = self.values.get_mut(position) {
            *slot = value;
        }
    }

    /// All values in schema order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Restore every slot to its schema default. The name is reset
    /// separately by the codecs that need it.
    pub fn reset_to_defaults(&mut self, schema: &ParameterSchema) {
        for (slot, entry) in self.values.iter_mut().zip(schema.iter()) {
            *slot = entry.default;
        }
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
    fn test_new_patch_has_defaults() {
        let s = schema();
        let p = Patch::new(&s);
        assert_eq!(p.name(), DEFAULT_PATCH_NAME);
        assert_eq!(p.values(), &[0.5, 0.0]);
    }

    #[test]
    fn test_set_value_out_of_range_ignored() {
        let s = schema();
        let mut p = Patch::new(&s);
        p.set_value(1, 0.9);
        p.set_value(7, 0.9);
        assert_eq!(p.values(), &[0.5, 0.9]);
    }

    #[test]
    fn test_reset_to_defaults() {
        let s = schema();
        let mut p = Patch::new(&s);
        p.set_value(0, 1.0);
        p.set_value(1, 1.0);
        p.reset_to_defaults(&s);
        assert_eq!(p.values(), &[0.5, 0.0]);
    }
}
