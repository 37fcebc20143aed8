//! Tree-structured text format, serialized as JSON.
//!
//! Bank documents carry a format version, the selected program index and one
//! node per program. Program nodes key parameter values by schema identifier,
//! so documents survive parameter reordering between releases. The
//! `voiceCount` attribute doubles as a vintage marker: documents written
//! before it existed store the voice-count parameter on a four-times-larger
//! scale, and its absence triggers the 0.25 migration on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use patchbank_core::{Bank, ParameterSchema, Patch};

use crate::error::{Result, StateError};

/// Version tag written into every document.
const TEXT_FORMAT_VERSION: u32 = 1;

/// Voice cap written as the `voiceCount` attribute.
const MAX_VOICES: u32 = 32;

#[derive(Serialize, Deserialize)]
struct BankDoc {
    version: u32,
    #[serde(rename = "currentProgram", default)]
    current_program: usize,
    programs: Vec<ProgramDoc>,
}

#[derive(Serialize, Deserialize)]
struct PatchDoc {
    version: u32,
    #[serde(flatten)]
    program: ProgramDoc,
}

#[derive(Serialize, Deserialize)]
struct ProgramDoc {
    name: String,
    /// Absent on documents written before the voice-count rescale.
    #[serde(rename = "voiceCount", default, skip_serializing_if = "Option::is_none")]
    voice_count: Option<u32>,
    params: BTreeMap<String, f32>,
}

impl ProgramDoc {
    fn from_patch(patch: &Patch, schema: &ParameterSchema) -> Self {
        let params = schema
            .iter()
            .enumerate()
            .filter_map(|(pos, entry)| patch.value(pos).map(|v| (entry.id.to_string(), v)))
            .collect();
        Self {
            name: patch.name().to_string(),
            voice_count: Some(MAX_VOICES),
            params,
        }
    }

    /// Overlay this node onto `patch`: defaults first, then every identifier
    /// the document mentions. Identifiers the schema does not know are
    /// ignored; identifiers the document omits keep their default.
    fn apply(&self, patch: &mut Patch, schema: &ParameterSchema) {
        patch.reset_to_defaults(schema);
        patch.set_name(self.name.clone());
        for (id, value) in &self.params {
            if let Some(position) = schema.index_of(id) {
                patch.set_value(position, *value);
            }
        }
        // Pre-marker documents store voice count on a 0..128 scale where
        // current ones use 0..32. No clamping: legacy integer encodings
        // produce values above 1.0 on purpose.
        if self.voice_count.is_none() {
            if let Some(slot) = schema.voice_count_slot() {
                if let Some(value) = patch.value(slot) {
                    patch.set_value(slot, value * 0.25);
                }
            }
        }
    }
}

/// Serialize the whole bank to a bank document.
pub fn serialize_bank(bank: &Bank, schema: &ParameterSchema) -> Vec<u8> {
    let doc = BankDoc {
        version: TEXT_FORMAT_VERSION,
        current_program: bank.current_program(),
        programs: (0..bank.program_count())
            .filter_map(|i| bank.program(i))
            .map(|p| ProgramDoc::from_patch(p, schema))
            .collect(),
    };
    serde_json::to_vec(&doc).unwrap_or_default()
}

/// Serialize one patch to a patch document.
pub fn serialize_patch(patch: &Patch, schema: &ParameterSchema) -> Vec<u8> {
    let doc = PatchDoc {
        version: TEXT_FORMAT_VERSION,
        program: ProgramDoc::from_patch(patch, schema),
    };
    serde_json::to_vec(&doc).unwrap_or_default()
}

/// Decode a bank document and overlay it onto `bank`.
///
/// Parsing happens before any mutation, so a malformed document leaves the
/// bank exactly as it was. Program nodes beyond the bank's capacity are
/// dropped; bank slots beyond the document keep their content. Returns the
/// document's program index clamped to the bank. The caller decides whether
/// to select it and when to publish.
pub fn apply_bank(bank: &mut Bank, schema: &ParameterSchema, bytes: &[u8]) -> Result<usize> {
    let doc: BankDoc =
        serde_json::from_slice(bytes).map_err(|e| StateError::ParseFailure(e.to_string()))?;
    for (index, node) in doc.programs.iter().enumerate() {
        if let Some(patch) = bank.program_mut(index) {
            node.apply(patch, schema);
        }
    }
    Ok(doc.current_program.min(bank.program_count() - 1))
}

/// Decode a patch document into the selected program.
///
/// Mutation only happens after a successful parse. Does not publish.
pub fn apply_patch(bank: &mut Bank, schema: &ParameterSchema, bytes: &[u8]) -> Result<()> {
    let doc: PatchDoc =
        serde_json::from_slice(bytes).map_err(|e| StateError::ParseFailure(e.to_string()))?;
    let current = bank.current_program();
    if let Some(patch) = bank.program_mut(current) {
        doc.program.apply(patch, schema);
    }
    Ok(())
}
