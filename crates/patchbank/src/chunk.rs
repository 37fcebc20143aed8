//! Legacy fixed-layout binary container format.
//!
//! Four record shapes share a common 28-byte prefix (chunk magic, byte
//! size, format magic, version, plugin id, plugin version, count):
//!
//! * `FxBk`: a bank of packed program records, values stored by position.
//! * `FxCk`: a single program record.
//! * `FBCh`: an opaque container wrapping a text-format bank document.
//! * `FPCh`: an opaque container wrapping a text-format patch document,
//!   plus the program name in the outer record.
//!
//! Fields are canonically big-endian. Files written fully byte-swapped are
//! also accepted: the byte order is detected from the rendering of the
//! chunk magic and then applied uniformly to every integer and float
//! field. Character arrays (names, nested payloads) are never swapped.
//!
//! Every offset is validated against the buffer before it is read, and
//! bank loads are transactional: a record that fails validation leaves
//! the bank exactly as it was.

use patchbank_core::{Bank, ParameterSchema, Patch};

use crate::error::{Result, StateError};
use crate::text;

const CHUNK_MAGIC: [u8; 4] = *b"CcnK";
const BANK_MAGIC: [u8; 4] = *b"FxBk";
const PROGRAM_MAGIC: [u8; 4] = *b"FxCk";
const BANK_CHUNK_MAGIC: [u8; 4] = *b"FBCh";
const PROGRAM_CHUNK_MAGIC: [u8; 4] = *b"FPCh";
/// Four-character plugin id written into every container.
const PLUGIN_ID: [u8; 4] = *b"PbnK";

/// Highest container version this codec accepts.
const FORMAT_VERSION: i32 = 1;

/// Shortest buffer that can hold the common record prefix.
const MIN_HEADER_LEN: usize = 28;
const NAME_LEN: usize = 28;
const RESERVED_LEN: usize = 128;

/// Program record: prefix + 28-byte name. Values follow.
const PROGRAM_HEADER_LEN: usize = 56;
/// Bank record: prefix + 128 reserved bytes. Program records follow.
const SET_HEADER_LEN: usize = 156;
/// Bank container: bank record + chunk size. Payload follows.
const BANK_CHUNK_HEADER_LEN: usize = 160;
/// Program container: prefix + name + chunk size. Payload follows.
const PROGRAM_CHUNK_HEADER_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Infer the file's byte order from how the leading chunk magic is
    /// rendered. `None` means the buffer does not start with the magic in
    /// either order.
    fn detect(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..4)?;
        if head == CHUNK_MAGIC {
            return Some(Self::Big);
        }
        let mut reversed = CHUNK_MAGIC;
        reversed.reverse();
        if head == reversed {
            return Some(Self::Little);
        }
        None
    }
}

/// Bounds-checked cursor over a record buffer.
struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> ChunkReader<'a> {
    fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
        }
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(StateError::TruncatedBuffer)?;
        if end > self.data.len() {
            return Err(StateError::TruncatedBuffer);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        let raw = [b[0], b[1], b[2], b[3]];
        Ok(match self.order {
            ByteOrder::Big => i32::from_be_bytes(raw),
            ByteOrder::Little => i32::from_le_bytes(raw),
        })
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_i32()? as u32))
    }

    /// Four-character tag, returned in canonical order regardless of the
    /// file's byte order.
    fn read_tag(&mut self) -> Result<[u8; 4]> {
        let b = self.take(4)?;
        let mut tag = [b[0], b[1], b[2], b[3]];
        if self.order == ByteOrder::Little {
            tag.reverse();
        }
        Ok(tag)
    }

    /// 28-byte NUL-padded name field.
    fn read_name(&mut self) -> Result<String> {
        let b = self.take(NAME_LEN)?;
        let end = b.iter().position(|&c| c == 0).unwrap_or(NAME_LEN);
        Ok(String::from_utf8_lossy(&b[..end]).into_owned())
    }
}

/// Detect the sub-format of `bytes` and apply it to `bank`.
///
/// Nothing in `bank` changes on any error path. Does not notify; the
/// facade raises the change message after a successful return.
pub fn load_chunk(bank: &mut Bank, schema: &ParameterSchema, bytes: &[u8]) -> Result<()> {
    if bytes.len() < MIN_HEADER_LEN {
        return Err(StateError::TruncatedBuffer);
    }
    let order = ByteOrder::detect(bytes).ok_or(StateError::MagicMismatch)?;

    let mut r = ChunkReader::new(bytes, order);
    r.read_tag()?; // chunk magic, validated by detect
    r.read_i32()?; // byte size, not trusted
    let fx_magic = r.read_tag()?;
    let version = r.read_i32()?;
    if version > FORMAT_VERSION {
        return Err(StateError::UnsupportedVersion(version));
    }

    log::debug!(
        "loading legacy chunk: {} bytes, format {}",
        bytes.len(),
        String::from_utf8_lossy(&fx_magic)
    );

    match fx_magic {
        BANK_MAGIC => load_program_bank(bank, bytes, order),
        PROGRAM_MAGIC => load_single_program(bank, bytes, order),
        BANK_CHUNK_MAGIC => load_bank_chunk(bank, schema, bytes, order),
        PROGRAM_CHUNK_MAGIC => load_program_chunk(bank, schema, bytes, order),
        _ => Err(StateError::MagicMismatch),
    }
}

/// `true` when `bytes` carries a single program (`FxCk` or `FPCh`),
/// `false` for bank-shaped or unrecognized buffers. Never mutates.
pub fn is_program_chunk(bytes: &[u8]) -> bool {
    let Some(order) = ByteOrder::detect(bytes) else {
        return false;
    };
    let mut r = ChunkReader::new(bytes, order);
    r.seek(8);
    matches!(r.read_tag(), Ok(tag) if tag == PROGRAM_MAGIC || tag == PROGRAM_CHUNK_MAGIC)
}

/// One packed program record at `offset`. Returns the record's declared
/// parameter count so the caller can derive the bank stride.
fn decode_program_record(
    patch: &mut Patch,
    bytes: &[u8],
    offset: usize,
    order: ByteOrder,
) -> Result<usize> {
    let header_end = offset
        .checked_add(PROGRAM_HEADER_LEN)
        .ok_or(StateError::TruncatedBuffer)?;
    if header_end > bytes.len() {
        return Err(StateError::TruncatedBuffer);
    }
    let mut r = ChunkReader::new(bytes, order);
    r.seek(offset);
    if r.read_tag()? != CHUNK_MAGIC {
        return Err(StateError::MagicMismatch);
    }
    r.read_i32()?; // byte size
    if r.read_tag()? != PROGRAM_MAGIC {
        return Err(StateError::MagicMismatch);
    }
    r.read_i32()?; // version
    r.read_tag()?; // plugin id, not checked on load
    r.read_i32()?; // plugin version
    let num_params =
        usize::try_from(r.read_i32()?).map_err(|_| StateError::TruncatedBuffer)?;
    let name = r.read_name()?;
    if header_end + num_params * 4 > bytes.len() {
        return Err(StateError::TruncatedBuffer);
    }

    patch.set_name(name);
    for position in 0..num_params {
        let value = r.read_f32()?;
        // Positions past the schema are discarded by the patch.
        patch.set_value(position, value);
    }
    Ok(num_params)
}

/// `FxBk`: packed program records at the stride derived from the first
/// record. All records decode into scratch patches before the bank is
/// touched; the selected program index survives the load.
fn load_program_bank(bank: &mut Bank, bytes: &[u8], order: ByteOrder) -> Result<()> {
    let mut r = ChunkReader::new(bytes, order);
    r.seek(24);
    let declared = r.read_i32()?;
    if declared <= 0 {
        return Ok(());
    }
    let count = (declared as usize).min(bank.program_count());

    let mut scratch: Vec<Patch> = (0..count).filter_map(|i| bank.program(i).cloned()).collect();
    let mut stride = 0;
    for (index, patch) in scratch.iter_mut().enumerate() {
        let offset = SET_HEADER_LEN + index * stride;
        let num_params = decode_program_record(patch, bytes, offset, order)?;
        if index == 0 {
            stride = PROGRAM_HEADER_LEN + num_params * 4;
        }
    }

    for (index, patch) in scratch.into_iter().enumerate() {
        if let Some(slot) = bank.program_mut(index) {
            *slot = patch;
        }
    }
    bank.publish();
    Ok(())
}

/// `FxCk`: the whole buffer is one program record, applied to the
/// selected slot.
fn load_single_program(bank: &mut Bank, bytes: &[u8], order: ByteOrder) -> Result<()> {
    let current = bank.current_program();
    let mut patch = match bank.program(current) {
        Some(p) => p.clone(),
        None => return Ok(()),
    };
    decode_program_record(&mut patch, bytes, 0, order)?;
    if let Some(slot) = bank.program_mut(current) {
        *slot = patch;
    }
    bank.publish();
    Ok(())
}

/// `FBCh`: nested text bank document. Program 0 is selected afterwards,
/// the container convention for full-bank transfers.
fn load_bank_chunk(
    bank: &mut Bank,
    schema: &ParameterSchema,
    bytes: &[u8],
    order: ByteOrder,
) -> Result<()> {
    let mut r = ChunkReader::new(bytes, order);
    r.seek(SET_HEADER_LEN);
    let chunk_size =
        usize::try_from(r.read_i32()?).map_err(|_| StateError::MalformedNestedChunk)?;
    if chunk_size + BANK_CHUNK_HEADER_LEN > bytes.len() {
        return Err(StateError::MalformedNestedChunk);
    }
    let payload = &bytes[BANK_CHUNK_HEADER_LEN..BANK_CHUNK_HEADER_LEN + chunk_size];
    text::apply_bank(bank, schema, payload)?;
    bank.set_current_program(0);
    Ok(())
}

/// `FPCh`: nested text patch document for the selected slot. The outer
/// record's name wins over the one inside the document.
fn load_program_chunk(
    bank: &mut Bank,
    schema: &ParameterSchema,
    bytes: &[u8],
    order: ByteOrder,
) -> Result<()> {
    let mut r = ChunkReader::new(bytes, order);
    r.seek(MIN_HEADER_LEN);
    let name = r.read_name()?;
    let chunk_size =
        usize::try_from(r.read_i32()?).map_err(|_| StateError::MalformedNestedChunk)?;
    if chunk_size + PROGRAM_CHUNK_HEADER_LEN > bytes.len() {
        return Err(StateError::MalformedNestedChunk);
    }
    let payload = &bytes[PROGRAM_CHUNK_HEADER_LEN..PROGRAM_CHUNK_HEADER_LEN + chunk_size];
    text::apply_patch(bank, schema, payload)?;
    bank.change_program_name(bank.current_program(), name);
    Ok(())
}

fn push_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_name(out: &mut Vec<u8>, name: &str) {
    let mut field = [0u8; NAME_LEN];
    let bytes = name.as_bytes();
    let n = bytes.len().min(NAME_LEN - 1);
    field[..n].copy_from_slice(&bytes[..n]);
    out.extend_from_slice(&field);
}

/// Wrap the bank's text document in an `FBCh` container.
pub fn encode_bank_chunk(bank: &Bank, schema: &ParameterSchema) -> Vec<u8> {
    let payload = text::serialize_bank(bank, schema);
    let mut out = Vec::with_capacity(BANK_CHUNK_HEADER_LEN + payload.len());
    out.extend_from_slice(&CHUNK_MAGIC);
    push_i32(&mut out, 0); // byte size, writers leave it zero
    out.extend_from_slice(&BANK_CHUNK_MAGIC);
    push_i32(&mut out, FORMAT_VERSION);
    out.extend_from_slice(&PLUGIN_ID);
    push_i32(&mut out, FORMAT_VERSION);
    push_i32(&mut out, bank.program_count() as i32);
    out.extend_from_slice(&[0u8; RESERVED_LEN]);
    push_i32(&mut out, payload.len() as i32);
    out.extend_from_slice(&payload);
    out
}

/// Wrap the selected program's text document in an `FPCh` container.
pub fn encode_program_chunk(bank: &Bank, schema: &ParameterSchema) -> Vec<u8> {
    let patch = bank.current();
    let payload = text::serialize_patch(patch, schema);
    let mut out = Vec::with_capacity(PROGRAM_CHUNK_HEADER_LEN + payload.len());
    out.extend_from_slice(&CHUNK_MAGIC);
    push_i32(&mut out, 0);
    out.extend_from_slice(&PROGRAM_CHUNK_MAGIC);
    push_i32(&mut out, FORMAT_VERSION);
    out.extend_from_slice(&PLUGIN_ID);
    push_i32(&mut out, FORMAT_VERSION);
    push_i32(&mut out, bank.program_count() as i32);
    push_name(&mut out, patch.name());
    push_i32(&mut out, payload.len() as i32);
    out.extend_from_slice(&payload);
    out
}
