//! The stored artifact: code table, meaningful bit count and packed payload.
//!
//! Byte layout (bincode, fixed-width little-endian integers):
//!
//! ```text
//! entries:   u64 count, then per entry
//!              symbol  u8
//!              length  u8           code length in bits, 1..=255
//!              bits    u64 + bytes  code packed MSB-first, ceil(length / 8) bytes
//! bit_count: u64
//! payload:   u64 + bytes            ceil(bit_count / 8) bytes
//! ```
//!
//! Entries are written in ascending symbol order so equal inputs give equal
//! bytes.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::bits;
use crate::code::{Code, CodeTable};
use crate::decoder::{self, DecodeTrie};
use crate::error::{CodecError, Result};

#[derive(Serialize, Deserialize)]
struct WireEntry {
    symbol: u8,
    length: u8,
    bits: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct WireFile {
    entries: Vec<WireEntry>,
    bit_count: u64,
    payload: Vec<u8>,
}

pub(crate) fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// Map a bincode failure onto the codec's error kinds. Running out of input
/// means the artifact was cut short.
pub(crate) fn wire_error(err: bincode::Error) -> CodecError {
    match *err {
        bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            CodecError::TruncatedOrCorruptStream(format!("input ends early: {io}"))
        }
        bincode::ErrorKind::SizeLimit => {
            CodecError::TruncatedOrCorruptStream("declared length runs past end of input".into())
        }
        other => CodecError::MalformedFile(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecFile {
    table: CodeTable,
    bit_count: u64,
    payload: Vec<u8>,
}

impl CodecFile {
    pub fn new(table: CodeTable, bit_count: u64, payload: Vec<u8>) -> Self {
        Self {
            table,
            bit_count,
            payload,
        }
    }

    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_parts(self) -> (CodeTable, u64, Vec<u8>) {
        (self.table, self.bit_count, self.payload)
    }

    /// Check the invariants a decoder relies on before walking any bits.
    pub fn validate(&self) -> Result<()> {
        if self.table.is_empty() && self.bit_count > 0 {
            return Err(CodecError::MalformedCodeTable(format!(
                "no entries but {} payload bits",
                self.bit_count
            )));
        }
        let expected = bits::packed_len(self.bit_count);
        let actual = self.payload.len() as u64;
        if actual < expected {
            return Err(CodecError::TruncatedOrCorruptStream(format!(
                "payload is {actual} bytes, {} meaningful bits need {expected}",
                self.bit_count
            )));
        }
        if actual > expected {
            return Err(CodecError::MalformedFile(format!(
                "payload is {actual} bytes, {} meaningful bits need only {expected}",
                self.bit_count
            )));
        }
        Ok(())
    }

    /// Rebuild the original bytes from the stored table and payload.
    pub fn decode(&self) -> Result<Vec<u8>> {
        self.validate()?;
        if self.bit_count == 0 {
            return Ok(Vec::new());
        }
        let trie = DecodeTrie::from_table(&self.table)?;
        decoder::decode(&trie, &self.payload, self.bit_count)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let entries = self
            .table
            .iter()
            .map(|(symbol, code)| {
                Ok(WireEntry {
                    symbol,
                    // Code::new caps lengths at MAX_CODE_LEN (255).
                    length: code.len() as u8,
                    bits: bits::pack(code.bits()).map_err(CodecError::Io)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let wire = WireFile {
            entries,
            bit_count: self.bit_count,
            payload: self.payload.clone(),
        };
        wire_options().serialize(&wire).map_err(wire_error)
    }

    /// Parse the layout written by [`CodecFile::to_bytes`]. Trailing bytes,
    /// malformed tables and payloads that disagree with the bit count are
    /// rejected.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let wire: WireFile = wire_options()
            .with_limit(data.len() as u64)
            .deserialize(data)
            .map_err(wire_error)?;

        let entries = wire
            .entries
            .into_iter()
            .map(|entry| {
                let length = entry.length as usize;
                if entry.bits.len() != length.div_ceil(8) {
                    return Err(CodecError::MalformedCodeTable(format!(
                        "code for {:#04x} declares {length} bits but stores {} bytes",
                        entry.symbol,
                        entry.bits.len()
                    )));
                }
                let bits = bits::unpack(&entry.bits, length).map_err(|e| {
                    CodecError::MalformedCodeTable(format!("unreadable code bits: {e}"))
                })?;
                Ok((entry.symbol, Code::new(bits)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let file = CodecFile {
            table: CodeTable::from_entries(entries)?,
            bit_count: wire.bit_count,
            payload: wire.payload,
        };
        file.validate()?;
        Ok(file)
    }
}
