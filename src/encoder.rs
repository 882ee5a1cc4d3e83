use crate::bits::BitSink;
use crate::code::{Code, CodeTable};
use crate::error::{CodecError, Result};

/// Packed bitstream plus the number of bits in it that carry symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    pub bit_count: u64,
}

/// Replace each byte of `data` with its code and pack the result MSB-first.
///
/// A byte without a code means the table was not built from `data`, which
/// is reported as [`CodecError::InternalInconsistency`].
pub fn encode(table: &CodeTable, data: &[u8]) -> Result<EncodedPayload> {
    let mut lookup: [Option<&Code>; 256] = [None; 256];
    for (symbol, code) in table.iter() {
        lookup[symbol as usize] = Some(code);
    }

    let mut sink = BitSink::with_capacity(data.len());
    for (pos, &byte) in data.iter().enumerate() {
        let code = lookup[byte as usize].ok_or_else(|| {
            CodecError::InternalInconsistency(format!(
                "byte {byte:#04x} at offset {pos} has no code"
            ))
        })?;
        sink.push_bits(code.bits()).map_err(CodecError::Io)?;
    }

    let (bytes, bit_count) = sink.finish().map_err(CodecError::Io)?;
    tracing::debug!(input = data.len(), bit_count, packed = bytes.len(), "encoded payload");
    Ok(EncodedPayload { bytes, bit_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyTable;

    #[test]
    fn encodes_two_symbol_example() {
        let table = CodeTable::build(&FrequencyTable::from_bytes(b"aaabb"));
        let payload = encode(&table, b"aaabb").unwrap();
        assert_eq!(payload.bit_count, 5);
        assert_eq!(payload.bytes, vec![0b1110_0000]);
    }

    #[test]
    fn bit_count_is_sum_of_code_lengths() {
        let data = b"mississippi river";
        let freqs = FrequencyTable::from_bytes(data);
        let table = CodeTable::build(&freqs);
        let payload = encode(&table, data).unwrap();
        assert_eq!(payload.bit_count, table.weighted_length(&freqs));
        assert_eq!(payload.bytes.len() as u64, payload.bit_count.div_ceil(8));
    }

    #[test]
    fn lone_symbol_uses_one_bit_each() {
        let data = [b'z'; 10];
        let table = CodeTable::build(&FrequencyTable::from_bytes(&data));
        let payload = encode(&table, &data).unwrap();
        assert_eq!(payload.bit_count, 10);
        assert_eq!(payload.bytes, vec![0, 0]);
    }

    #[test]
    fn empty_input_encodes_to_nothing() {
        let payload = encode(&CodeTable::default(), &[]).unwrap();
        assert_eq!(payload.bit_count, 0);
        assert!(payload.bytes.is_empty());
    }

    #[test]
    fn missing_symbol_is_inconsistency() {
        let table = CodeTable::build(&FrequencyTable::from_bytes(b"ab"));
        let err = encode(&table, b"abc").unwrap_err();
        assert!(matches!(err, CodecError::InternalInconsistency(_)));
    }
}
