//! MSB-first bit packing on top of `bitstream-io`.
//! The first bit written lands in the high bit of the first byte and the
//! final partial byte is zero-padded in its low bits.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

/// Growing bit buffer that remembers how many bits are meaningful.
pub(crate) struct BitSink {
    writer: BitWriter<Vec<u8>, BigEndian>,
    bit_count: u64,
}

impl BitSink {
    pub(crate) fn with_capacity(bytes: usize) -> Self {
        Self {
            writer: BitWriter::endian(Vec::with_capacity(bytes), BigEndian),
            bit_count: 0,
        }
    }

    pub(crate) fn push_bits(&mut self, bits: &[bool]) -> io::Result<()> {
        for &bit in bits {
            self.writer.write_bit(bit)?;
        }
        self.bit_count += bits.len() as u64;
        Ok(())
    }

    /// Pad the last byte and return `(bytes, meaningful bit count)`.
    pub(crate) fn finish(mut self) -> io::Result<(Vec<u8>, u64)> {
        self.writer.byte_align()?;
        Ok((self.writer.into_writer(), self.bit_count))
    }
}

/// Reads bits back in the order [`BitSink`] wrote them.
pub(crate) fn reader(bytes: &[u8]) -> BitReader<&[u8], BigEndian> {
    BitReader::endian(bytes, BigEndian)
}

/// Pack a bit string into `ceil(len / 8)` bytes.
pub(crate) fn pack(bits: &[bool]) -> io::Result<Vec<u8>> {
    let mut sink = BitSink::with_capacity(bits.len().div_ceil(8));
    sink.push_bits(bits)?;
    Ok(sink.finish()?.0)
}

/// Unpack the first `count` bits of `bytes`.
pub(crate) fn unpack(bytes: &[u8], count: usize) -> io::Result<Vec<bool>> {
    let mut source = reader(bytes);
    (0..count).map(|_| source.read_bit()).collect()
}

/// Bytes needed to hold `bit_count` bits.
pub(crate) fn packed_len(bit_count: u64) -> u64 {
    bit_count.div_ceil(8)
}
