//! # huffpack
//!
//! Lossless byte-stream compression with static Huffman codes.
//!
//! ```rust
//! let file = huffpack::compress(b"abracadabra")?;
//! assert_eq!(huffpack::decompress(&file)?, b"abracadabra");
//! # Ok::<(), huffpack::CodecError>(())
//! ```
//!
//! Equal-weight nodes are merged in a fixed order: leaves rank by symbol
//! value and merged nodes by creation order after all leaves. The first node
//! taken from the queue becomes the left (0) branch, so the same input always
//! produces the same code table and the same bytes.

pub mod archive;
pub mod code;
pub mod codec_file;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frequency;
pub mod tree;

mod bits;

use std::io::Read;

pub use archive::Archive;
pub use code::{Code, CodeTable};
pub use codec_file::CodecFile;
pub use error::{CodecError, Result};
pub use frequency::FrequencyTable;
pub use tree::HuffmanTree;

/// Build the code for `data` and encode it.
///
/// Only fails if the freshly built table misses a symbol, which would be a
/// bug in this crate.
pub fn compress(data: &[u8]) -> Result<CodecFile> {
    let freqs = FrequencyTable::from_bytes(data);
    let table = match HuffmanTree::build(&freqs) {
        Some(tree) => CodeTable::from_tree(&tree),
        None => CodeTable::default(),
    };
    let payload = encoder::encode(&table, data)?;

    tracing::debug!(
        input = data.len(),
        symbols = table.len(),
        bit_count = payload.bit_count,
        "compressed"
    );
    Ok(CodecFile::new(table, payload.bit_count, payload.bytes))
}

/// Read all of `reader`, then [`compress`] it.
pub fn compress_reader<R: Read>(reader: R) -> Result<CodecFile> {
    let data = archive::read_input(reader)?;
    compress(&data)
}

/// Reconstruct the bytes encoded in `file`. Either the whole input comes
/// back or an error does.
pub fn decompress(file: &CodecFile) -> Result<Vec<u8>> {
    file.decode()
}
