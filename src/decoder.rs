//! Bit-at-a-time decoding over any prefix-walkable structure.
//!
//! Decoding never searches the code table. Each bit moves one step through a
//! tree, so the cost is linear in the number of payload bits.

use bitstream_io::BitRead;

use crate::bits;
use crate::code::CodeTable;
use crate::error::{CodecError, Result};
use crate::tree::{HuffmanTree, Node};

/// Outcome of following one bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Still inside a code; continue from this state.
    Inner(usize),
    /// A full code was read.
    Symbol(u8),
    /// No code continues with this bit.
    Dead,
}

/// Something a decoder can walk from a start state, one bit per step.
pub trait PrefixWalk {
    fn start(&self) -> usize;

    fn step(&self, state: usize, bit: bool) -> Step;

    /// Set when the alphabet has a single symbol. Every meaningful bit then
    /// stands for one occurrence of it, whatever the bit's value.
    fn lone_symbol(&self) -> Option<u8>;
}

impl PrefixWalk for HuffmanTree {
    fn start(&self) -> usize {
        self.root()
    }

    fn step(&self, state: usize, bit: bool) -> Step {
        let Node::Internal { left, right, .. } = *self.node(state) else {
            return Step::Dead;
        };
        let next = if bit { right } else { left };
        match *self.node(next) {
            Node::Leaf { symbol, .. } => Step::Symbol(symbol),
            Node::Internal { .. } => Step::Inner(next),
        }
    }

    fn lone_symbol(&self) -> Option<u8> {
        HuffmanTree::lone_symbol(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrieNode {
    Branch([Option<u32>; 2]),
    Leaf(u8),
}

/// Binary trie rebuilt from a stored [`CodeTable`], for decoders that never
/// saw the original frequencies.
#[derive(Debug, Clone)]
pub struct DecodeTrie {
    nodes: Vec<TrieNode>,
    lone: Option<u8>,
}

impl DecodeTrie {
    /// Insert every code of `table`. Fails with
    /// [`CodecError::MalformedCodeTable`] if two codes collide or one
    /// prefixes another.
    pub fn from_table(table: &CodeTable) -> Result<Self> {
        let mut trie = DecodeTrie {
            nodes: vec![TrieNode::Branch([None, None])],
            lone: None,
        };
        if table.len() == 1 {
            trie.lone = table.iter().next().map(|(symbol, _)| symbol);
            return Ok(trie);
        }
        for (symbol, code) in table.iter() {
            trie.insert(symbol, code.bits())?;
        }
        Ok(trie)
    }

    fn insert(&mut self, symbol: u8, bits: &[bool]) -> Result<()> {
        let conflict = || {
            CodecError::MalformedCodeTable(format!(
                "code for {symbol:#04x} collides with another code"
            ))
        };

        let mut at = 0usize;
        for &bit in bits {
            let TrieNode::Branch(children) = self.nodes[at] else {
                return Err(conflict());
            };
            at = match children[bit as usize] {
                Some(child) => child as usize,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::Branch([None, None]));
                    if let TrieNode::Branch(children) = &mut self.nodes[at] {
                        children[bit as usize] = Some(child as u32);
                    }
                    child
                }
            };
        }

        // The final node must be fresh: an existing leaf is a duplicate code,
        // an existing branch with children means this code prefixes another.
        match self.nodes[at] {
            TrieNode::Branch([None, None]) if at != 0 => {
                self.nodes[at] = TrieNode::Leaf(symbol);
                Ok(())
            }
            _ => Err(conflict()),
        }
    }
}

impl PrefixWalk for DecodeTrie {
    fn start(&self) -> usize {
        0
    }

    fn step(&self, state: usize, bit: bool) -> Step {
        let TrieNode::Branch(children) = self.nodes[state] else {
            return Step::Dead;
        };
        match children[bit as usize] {
            None => Step::Dead,
            Some(next) => match self.nodes[next as usize] {
                TrieNode::Leaf(symbol) => Step::Symbol(symbol),
                TrieNode::Branch(_) => Step::Inner(next as usize),
            },
        }
    }

    fn lone_symbol(&self) -> Option<u8> {
        self.lone
    }
}

/// Decode exactly `bit_count` bits of `payload` by walking `walker`.
///
/// Fails with [`CodecError::TruncatedOrCorruptStream`] if the payload holds
/// fewer bits than declared, a bit leads nowhere, or the last code is left
/// unfinished.
pub fn decode<W>(walker: &W, payload: &[u8], bit_count: u64) -> Result<Vec<u8>>
where
    W: PrefixWalk + ?Sized,
{
    let available = payload.len() as u64 * 8;
    if bit_count > available {
        return Err(CodecError::TruncatedOrCorruptStream(format!(
            "{bit_count} meaningful bits declared but payload holds {available}"
        )));
    }

    if let Some(symbol) = walker.lone_symbol() {
        let count = usize::try_from(bit_count).map_err(|_| {
            CodecError::TruncatedOrCorruptStream(format!("bit count {bit_count} out of range"))
        })?;
        return Ok(vec![symbol; count]);
    }

    let mut reader = bits::reader(payload);
    let mut output = Vec::with_capacity(payload.len() * 2);
    let start = walker.start();
    let mut state = start;
    let mut mid_code = false;

    for pos in 0..bit_count {
        let bit = reader.read_bit().map_err(|e| {
            CodecError::TruncatedOrCorruptStream(format!("payload ended at bit {pos}: {e}"))
        })?;
        match walker.step(state, bit) {
            Step::Symbol(symbol) => {
                output.push(symbol);
                state = start;
                mid_code = false;
            }
            Step::Inner(next) => {
                state = next;
                mid_code = true;
            }
            Step::Dead => {
                return Err(CodecError::TruncatedOrCorruptStream(format!(
                    "bit {pos} does not continue any code"
                )));
            }
        }
    }

    if mid_code {
        return Err(CodecError::TruncatedOrCorruptStream(
            "stream ends in the middle of a code".into(),
        ));
    }

    tracing::debug!(bit_count, output = output.len(), "decoded payload");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::encoder::encode;
    use crate::frequency::FrequencyTable;

    fn code(s: &str) -> Code {
        Code::new(s.chars().map(|c| c == '1').collect()).unwrap()
    }

    #[test]
    fn tree_and_trie_decode_the_same() {
        let data = b"she sells sea shells by the sea shore";
        let freqs = FrequencyTable::from_bytes(data);
        let tree = HuffmanTree::build(&freqs).unwrap();
        let table = CodeTable::from_tree(&tree);
        let payload = encode(&table, data).unwrap();

        let trie = DecodeTrie::from_table(&table).unwrap();
        let via_tree = decode(&tree, &payload.bytes, payload.bit_count).unwrap();
        let via_trie = decode(&trie, &payload.bytes, payload.bit_count).unwrap();
        assert_eq!(via_tree, data);
        assert_eq!(via_trie, data);
    }

    #[test]
    fn padding_bits_are_not_decoded() {
        // a = "1", b = "0": the three zero padding bits would read as "bbb".
        let table = CodeTable::build(&FrequencyTable::from_bytes(b"aaabb"));
        let trie = DecodeTrie::from_table(&table).unwrap();
        assert_eq!(decode(&trie, &[0b1110_0000], 5).unwrap(), b"aaabb");
    }

    #[test]
    fn unfinished_code_is_rejected() {
        let table = CodeTable::build(&FrequencyTable::from_bytes(b"abcd"));
        let trie = DecodeTrie::from_table(&table).unwrap();
        // "00" "0" -> second code is cut short.
        let err = decode(&trie, &[0b0000_0000], 3).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedOrCorruptStream(_)));
    }

    #[test]
    fn bit_count_beyond_payload_is_rejected() {
        let table = CodeTable::build(&FrequencyTable::from_bytes(b"abcd"));
        let trie = DecodeTrie::from_table(&table).unwrap();
        let err = decode(&trie, &[0xff], 9).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedOrCorruptStream(_)));
    }

    #[test]
    fn dead_branch_is_rejected() {
        // Incomplete code: nothing starts with "11".
        let table = CodeTable::from_entries([(1, code("0")), (2, code("10"))]).unwrap();
        let trie = DecodeTrie::from_table(&table).unwrap();
        assert_eq!(decode(&trie, &[0b0100_0000], 3).unwrap(), vec![1, 2]);
        let err = decode(&trie, &[0b1100_0000], 2).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedOrCorruptStream(_)));
    }

    #[test]
    fn lone_symbol_ignores_bit_values() {
        let table = CodeTable::build(&FrequencyTable::from_bytes(b"qqq"));
        let trie = DecodeTrie::from_table(&table).unwrap();
        assert_eq!(decode(&trie, &[0b1010_0000], 3).unwrap(), b"qqq");

        let tree = HuffmanTree::build(&FrequencyTable::from_bytes(b"qqq")).unwrap();
        assert_eq!(decode(&tree, &[0], 3).unwrap(), b"qqq");
    }

    #[test]
    fn trie_rejects_colliding_codes() {
        let pair = CodeTable::from_entries([(1, code("0")), (2, code("1"))]).unwrap();
        assert!(DecodeTrie::from_table(&pair).is_ok());

        // from_entries already refuses these, so build the trie by hand.
        let mut trie = DecodeTrie::from_table(&CodeTable::default()).unwrap();
        trie.insert(1, &[false, true]).unwrap();
        assert!(trie.insert(2, &[false, true]).is_err());
        assert!(trie.insert(3, &[false]).is_err());
        assert!(trie.insert(4, &[false, true, true]).is_err());
        assert!(trie.insert(5, &[]).is_err());
        assert!(trie.insert(6, &[true]).is_ok());
    }

    #[test]
    fn empty_payload_decodes_to_nothing() {
        let table = CodeTable::build(&FrequencyTable::from_bytes(b"ab"));
        let trie = DecodeTrie::from_table(&table).unwrap();
        assert!(decode(&trie, &[], 0).unwrap().is_empty());
    }
}
