use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;
use crate::tree::{HuffmanTree, Node, NodeId};

/// Longest code a 256-symbol alphabet can produce.
pub const MAX_CODE_LEN: usize = 255;

/// A non-empty bit string, first bit first. `false` is 0, `true` is 1.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Code(Vec<bool>);

impl Code {
    pub fn new(bits: Vec<bool>) -> Result<Self> {
        if bits.is_empty() {
            return Err(CodecError::MalformedCodeTable("empty code".into()));
        }
        if bits.len() > MAX_CODE_LEN {
            return Err(CodecError::MalformedCodeTable(format!(
                "code of {} bits exceeds {MAX_CODE_LEN}",
                bits.len()
            )));
        }
        Ok(Code(bits))
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Mapping from symbol to its code, ordered by symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    /// Read codes off the root-to-leaf paths of `tree` (left = 0, right = 1).
    ///
    /// A single-leaf tree gets the code `0`.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();
        if let Some(symbol) = tree.lone_symbol() {
            codes.insert(symbol, Code(vec![false]));
        } else {
            let mut path = Vec::new();
            collect_codes(tree, tree.root(), &mut path, &mut codes);
        }
        CodeTable { codes }
    }

    /// Frequency analysis, tree construction and code assignment in one step.
    pub fn build(freqs: &FrequencyTable) -> Self {
        HuffmanTree::build(freqs)
            .map(|tree| Self::from_tree(&tree))
            .unwrap_or_default()
    }

    /// Assemble a table from stored entries, rejecting duplicate symbols,
    /// any pair of codes where one is a prefix of the other, and a lone
    /// symbol whose code is not `0`.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, Code)>,
    {
        let mut codes = BTreeMap::new();
        for (symbol, code) in entries {
            if codes.insert(symbol, code).is_some() {
                return Err(CodecError::MalformedCodeTable(format!(
                    "symbol {symbol:#04x} listed twice"
                )));
            }
        }
        if let (1, Some((symbol, code))) = (codes.len(), codes.iter().next()) {
            if *code.bits() != [false] {
                return Err(CodecError::MalformedCodeTable(format!(
                    "lone symbol {symbol:#04x} must use code 0, found {code}"
                )));
            }
        }
        let table = CodeTable { codes };
        if let Some((a, b)) = table.prefix_conflict() {
            return Err(CodecError::MalformedCodeTable(format!(
                "code for {a:#04x} is a prefix of the code for {b:#04x}"
            )));
        }
        Ok(table)
    }

    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.codes.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.codes.iter().map(|(&symbol, code)| (symbol, code))
    }

    pub fn is_prefix_free(&self) -> bool {
        self.prefix_conflict().is_none()
    }

    // After sorting codes lexicographically, a code that prefixes any other
    // also prefixes its immediate successor, so adjacent pairs suffice.
    // Equal codes count as a conflict.
    fn prefix_conflict(&self) -> Option<(u8, u8)> {
        let mut sorted: Vec<(&Code, u8)> = self.codes.iter().map(|(&s, c)| (c, s)).collect();
        sorted.sort();
        sorted
            .windows(2)
            .find(|pair| pair[0].0.is_prefix_of(pair[1].0))
            .map(|pair| (pair[0].1, pair[1].1))
    }

    /// Σ(count × code length) for `freqs` under this table. Symbols without a
    /// code contribute nothing.
    pub fn weighted_length(&self, freqs: &FrequencyTable) -> u64 {
        freqs
            .iter()
            .filter_map(|(symbol, count)| self.get(symbol).map(|code| count * code.len() as u64))
            .sum()
    }
}

fn collect_codes(
    tree: &HuffmanTree,
    id: NodeId,
    path: &mut Vec<bool>,
    codes: &mut BTreeMap<u8, Code>,
) {
    match *tree.node(id) {
        Node::Leaf { symbol, .. } => {
            codes.insert(symbol, Code(path.clone()));
        }
        Node::Internal { left, right, .. } => {
            path.push(false);
            collect_codes(tree, left, path, codes);
            path.pop();

            path.push(true);
            collect_codes(tree, right, path, codes);
            path.pop();
        }
    }
}
