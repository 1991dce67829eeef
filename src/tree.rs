use crate::bit_io::BitReader;
use crate::error::{Error, Result, Stage};
use crate::frequency::FrequencyTable;
use bitvec::prelude::*;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::io::Read;

/// A prefix code, first bit first.
pub type Code = BitVec<u8, Msb0>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn from_children(left: TreeNode, right: TreeNode) -> Self {
        Self::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn weight(&self) -> u64 {
        match self {
            TreeNode::Leaf { weight, .. } | TreeNode::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    fn leaf_count(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// Priority-queue entry. Ordered by weight, then by creation order, so that
/// equal weights always pop in the same order. Leaves are created first in
/// ascending byte order, internal nodes after them as they are merged.
#[derive(Debug, Derivative)]
#[derivative(PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    weight: u64,
    seq: u64,

    #[derivative(PartialEq = "ignore")]
    #[derivative(PartialOrd = "ignore")]
    #[derivative(Ord = "ignore")]
    node: TreeNode,
}

impl Pending {
    fn new(node: TreeNode, seq: u64) -> Self {
        Self {
            weight: node.weight(),
            seq,
            node,
        }
    }
}

/// A Huffman tree over byte values. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: TreeNode,
}

impl HuffmanTree {
    /// Builds the tree for `table`.
    ///
    /// The two lowest entries are merged repeatedly; the first one popped
    /// becomes the left child. Ties go to the smaller byte value for leaves,
    /// and leaves go before internal nodes, which go in the order they were
    /// created. Two builds from equal tables are therefore identical, which
    /// the decoder depends on.
    ///
    /// A table with a single symbol gives a tree that is just one leaf.
    /// Fails with [`Error::CountOverflow`] if the counts do not sum into a
    /// `u64`.
    pub fn build(table: &FrequencyTable) -> Result<Self> {
        // every internal weight is bounded by the total
        if table.checked_total().is_none() {
            return Err(Error::CountOverflow);
        }

        let mut seq = 0u64;
        let mut pq: BinaryHeap<_> = table
            .present()
            .map(|(symbol, weight)| {
                let entry = Pending::new(TreeNode::Leaf { symbol, weight }, seq);
                seq += 1;
                Reverse(entry)
            })
            .collect();

        while let Some(Reverse(left)) = pq.pop() {
            let right = match pq.pop() {
                Some(Reverse(right)) => right,
                None => {
                    let tree = Self { root: left.node };
                    log::trace!("Huffman tree: {:?}", tree);
                    return Ok(tree);
                }
            };

            pq.push(Reverse(Pending::new(
                TreeNode::from_children(left.node, right.node),
                seq,
            )));
            seq += 1;
        }

        Err(Error::EmptyAlphabet)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Total weight, i.e. the number of symbols the table was built from.
    pub fn weight(&self) -> u64 {
        self.root.weight()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Walks the tree depth first, 0 for left and 1 for right. A lone leaf
    /// gets the empty code.
    pub fn code_table(&self) -> CodeTable {
        fn traverse(node: &TreeNode, path: &mut Code, codes: &mut BTreeMap<u8, Code>) {
            match node {
                TreeNode::Leaf { symbol, .. } => {
                    codes.insert(*symbol, path.clone());
                }
                TreeNode::Internal { left, right, .. } => {
                    path.push(false);
                    traverse(left, path, codes);
                    path.pop();

                    path.push(true);
                    traverse(right, path, codes);
                    path.pop();
                }
            }
        }

        let mut path = Code::new();
        let mut codes = BTreeMap::new();
        traverse(&self.root, &mut path, &mut codes);

        CodeTable { codes }
    }

    /// Reads bits until a leaf is reached and returns its symbol. A lone
    /// leaf is returned without reading anything.
    pub fn decode_symbol<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u8> {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { symbol, .. } => return Ok(*symbol),
                TreeNode::Internal { left, right, .. } => {
                    node = match reader.read_bit()? {
                        Some(false) => &**left,
                        Some(true) => &**right,
                        None => {
                            return Err(Error::TruncatedStream {
                                stage: Stage::Payload,
                            })
                        }
                    };
                }
            }
        }
    }
}

/// Symbol to prefix code mapping derived from a [`HuffmanTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    pub fn get(&self, symbol: u8) -> Option<&BitSlice<u8, Msb0>> {
        self.codes.get(&symbol).map(|code| code.as_bitslice())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitSlice<u8, Msb0>)> + '_ {
        self.codes.iter().map(|(&s, code)| (s, code.as_bitslice()))
    }

    /// Payload size in bits for input with the given frequencies.
    pub fn encoded_bits(&self, table: &FrequencyTable) -> u64 {
        self.iter()
            .map(|(symbol, code)| table.get(symbol).saturating_mul(code.len() as u64))
            .fold(0, u64::saturating_add)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableCodeTable {
    codes: BTreeMap<u8, (usize, Box<[u8]>)>,
}

impl<'a> From<&'a CodeTable> for SerializableCodeTable {
    fn from(other: &'a CodeTable) -> Self {
        Self {
            codes: other
                .codes
                .iter()
                .map(|(&k, v)| {
                    // a code is stored as its bit length plus the packed bytes
                    (k, (v.len(), v.clone().into_vec().into_boxed_slice()))
                })
                .collect(),
        }
    }
}

impl From<SerializableCodeTable> for CodeTable {
    fn from(other: SerializableCodeTable) -> Self {
        Self {
            codes: other
                .codes
                .into_iter()
                .map(|(k, (len, bytes))| {
                    let mut bv = Code::from_vec(bytes.into_vec());
                    bv.resize(len, false);
                    (k, bv)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(u8, u64)]) -> FrequencyTable {
        let mut counts = [0u64; 256];
        for &(s, c) in pairs {
            counts[s as usize] = c;
        }
        FrequencyTable::from_counts(counts)
    }

    fn code_str(codes: &CodeTable, symbol: u8) -> String {
        codes
            .get(symbol)
            .unwrap()
            .iter()
            .by_vals()
            .map(|b| if b { '1' } else { '0' })
            .collect()
    }

    fn check_shape(node: &TreeNode) {
        if let TreeNode::Internal {
            weight,
            left,
            right,
        } = node
        {
            assert_eq!(*weight, left.weight() + right.weight());
            check_shape(left);
            check_shape(right);
        }
    }

    #[test]
    fn empty_alphabet() {
        assert!(matches!(
            HuffmanTree::build(&FrequencyTable::new()),
            Err(Error::EmptyAlphabet)
        ));
    }

    #[test]
    fn overflowing_counts() {
        let t = table(&[(b'a', u64::MAX), (b'b', 2)]);
        assert!(matches!(HuffmanTree::build(&t), Err(Error::CountOverflow)));

        let t = table(&[(b'a', u64::MAX - 2), (b'b', 2)]);
        assert_eq!(HuffmanTree::build(&t).unwrap().weight(), u64::MAX);
    }

    #[test]
    fn single_leaf() {
        let tree = HuffmanTree::build(&table(&[(b'A', 4)])).unwrap();
        assert_eq!(
            tree.root(),
            &TreeNode::Leaf {
                symbol: b'A',
                weight: 4
            }
        );

        let codes = tree.code_table();
        assert_eq!(codes.len(), 1);
        assert!(codes.get(b'A').unwrap().is_empty());
    }

    #[test]
    fn single_leaf_decodes_without_reading() {
        let tree = HuffmanTree::build(&table(&[(b'A', 4)])).unwrap();
        let mut r = BitReader::new(std::io::empty());
        for _ in 0..4 {
            assert_eq!(tree.decode_symbol(&mut r).unwrap(), b'A');
        }
        assert_eq!(r.bits_read(), 0);
        assert!(!r.eof());
    }

    #[test]
    fn ties_break_by_byte_value() {
        let tree = HuffmanTree::build(&table(&[(b'c', 1), (b'a', 1), (b'b', 1)])).unwrap();
        let codes = tree.code_table();

        assert_eq!(code_str(&codes, b'c'), "0");
        assert_eq!(code_str(&codes, b'a'), "10");
        assert_eq!(code_str(&codes, b'b'), "11");
    }

    #[test]
    fn leaves_pop_before_equal_internal_nodes() {
        let tree = HuffmanTree::build(&table(&[(b'a', 1), (b'b', 1), (b'c', 2)])).unwrap();
        let codes = tree.code_table();

        assert_eq!(code_str(&codes, b'c'), "0");
        assert_eq!(code_str(&codes, b'a'), "10");
        assert_eq!(code_str(&codes, b'b'), "11");
    }

    #[test]
    fn optimal_cost() {
        let t = table(&[
            (b'a', 45),
            (b'b', 13),
            (b'c', 12),
            (b'd', 16),
            (b'e', 9),
            (b'f', 5),
        ]);
        let tree = HuffmanTree::build(&t).unwrap();
        check_shape(tree.root());

        assert_eq!(tree.weight(), 100);
        assert_eq!(tree.leaf_count(), 6);
        assert_eq!(tree.code_table().encoded_bits(&t), 224);
        assert_eq!(tree.code_table().get(b'a').unwrap().len(), 1);
    }

    #[test]
    fn deterministic_builds() {
        let t = FrequencyTable::from_bytes(b"abracadabra, said the wizard to the other wizard");

        let a = HuffmanTree::build(&t).unwrap();
        let b = HuffmanTree::build(&t.clone()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.code_table(), b.code_table());
    }

    #[test]
    fn prefix_free() {
        let t = FrequencyTable::from_bytes(b"the quick brown fox jumps over the lazy dog!!");
        let codes = HuffmanTree::build(&t).unwrap().code_table();
        assert_eq!(codes.len(), t.distinct());

        for (a, code_a) in codes.iter() {
            assert!(!code_a.is_empty());
            for (b, code_b) in codes.iter() {
                if a == b || code_b.len() > code_a.len() {
                    continue;
                }
                assert_ne!(&code_a[..code_b.len()], code_b, "{} has prefix {}", a, b);
            }
        }
    }

    #[test]
    fn decode_by_descent() {
        let tree = HuffmanTree::build(&table(&[(b'a', 1), (b'b', 1), (b'c', 2)])).unwrap();

        // c=0 a=10 b=11: "b c a c" packs to 11 0 10 0 + padding
        let bytes = [0b1101_0000u8];
        let mut r = BitReader::new(&bytes[..]);
        let decoded: Vec<u8> = (0..4).map(|_| tree.decode_symbol(&mut r).unwrap()).collect();
        assert_eq!(decoded, b"bcac");
        assert_eq!(r.bits_read(), 6);
    }

    #[test]
    fn decode_runs_out_of_bits() {
        let tree = HuffmanTree::build(&table(&[(b'a', 1), (b'b', 1), (b'c', 2)])).unwrap();
        let mut r = BitReader::new(std::io::empty());

        let err = tree.decode_symbol(&mut r).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedStream {
                stage: Stage::Payload
            }
        ));
    }

    #[test]
    fn serde_round_trip() {
        let t = FrequencyTable::from_bytes(b"mississippi river");
        let codes = HuffmanTree::build(&t).unwrap().code_table();

        let data = rmp_serde::to_vec(&SerializableCodeTable::from(&codes)).unwrap();
        let back: SerializableCodeTable = rmp_serde::from_slice(&data).unwrap();

        assert_eq!(CodeTable::from(back), codes);
    }
}
