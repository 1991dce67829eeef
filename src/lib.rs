//! Byte-oriented Huffman compression.
//!
//! [`encode`] counts the input bytes, builds a [`HuffmanTree`] from the
//! counts, and writes the counts followed by the bit-packed codes. [`decode`]
//! reads the counts back, rebuilds the same tree, and walks it once per
//! symbol.
//!
//! ```
//! let packed = huffpuff::compress(b"Hello, world!").unwrap();
//! assert_eq!(huffpuff::decompress(&packed).unwrap(), b"Hello, world!");
//! ```

mod bit_io;
mod codec;
mod error;
mod frequency;
mod tree;

pub use bit_io::{BitReader, BitWriter};
pub use codec::{compress, decode, decompress, encode, Header, COUNT_WIDTH, HEADER_BITS};
pub use error::{Error, Result, Stage};
pub use frequency::{FrequencyTable, SerializableFrequencyTable, ALPHABET_SIZE};
pub use tree::{Code, CodeTable, HuffmanTree, SerializableCodeTable, TreeNode};
