//! Whole-stream encode and decode.
//!
//! Layout of a compressed stream:
//!
//! 1. 256 counts, one per byte value in order 0..=255, each a big-endian
//!    [`COUNT_WIDTH`]-bit unsigned integer.
//! 2. The symbol count `N`, same width.
//! 3. The prefix code of each of the `N` input bytes, MSB-first, with the last
//!    byte zero-padded.

use crate::bit_io::{BitReader, BitWriter};
use crate::error::{Error, Result, Stage};
use crate::frequency::{FrequencyTable, ALPHABET_SIZE};
use crate::tree::HuffmanTree;
use std::io::{Read, Write};

/// Bits per header field.
pub const COUNT_WIDTH: u32 = 64;

/// Size of the header in bits.
pub const HEADER_BITS: u64 = (ALPHABET_SIZE as u64 + 1) * COUNT_WIDTH as u64;

const OUTPUT_CHUNK: usize = 8 * 1024;

/// Everything the decoder needs to rebuild the encoder's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub table: FrequencyTable,
    pub symbol_count: u64,
}

impl Header {
    pub fn write_to<W: Write>(&self, out: &mut BitWriter<W>) -> Result<()> {
        for &count in self.table.counts() {
            out.write_bits(count, COUNT_WIDTH)?;
        }
        out.write_bits(self.symbol_count, COUNT_WIDTH)
    }

    pub fn read_from<R: Read>(input: &mut BitReader<R>) -> Result<Self> {
        fn read_field<R: Read>(input: &mut BitReader<R>) -> Result<u64> {
            let value = input.read_bits(COUNT_WIDTH)?;
            if input.eof() {
                return Err(Error::TruncatedStream {
                    stage: Stage::Header,
                });
            }
            Ok(value)
        }

        let mut counts = [0u64; ALPHABET_SIZE];
        for count in counts.iter_mut() {
            *count = read_field(input)?;
        }
        let symbol_count = read_field(input)?;

        Ok(Self {
            table: FrequencyTable::from_counts(counts),
            symbol_count,
        })
    }
}

/// Compresses everything readable from `input` into `output` and returns the
/// sink once the last byte is flushed.
///
/// The input is buffered in memory, since it is needed once to count and once
/// more to emit codes.
pub fn encode<R: Read, W: Write>(mut input: R, output: W) -> Result<W> {
    let mut data = Vec::new();
    input
        .read_to_end(&mut data)
        .map_err(Error::SourceFailure)?;

    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    let table = FrequencyTable::from_bytes(&data);
    log::trace!("Byte frequency: {:?}", table);

    let tree = HuffmanTree::build(&table)?;
    let codes = tree.code_table();

    let header = Header {
        table,
        symbol_count: data.len() as u64,
    };

    let mut out = BitWriter::new(output);
    header.write_to(&mut out)?;

    for &byte in &data {
        // every counted byte is a leaf, so a missing code means no alphabet
        let code = codes.get(byte).ok_or(Error::EmptyAlphabet)?;
        out.write_code(code)?;
    }

    log::debug!(
        "encoded {} bytes, {} distinct, {} payload bits",
        header.symbol_count,
        codes.len(),
        out.bits_written() - HEADER_BITS
    );

    out.finish()
}

/// Decodes a compressed stream from `input` into `output`.
///
/// Exactly `N` symbols are produced; padding after the last code is never
/// looked at.
pub fn decode<R: Read, W: Write>(input: R, mut output: W) -> Result<W> {
    let mut reader = BitReader::new(input);
    let header = Header::read_from(&mut reader)?;

    if header.table.is_empty() {
        return Err(Error::EmptyAlphabet);
    }

    let total = header.table.checked_total().ok_or(Error::CountOverflow)?;
    if total != header.symbol_count {
        return Err(Error::InconsistentHeader {
            declared: header.symbol_count,
            total,
        });
    }

    let tree = HuffmanTree::build(&header.table)?;

    let mut buf = Vec::with_capacity(OUTPUT_CHUNK);
    for _ in 0..header.symbol_count {
        buf.push(tree.decode_symbol(&mut reader)?);
        if buf.len() == OUTPUT_CHUNK {
            output.write_all(&buf).map_err(Error::SinkFailure)?;
            buf.clear();
        }
    }

    output.write_all(&buf).map_err(Error::SinkFailure)?;
    output.flush().map_err(Error::SinkFailure)?;

    log::debug!(
        "decoded {} bytes from {} payload bits",
        header.symbol_count,
        reader.bits_read() - HEADER_BITS
    );

    Ok(output)
}

/// [`encode`] from a slice into a new buffer.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    encode(bytes, Vec::new())
}

/// [`decode`] from a slice into a new buffer.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    decode(bytes, Vec::new())
}
