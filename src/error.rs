//! Error types for encoding and decoding.

use std::io;

/// Which part of a compressed stream was being read when it ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Header,
    Payload,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Header => f.write_str("header"),
            Stage::Payload => f.write_str("payload"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `encode` was given a source with no bytes in it.
    #[error("input is empty, nothing to encode")]
    EmptyInput,

    /// A tree was requested from a table with no nonzero counts.
    #[error("frequency table has no symbols")]
    EmptyAlphabet,

    /// The compressed stream ended before it was fully read.
    #[error("compressed stream truncated in {stage}")]
    TruncatedStream { stage: Stage },

    /// The byte sink failed. The writer stays failed afterwards.
    #[error("write to sink failed: {0}")]
    SinkFailure(#[source] io::Error),

    /// The byte source failed with something other than end-of-input.
    #[error("read from source failed: {0}")]
    SourceFailure(#[source] io::Error),

    /// The header's symbol count disagrees with its frequency table.
    #[error("header declares {declared} symbols but its counts sum to {total}")]
    InconsistentHeader { declared: u64, total: u64 },

    /// The counts of a frequency table do not fit in 64 bits when summed.
    #[error("frequency counts overflow a 64-bit total")]
    CountOverflow,

    /// A serialized frequency table had the wrong number of slots.
    #[error("frequency table has {0} slots, expected 256")]
    TableLength(usize),
}

impl Error {
    /// Returns true if the stream was cut short, as opposed to an I/O failure.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::TruncatedStream { .. })
    }

    /// Returns true if the underlying reader or writer failed.
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::SinkFailure(_) | Error::SourceFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
