//! Bit-granular reading and writing over byte streams.
//!
//! Bits are packed most-significant-bit first: the first bit written to a
//! byte lands in bit 7. Multi-bit fields are big-endian, so the highest-order
//! requested bit goes out first. Both sides do one `read`/`write` call per
//! byte, so wrap files in `BufReader`/`BufWriter`.

use crate::error::{Error, Result};
use bitvec::prelude::*;
use std::io::{self, Read, Write};

/// Reads a byte source one bit (or one `n`-bit field) at a time.
#[derive(Debug)]
pub struct BitReader<R> {
    inner: R,
    bitbuf: u8,
    // bits of `bitbuf` not yet handed out
    nbits: u8,
    eof: bool,
    failed: bool,
    bits_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bitbuf: 0,
            nbits: 0,
            eof: false,
            failed: false,
            bits_read: 0,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.failed = true;
                    return Err(Error::SourceFailure(e));
                }
            }
        }
    }

    /// Reads one bit. Returns `Ok(None)` and sets the end flag once the
    /// source has no more bytes.
    ///
    /// After a source error every further read fails without touching the
    /// source again.
    pub fn read_bit(&mut self) -> Result<Option<bool>> {
        if self.failed {
            return Err(Error::SourceFailure(io::Error::new(
                io::ErrorKind::Other,
                "bit reader is in a failed state",
            )));
        }

        if self.nbits == 0 {
            if self.eof {
                return Ok(None);
            }
            match self.next_byte()? {
                Some(byte) => {
                    self.bitbuf = byte;
                    self.nbits = 8;
                }
                None => {
                    self.eof = true;
                    return Ok(None);
                }
            }
        }

        self.nbits -= 1;
        self.bits_read += 1;
        Ok(Some((self.bitbuf >> self.nbits) & 1 == 1))
    }

    /// Reads `n` bits as a big-endian unsigned integer.
    ///
    /// If the source ends partway through, the bits read so far are returned
    /// and [`eof`](Self::eof) becomes true; check it before trusting the value.
    ///
    /// # Panics
    ///
    /// If `n` is greater than 64.
    pub fn read_bits(&mut self, n: u32) -> Result<u64> {
        assert!(n <= u64::BITS, "cannot read {} bits into a u64", n);

        let mut value = 0u64;
        for _ in 0..n {
            match self.read_bit()? {
                Some(bit) => value = (value << 1) | u64::from(bit),
                None => break,
            }
        }

        Ok(value)
    }

    /// True once a read has been attempted past the end of the source.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// False after end-of-input or a source error.
    pub fn good(&self) -> bool {
        !self.eof && !self.failed
    }

    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes bits into a byte sink, padding the last partial byte with zeros.
///
/// Call [`finish`](Self::finish) to flush and get the sink back along with any
/// error. Dropping the writer also pads and flushes, but swallows errors.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: Option<W>,
    bitbuf: u8,
    nbits: u8,
    failed: bool,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Some(inner),
            bitbuf: 0,
            nbits: 0,
            failed: false,
            bits_written: 0,
        }
    }

    fn failed_error() -> Error {
        Error::SinkFailure(io::Error::new(
            io::ErrorKind::Other,
            "bit writer is in a failed state",
        ))
    }

    // Writes out the buffered bits, left-aligned, as one byte.
    fn write_out(&mut self) -> Result<()> {
        if self.nbits == 0 {
            return Ok(());
        }

        let byte = self.bitbuf << (8 - self.nbits);
        self.bitbuf = 0;
        self.nbits = 0;

        let inner = match self.inner.as_mut() {
            Some(inner) => inner,
            None => return Err(Self::failed_error()),
        };
        inner.write_all(&[byte]).map_err(|e| {
            self.failed = true;
            Error::SinkFailure(e)
        })
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if self.failed {
            return Err(Self::failed_error());
        }

        self.bitbuf = (self.bitbuf << 1) | u8::from(bit);
        self.nbits += 1;
        self.bits_written += 1;

        if self.nbits == 8 {
            self.write_out()?;
        }

        Ok(())
    }

    /// Writes the low `n` bits of `value`, highest-order bit first.
    ///
    /// ```
    /// # use huffpuff::BitWriter;
    /// let mut w = BitWriter::new(Vec::new());
    /// w.write_bits(22u8, 5).unwrap(); // 10110
    /// assert_eq!(w.finish().unwrap(), vec![0b1011_0000]);
    /// ```
    ///
    /// # Panics
    ///
    /// If `n` is wider than `T`.
    pub fn write_bits<T: Into<u64>>(&mut self, value: T, n: u32) -> Result<()> {
        let width = (std::mem::size_of::<T>() * 8) as u32;
        assert!(n <= width, "cannot write {} bits of a {}-bit value", n, width);

        let value = value.into();
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 == 1)?;
        }

        Ok(())
    }

    /// Writes every bit of a prefix code in order.
    pub fn write_code(&mut self, code: &BitSlice<u8, Msb0>) -> Result<()> {
        for bit in code.iter().by_vals() {
            self.write_bit(bit)?;
        }

        Ok(())
    }

    /// False once the sink has reported a failure.
    pub fn good(&self) -> bool {
        !self.failed
    }

    /// Bits accepted so far, not counting padding.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Pads and writes the trailing partial byte, flushes, and returns the sink.
    pub fn finish(mut self) -> Result<W> {
        if self.failed {
            return Err(Self::failed_error());
        }

        self.write_out()?;
        if let Some(inner) = self.inner.as_mut() {
            if let Err(e) = inner.flush() {
                self.failed = true;
                return Err(Error::SinkFailure(e));
            }
        }

        self.inner.take().ok_or_else(Self::failed_error)
    }
}

impl<W: Write> Drop for BitWriter<W> {
    fn drop(&mut self) {
        if self.inner.is_some() && !self.failed {
            let _ = self.write_out();
            if let Some(inner) = self.inner.as_mut() {
                let _ = inner.flush();
            }
        }
    }
}
