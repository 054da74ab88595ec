//! Gepufferte Byte-Quelle für den Decoder.
//!
//! [`ByteCursor`] liest aus einem beliebigen `io::Read` in einen wachsenden Puffer.
//! Bereits konsumierte Bytes werden nur beim Nachladen verworfen (kompaktiert).
//! Bereiche, die [`ByteSource::take`] liefert, sind gültig bis zum nächsten
//! Nachladen, d.h. sie überleben jedes `read`/`peek`, das aus dem Puffer bedient
//! werden kann. Ob ein Nachladen bevorsteht, verrät [`ByteSource::buffered`].

use std::io::{self, Read};
use std::ops::Range;

use crate::{Error, Result};

/// Default read chunk size.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Byte-level access used by the decoder state machine.
pub trait ByteSource {
    /// Consumes the next byte.
    fn read(&mut self) -> Result<u8>;

    /// Returns the next byte without consuming it.
    fn peek(&mut self) -> Result<u8>;

    /// Returns the byte after [`peek`](Self::peek) without consuming either.
    fn peek2(&mut self) -> Result<u8>;

    /// Like [`peek`](Self::peek), but `None` at a clean end of input.
    fn try_peek(&mut self) -> Result<Option<u8>>;

    /// Consumes `n` bytes and returns their range in the internal buffer.
    fn take(&mut self, n: usize) -> Result<Range<usize>>;

    /// Resolves a range returned by [`take`](Self::take).
    ///
    /// # Panics
    ///
    /// Panics wenn `range` nicht mehr im Puffer liegt (nach einem Nachladen).
    fn slice(&self, range: Range<usize>) -> &[u8];

    /// Number of unread bytes that can be served without touching the reader.
    fn buffered(&self) -> usize;

    /// Absolute stream position of the next unread byte.
    fn position(&self) -> u64;

    /// Consumes a big-endian `u32`.
    fn read_u32(&mut self) -> Result<u32> {
        let mut v = 0u32;
        for _ in 0..4 {
            v = (v << 8) | u32::from(self.read()?);
        }
        Ok(v)
    }
}

/// [`ByteSource`] over any `io::Read`.
pub struct ByteCursor<R> {
    reader: R,
    buf: Vec<u8>,
    /// Nächstes ungelesenes Byte in `buf`.
    pos: usize,
    /// Ende der gültigen Daten in `buf`.
    end: usize,
    /// Bytes, die vor `buf[0]` bereits konsumiert und verworfen wurden.
    discarded: u64,
    chunk_size: usize,
    eof: bool,
}

impl<R: Read> ByteCursor<R> {
    /// Creates a cursor with [`DEFAULT_BUFFER_SIZE`].
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE)
    }

    /// Creates a cursor that reads `chunk_size` bytes at a time.
    pub fn with_capacity(reader: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(16);
        Self {
            reader,
            buf: Vec::with_capacity(chunk_size),
            pos: 0,
            end: 0,
            discarded: 0,
            chunk_size,
            eof: false,
        }
    }

    /// Returns the underlying reader, dropping buffered bytes.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Ensures at least `need` unread bytes are buffered.
    ///
    /// Returns `false` if the reader ended before that.
    fn fill(&mut self, need: usize) -> Result<bool> {
        if self.end - self.pos >= need {
            return Ok(true);
        }
        if self.eof {
            return Ok(false);
        }
        // Konsumierte Bytes verwerfen
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.end, 0);
            self.discarded += self.pos as u64;
            self.end -= self.pos;
            self.pos = 0;
        }
        while self.end < need {
            // Wächst nur mit tatsächlich gelesenen Daten, eine große Länge
            // im Input allokiert also nicht im Voraus.
            if self.buf.len() == self.end {
                let grow = self.chunk_size.max(self.end).min(need - self.end).max(self.chunk_size);
                self.buf.resize(self.end + grow, 0);
            }
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => self.end += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from(e)),
            }
        }
        Ok(true)
    }
}

impl<R: Read> ByteSource for ByteCursor<R> {
    #[inline]
    fn read(&mut self) -> Result<u8> {
        if self.pos == self.end && !self.fill(1)? {
            return Err(Error::UnexpectedEndOfInput);
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    #[inline]
    fn peek(&mut self) -> Result<u8> {
        self.try_peek()?.ok_or(Error::UnexpectedEndOfInput)
    }

    fn peek2(&mut self) -> Result<u8> {
        if !self.fill(2)? {
            return Err(Error::UnexpectedEndOfInput);
        }
        Ok(self.buf[self.pos + 1])
    }

    #[inline]
    fn try_peek(&mut self) -> Result<Option<u8>> {
        if self.pos == self.end && !self.fill(1)? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.pos]))
    }

    fn take(&mut self, n: usize) -> Result<Range<usize>> {
        if !self.fill(n)? {
            return Err(Error::UnexpectedEndOfInput);
        }
        let start = self.pos;
        self.pos += n;
        Ok(start..self.pos)
    }

    #[inline]
    fn slice(&self, range: Range<usize>) -> &[u8] {
        &self.buf[range]
    }

    #[inline]
    fn buffered(&self) -> usize {
        self.end - self.pos
    }

    fn position(&self) -> u64 {
        self.discarded + self.pos as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Liefert pro `read()` höchstens ein Byte, um Nachladen zu erzwingen.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            match self.0.split_first() {
                Some((&b, rest)) if !out.is_empty() => {
                    out[0] = b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn read_and_peek() {
        let mut c = ByteCursor::new(&[1u8, 2, 3][..]);
        assert_eq!(c.peek().unwrap(), 1);
        assert_eq!(c.peek2().unwrap(), 2);
        assert_eq!(c.read().unwrap(), 1);
        assert_eq!(c.read().unwrap(), 2);
        assert_eq!(c.position(), 2);
        assert_eq!(c.read().unwrap(), 3);
        assert_eq!(c.try_peek().unwrap(), None);
        assert_eq!(c.read().unwrap_err(), Error::UnexpectedEndOfInput);
    }

    #[test]
    fn peek2_across_refill() {
        let data = [0xAAu8, 0xBB, 0xCC];
        let mut c = ByteCursor::with_capacity(Trickle(&data), 16);
        assert_eq!(c.read().unwrap(), 0xAA);
        assert_eq!(c.peek2().unwrap(), 0xCC);
        assert_eq!(c.read().unwrap(), 0xBB);
        assert_eq!(c.peek2().unwrap_err(), Error::UnexpectedEndOfInput);
    }

    #[test]
    fn take_larger_than_chunk() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut c = ByteCursor::with_capacity(Trickle(&data), 16);
        c.read().unwrap();
        let r = c.take(60).unwrap();
        assert_eq!(c.slice(r), &data[1..61]);
        assert_eq!(c.position(), 61);
        assert!(c.take(40).is_err());
    }

    /// Ein Bereich bleibt gültig, solange aus dem Puffer gelesen werden kann.
    #[test]
    fn range_survives_buffered_reads() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut c = ByteCursor::new(&data[..]);
        let r = c.take(2).unwrap();
        assert!(c.buffered() >= 2);
        c.peek2().unwrap();
        c.read().unwrap();
        assert_eq!(c.slice(r), &[1, 2]);
    }

    #[test]
    fn read_u32_big_endian() {
        let mut c = ByteCursor::new(&[0x00u8, 0x01, 0x02, 0x03][..]);
        assert_eq!(c.read_u32().unwrap(), 0x0001_0203);
    }

    #[test]
    fn io_error_is_transport_failure() {
        let mut c = ByteCursor::new(Broken);
        match c.read().unwrap_err() {
            Error::Transport { kind, message } => {
                assert_eq!(kind, io::ErrorKind::BrokenPipe);
                assert!(message.contains("pipe closed"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
