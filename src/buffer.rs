//! C2 — the byte buffer / line framer.
//!
//! Owned exclusively by the chunk driver and reused across chunks. The
//! invariant it maintains is: every slice handed back to a caller ends
//! on a line terminator (LF, CR, or CR+LF), and that terminator sits
//! within the packed-token addressable range (`token::MAX_CHUNK_LEN`).

use std::io::Read;

use crate::error::{ReadError, ReadResult};
use crate::token::MAX_CHUNK_LEN;

/// Returned by `ChunkBuffer::frame`/`extend` when the source produced
/// no bytes at all (a genuinely empty stream).
pub const NO_DATA: usize = usize::MAX;

/// Returned when the source has already hit EOF once (the synthetic
/// terminator was already appended) and is asked for still more bytes
/// -- the caller asked because a quoted field never closed, and
/// there's truly nothing left to give it.
pub const EOF_AGAIN: usize = usize::MAX - 1;

pub struct ChunkBuffer {
    data: Vec<u8>,
    filled: usize,
    hard_limit: u64,
    synthesized_eof: bool,
}

impl ChunkBuffer {
    pub fn new(initial_cap: usize, hard_limit: u64) -> Self {
        ChunkBuffer {
            data: vec![0u8; initial_cap.max(64)],
            filled: 0,
            hard_limit: hard_limit.min(MAX_CHUNK_LEN),
            synthesized_eof: false,
        }
    }

    #[inline]
    pub fn filled_len(&self) -> usize {
        self.filled
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.filled]
    }

    /// Fill the buffer (growing as needed) until a line terminator is
    /// found anywhere in the filled region, or EOF. Returns the index
    /// of the terminator's last byte, or [`NO_DATA`] if the source was
    /// empty from the start.
    pub fn frame(&mut self, source: &mut dyn Read, synth_eol: u8) -> ReadResult<usize> {
        self.frame_from(source, synth_eol, 0)
    }

    /// Like `frame`, but ignores any terminator at or before
    /// `search_from` -- used when the record scanner discovers that an
    /// already-returned terminator actually sat inside an open quoted
    /// field, and more bytes are needed to find the real one.
    pub fn extend(
        &mut self,
        source: &mut dyn Read,
        synth_eol: u8,
        search_from: usize,
    ) -> ReadResult<usize> {
        self.frame_from(source, synth_eol, search_from)
    }

    fn frame_from(
        &mut self,
        source: &mut dyn Read,
        synth_eol: u8,
        search_from: usize,
    ) -> ReadResult<usize> {
        loop {
            if self.filled > search_from {
                if let Some(end) = find_terminator(&self.data[search_from..self.filled]) {
                    return Ok(search_from + end);
                }
            }

            if self.filled < self.data.len() {
                let n = source.read(&mut self.data[self.filled..])?;
                if n == 0 {
                    if self.filled == 0 {
                        return Ok(NO_DATA);
                    }
                    if self.synthesized_eof {
                        return Ok(EOF_AGAIN);
                    }
                    self.ensure_margin(1)?;
                    self.data[self.filled] = synth_eol;
                    self.filled += 1;
                    self.synthesized_eof = true;
                    return Ok(self.filled - 1);
                }
                self.filled += n;
                continue;
            }

            self.grow()?;
        }
    }

    /// Drop the first `n` bytes (already fully scanned), shifting the
    /// remainder to the front. Only shifts when forced to -- the
    /// scanner only calls this between chunks.
    pub fn consume(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        debug_assert!(n <= self.filled);
        self.data.copy_within(n..self.filled, 0);
        self.filled -= n;
    }

    fn ensure_margin(&mut self, extra: usize) -> ReadResult<()> {
        if self.filled + extra > self.data.len() {
            self.grow()?;
        }
        Ok(())
    }

    fn grow(&mut self) -> ReadResult<()> {
        let new_cap = (self.data.len() as u64) * 2;
        if new_cap - 1 > self.hard_limit {
            return Err(ReadError::LineTooLong);
        }
        self.data.resize(new_cap as usize, 0);
        Ok(())
    }
}

/// Scan `slice` from the end for the rightmost line terminator. LF and
/// CR are both recognized, and a lone trailing CR (where we don't yet
/// know whether an LF follows) is reported as "not found" so the
/// caller pulls one more byte before committing.
fn find_terminator(slice: &[u8]) -> Option<usize> {
    let lf = memchr::memrchr(b'\n', slice);
    let cr = memchr::memrchr(b'\r', slice);

    match (lf, cr) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(c)) => {
            if c == slice.len() - 1 {
                None // ambiguous: need the next byte to rule out CRLF
            } else {
                Some(c)
            }
        },
        (Some(l), Some(c)) => {
            if l > c {
                Some(l)
            } else if c == slice.len() - 1 {
                None
            } else {
                Some(c)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn frame_on_simple_lf() {
        let mut src = Cursor::new(b"a,b\nc,d\n".to_vec());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let end = buf.frame(&mut src, b'\n').unwrap();
        assert_eq!(&buf.bytes()[..=end], b"a,b\nc,d\n");
    }

    #[test]
    fn frame_synthesizes_missing_trailing_newline() {
        let mut src = Cursor::new(b"a,b".to_vec());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let end = buf.frame(&mut src, b'\n').unwrap();
        assert_eq!(&buf.bytes()[..=end], b"a,b\n");
    }

    #[test]
    fn frame_handles_lone_cr() {
        let mut src = Cursor::new(b"a,b\rc,d\r".to_vec());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let end = buf.frame(&mut src, b'\n').unwrap();
        // rightmost terminator is the trailing \r; it is the last byte so
        // the framer must pull one more (EOF) byte before committing, then
        // synthesizes nothing extra since EOF confirms it's a lone CR.
        assert_eq!(buf.bytes()[end], b'\r');
    }

    #[test]
    fn frame_handles_crlf() {
        let mut src = Cursor::new(b"a,b\r\nc,d\r\n".to_vec());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let end = buf.frame(&mut src, b'\n').unwrap();
        assert_eq!(&buf.bytes()[..=end], b"a,b\r\nc,d\r\n");
    }

    #[test]
    fn empty_source_reports_no_data() {
        let mut src = Cursor::new(Vec::new());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let end = buf.frame(&mut src, b'\n').unwrap();
        assert_eq!(end, NO_DATA);
    }

    #[test]
    fn grows_past_initial_capacity_for_long_lines() {
        let long_field = "x".repeat(200);
        let mut contents = long_field.clone();
        contents.push('\n');
        let mut src = Cursor::new(contents.clone().into_bytes());
        let mut buf = ChunkBuffer::new(16, 1 << 20);
        let end = buf.frame(&mut src, b'\n').unwrap();
        assert_eq!(&buf.bytes()[..=end], contents.as_bytes());
    }

    #[test]
    fn line_too_long_past_hard_limit() {
        let mut contents = vec![b'x'; 200];
        contents.push(b'\n');
        let mut src = Cursor::new(contents);
        let mut buf = ChunkBuffer::new(16, 64);
        let err = buf.frame(&mut src, b'\n').unwrap_err();
        assert!(matches!(err, ReadError::LineTooLong));
    }

    #[test]
    fn consume_shifts_remaining_bytes_to_front() {
        let mut src = Cursor::new(b"a\nbb\n".to_vec());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let end = buf.frame(&mut src, b'\n').unwrap();
        assert_eq!(&buf.bytes()[..=end], b"a\nbb\n");
        buf.consume(2); // drop "a\n"
        assert_eq!(buf.bytes(), b"bb\n");
    }

    #[test]
    fn extend_past_true_eof_reports_eof_again() {
        let mut src = Cursor::new(b"\"unterminated".to_vec());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let first = buf.frame(&mut src, b'\n').unwrap();
        assert_ne!(first, NO_DATA);
        let second = buf.extend(&mut src, b'\n', buf.filled_len()).unwrap();
        assert_eq!(second, EOF_AGAIN);
    }

    #[test]
    fn extend_searches_past_a_false_boundary() {
        // Simulates a quoted multi-line field: the scanner found a \n
        // inside quotes at index 4 and needs the buffer to keep going
        // until the real terminator past it.
        let mut src = Cursor::new(b"\"a\nb\",c\n".to_vec());
        let mut buf = ChunkBuffer::new(64, 1 << 20);
        let first = buf.frame(&mut src, b'\n').unwrap();
        assert_eq!(first, 2); // the \n inside the quotes
        let real = buf.extend(&mut src, b'\n', first + 1).unwrap();
        assert_eq!(&buf.bytes()[..=real], b"\"a\nb\",c\n");
    }
}
