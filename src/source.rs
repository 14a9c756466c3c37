//! X1 — the source abstraction the framer pulls bytes from.
//!
//! The original spec treats "source acquisition" as an external
//! collaborator specified only by the interface the core consumes.
//! This module is that interface plus the one concrete implementation
//! this crate owns: a buffered local file. A caller that wants to feed
//! subprocess stdout or an HTTP body through the reader implements
//! `Source` for it themselves; this crate does not shell out or make
//! network calls.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes-in abstraction the framer (`buffer.rs`) pulls from.
///
/// `peek6` must not consume bytes that a later `read` would otherwise
/// return -- it exists solely so the compression dispatch (§6) can
/// sniff a magic number before any record scanning starts.
pub trait Source: Read {
    /// Look at (without consuming) the first up to 6 bytes of the
    /// stream. Returns fewer than 6 bytes only if the source has fewer
    /// than 6 bytes total.
    fn peek6(&mut self) -> io::Result<Vec<u8>>;
}

/// A `std::fs::File` wrapped with a small front ring so `peek6` can be
/// satisfied without discarding bytes the framer hasn't consumed yet.
pub struct FileSource {
    file: File,
    peeked: Vec<u8>,
    peeked_pos: usize,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(FileSource {
            file: File::open(path)?,
            peeked: Vec::new(),
            peeked_pos: 0,
        })
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.peeked.len() - self.peeked_pos;
        if remaining > 0 {
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.peeked[self.peeked_pos..self.peeked_pos + n]);
            self.peeked_pos += n;
            if self.peeked_pos == self.peeked.len() {
                self.peeked.clear();
                self.peeked_pos = 0;
            }
            return Ok(n);
        }
        self.file.read(buf)
    }
}

impl Source for FileSource {
    fn peek6(&mut self) -> io::Result<Vec<u8>> {
        if self.peeked_pos != 0 {
            self.peeked.drain(..self.peeked_pos);
            self.peeked_pos = 0;
        }
        while self.peeked.len() < 6 {
            let mut tmp = [0u8; 6];
            let n = self.file.read(&mut tmp[..6 - self.peeked.len()])?;
            if n == 0 {
                break;
            }
            self.peeked.extend_from_slice(&tmp[..n]);
        }
        Ok(self.peeked.clone())
    }
}

/// A generic adapter giving `peek6` to any `Read` that doesn't
/// natively support it, matching the spec's instruction that "if
/// unavailable, the driver MUST wrap the source in a small buffered
/// adapter".
pub struct PeekableSource<R: Read> {
    inner: R,
    peeked: Vec<u8>,
    peeked_pos: usize,
}

impl<R: Read> PeekableSource<R> {
    pub fn new(inner: R) -> Self {
        PeekableSource {
            inner,
            peeked: Vec::new(),
            peeked_pos: 0,
        }
    }
}

impl<R: Read> Read for PeekableSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.peeked.len() - self.peeked_pos;
        if remaining > 0 {
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.peeked[self.peeked_pos..self.peeked_pos + n]);
            self.peeked_pos += n;
            if self.peeked_pos == self.peeked.len() {
                self.peeked.clear();
                self.peeked_pos = 0;
            }
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

impl<R: Read> Source for PeekableSource<R> {
    fn peek6(&mut self) -> io::Result<Vec<u8>> {
        if self.peeked_pos != 0 {
            self.peeked.drain(..self.peeked_pos);
            self.peeked_pos = 0;
        }
        while self.peeked.len() < 6 {
            let mut tmp = [0u8; 6];
            let n = self.inner.read(&mut tmp[..6 - self.peeked.len()])?;
            if n == 0 {
                break;
            }
            self.peeked.extend_from_slice(&tmp[..n]);
        }
        Ok(self.peeked.clone())
    }
}
