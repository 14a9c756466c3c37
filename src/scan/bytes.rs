//! Low-level byte helpers shared by the record and header scanners.
//!
//! These assume the slice they're given always ends on a resolved line
//! terminator -- the chunk driver only ever hands the scanners a frame
//! that `buffer::ChunkBuffer::frame`/`extend` has already confirmed
//! ends that way, so a lone `\r` at the very end of `buf` is always the
//! real terminator, never an ambiguous one.

/// If `buf[pos]` begins a line terminator, returns its length (1 for
/// `\n` or a lone `\r`, 2 for `\r\n`).
#[inline]
pub fn eol_len_at(buf: &[u8], pos: usize) -> Option<usize> {
    match buf.get(pos) {
        Some(b'\n') => Some(1),
        Some(b'\r') => {
            if buf.get(pos + 1) == Some(&b'\n') {
                Some(2)
            } else {
                Some(1)
            }
        },
        _ => None,
    }
}

/// Find the next line terminator at or after `from`, returning
/// `(content_end, next_pos)` where `content_end` is the index of the
/// first terminator byte and `next_pos` is the index right after it.
pub fn scan_line_extent(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let rel = memchr::memchr2(b'\n', b'\r', &buf[from..])?;
    let at = from + rel;
    let len = eol_len_at(buf, at)?;
    Some((at, at + len))
}
