//! C3 — the header scanner.
//!
//! Unlike the record scanner, a header field is always either a plain
//! string or a quoted string -- there is no shape classification, no
//! `NA` sentinel, and no column-count policy (the header *defines*
//! `ncols`, it can't violate it). A quoted field spanning multiple
//! physical lines is fatal here, where it's legal continuation for a
//! data row: a column name is meant to be read at a glance.

use crate::error::{ReadError, ReadResult};
use crate::options::DlmParseOptions;
use crate::scan::bytes::{eol_len_at, scan_line_extent};

pub enum HeaderOutcome {
    NeedMore,
    Skipped { next_pos: usize },
    Row { next_pos: usize, names: Vec<String> },
}

pub fn scan_header(buf: &[u8], pos: usize, opts: &DlmParseOptions, line_no: u64) -> ReadResult<HeaderOutcome> {
    if let Some(prefix) = &opts.comment_prefix {
        if buf[pos..].starts_with(prefix.as_bytes()) {
            return match scan_line_extent(buf, pos) {
                Some((_, next_pos)) => Ok(HeaderOutcome::Skipped { next_pos }),
                None => Ok(HeaderOutcome::NeedMore),
            };
        }
    }
    if opts.skipblank {
        if let Some((content_end, next_pos)) = scan_line_extent(buf, pos) {
            if buf[pos..content_end].iter().all(|&b| b == b' ') {
                return Ok(HeaderOutcome::Skipped { next_pos });
            }
        } else {
            return Ok(HeaderOutcome::NeedMore);
        }
    }

    let mut names = Vec::new();
    let mut cursor = pos;

    loop {
        match scan_one_header_field(buf, cursor, opts, line_no, names.len())? {
            HeaderFieldOutcome::NeedMore => return Ok(HeaderOutcome::NeedMore),
            HeaderFieldOutcome::Done { name, next_pos, at_eol } => {
                names.push(name);
                cursor = next_pos;
                if at_eol {
                    return Ok(HeaderOutcome::Row { next_pos: cursor, names });
                }
            },
        }
    }
}

enum HeaderFieldOutcome {
    NeedMore,
    Done { name: String, next_pos: usize, at_eol: bool },
}

fn scan_one_header_field(
    buf: &[u8],
    start_pos: usize,
    opts: &DlmParseOptions,
    line_no: u64,
    col: usize,
) -> ReadResult<HeaderFieldOutcome> {
    let delim = opts.separator.expect("separator must be resolved before scanning");
    let mut pos = start_pos;
    if opts.trim {
        while buf.get(pos) == Some(&b' ') {
            pos += 1;
        }
    }

    if let Some(q) = opts.quote_char {
        if buf.get(pos) == Some(&q) {
            return scan_quoted_header_field(buf, pos, q, delim, opts.trim, line_no, col);
        }
    }

    let mut i = pos;
    loop {
        match buf.get(i) {
            None => return Ok(HeaderFieldOutcome::NeedMore),
            Some(&b) if b == delim => break,
            Some(_) if eol_len_at(buf, i).is_some() => break,
            Some(_) => i += 1,
        }
    }

    let mut content_end = i;
    if opts.trim {
        while content_end > pos && buf[content_end - 1] == b' ' {
            content_end -= 1;
        }
    }
    let content = &buf[pos..content_end];
    validate_utf8(content, line_no, col)?;
    let name = String::from_utf8_lossy(content).into_owned();

    if buf[i] == delim {
        Ok(HeaderFieldOutcome::Done { name, next_pos: i + 1, at_eol: false })
    } else {
        let len = eol_len_at(buf, i).expect("loop only stops at delim or eol");
        Ok(HeaderFieldOutcome::Done { name, next_pos: i + len, at_eol: true })
    }
}

fn scan_quoted_header_field(
    buf: &[u8],
    pos: usize,
    quote: u8,
    delim: u8,
    trim: bool,
    line_no: u64,
    col: usize,
) -> ReadResult<HeaderFieldOutcome> {
    let mut i = pos + 1;
    loop {
        match buf.get(i) {
            None => return Ok(HeaderFieldOutcome::NeedMore),
            Some(&b'\n') | Some(&b'\r') => {
                return Err(ReadError::InvalidByteInField { line: line_no, column: col, byte: buf[i] });
            },
            Some(&b) if b == quote => match buf.get(i + 1) {
                Some(&next) if next == quote => i += 2,
                Some(_) => {
                    i += 1;
                    break;
                },
                None => return Ok(HeaderFieldOutcome::NeedMore),
            },
            Some(_) => i += 1,
        }
    }

    let inner_start = pos + 1;
    let inner_len = (i - 1).saturating_sub(inner_start);

    if trim {
        while buf.get(i) == Some(&b' ') {
            i += 1;
        }
    }

    let raw = &buf[inner_start..inner_start + inner_len];
    validate_utf8(raw, line_no, col)?;
    let name = unescape_doubled_quotes(raw, quote);

    if buf.get(i) == Some(&delim) {
        Ok(HeaderFieldOutcome::Done { name, next_pos: i + 1, at_eol: false })
    } else {
        match eol_len_at(buf, i) {
            Some(len) => Ok(HeaderFieldOutcome::Done { name, next_pos: i + len, at_eol: true }),
            None => Ok(HeaderFieldOutcome::NeedMore),
        }
    }
}

fn unescape_doubled_quotes(bytes: &[u8], quote: u8) -> String {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == quote && bytes.get(i + 1) == Some(&quote) {
            out.push(quote);
            i += 2;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn validate_utf8(bytes: &[u8], line_no: u64, col: usize) -> ReadResult<()> {
    simdutf8::basic::from_utf8(bytes)
        .map(|_| ())
        .map_err(|_| {
            let bad = bytes.iter().find(|&&b| b >= 0x80).copied().unwrap_or(0);
            ReadError::InvalidByteInField { line: line_no, column: col, byte: bad }
        })
}
