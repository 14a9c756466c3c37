//! C9 — pre-processing: the policy layer that runs before the header
//! and first data chunk are scanned. Delimiter guessing, the leading
//! `skip` lines, and column-name normalization/deduplication all live
//! here rather than in the scanner, which only knows about one already
//! -chosen delimiter and a fixed set of column names.

use crate::scan::bytes::scan_line_extent;

/// Delimiters considered during guessing, in the order §4.9 names them;
/// ties in raw count resolve in this order.
const CANDIDATES: &[u8] = &[b',', b'\t', b'|', b';', b':'];

/// Guess a single-byte delimiter (§4.9): count each candidate's raw
/// occurrences up to the first newline, pick the most frequent, ties
/// resolved by `CANDIDATES` order. Falls back to `,` if every candidate
/// has a zero count.
pub fn guess_delimiter(sample: &[u8]) -> u8 {
    let line = match scan_line_extent(sample, 0) {
        Some((content_end, _)) => &sample[0..content_end],
        None => sample,
    };

    let mut best: Option<(u8, usize)> = None;
    for &cand in CANDIDATES {
        let count = bytecount(line, cand);
        if count == 0 {
            continue;
        }
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((cand, count));
        }
    }
    best.map(|(b, _)| b).unwrap_or(b',')
}

fn bytecount(line: &[u8], byte: u8) -> usize {
    line.iter().filter(|&&b| b == byte).count()
}

/// Skip `n` complete raw lines starting at `pos`, ignoring quoting --
/// these are lines the caller asked to discard outright, not data.
/// Returns `None` if `buf` doesn't yet contain `n` full lines.
pub fn skip_n_lines(buf: &[u8], mut pos: usize, n: usize) -> Option<usize> {
    for _ in 0..n {
        let (_, next_pos) = scan_line_extent(buf, pos)?;
        pos = next_pos;
    }
    Some(pos)
}

/// R's `write.csv` convention: a header with exactly one fewer column
/// than the first data row means the data's first column is row
/// names with no header label at all. Reconciled by prepending a
/// synthetic `UNNAMED_0` label so `names.len() == data_ncols`.
pub fn reconcile_row_names(names: &mut Vec<String>, data_ncols: usize) -> bool {
    if names.len() + 1 == data_ncols {
        names.insert(0, "UNNAMED_0".to_string());
        true
    } else {
        false
    }
}

pub fn synthesize_names(ncols: usize) -> Vec<String> {
    (1..=ncols).map(|i| format!("X{i}")).collect()
}

/// Normalize and de-duplicate column names. A blank header field
/// becomes positional `UNNAMED_{i}` (1-based); a name starting with a
/// digit is prefixed with `X`; any byte outside `[A-Za-z0-9_]` becomes
/// `_`. Duplicates (after normalization) are suffixed `_duplicated_{n}`,
/// matching the convention of the schema-inference code this crate's
/// header handling is grounded on.
pub fn normalize_names(names: Vec<String>, normalize: bool) -> Vec<String> {
    let mut out: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            if n.is_empty() {
                format!("UNNAMED_{}", i + 1)
            } else if normalize {
                normalize_one(&n)
            } else {
                n
            }
        })
        .collect();
    dedup_names(&mut out);
    out
}

fn normalize_one(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if s.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        s.insert(0, 'X');
    }
    s
}

fn dedup_names(names: &mut [String]) {
    let mut seen = std::collections::HashMap::<String, usize>::new();
    for name in names.iter_mut() {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count > 0 {
            let suffixed = format!("{name}_duplicated_{count}");
            *name = suffixed;
        }
        *count += 1;
    }
}
