//! Integer value parsing: a digit loop with an overflow-checked path,
//! backed by `atoi_simd` rather than hand-rolled digit accumulation --
//! the shape classifier has already confirmed the bytes are
//! `[+-]?[0-9]+`, so the only way this can fail is overflow.

use crate::error::{ReadError, ReadResult};

pub fn parse_integer(bytes: &[u8], line: u64, column: usize) -> ReadResult<i64> {
    // atoi_simd only recognizes a leading '-', not '+'.
    let digits = if bytes.first() == Some(&b'+') { &bytes[1..] } else { bytes };
    atoi_simd::parse::<i64>(digits).map_err(|_| ReadError::OverflowError {
        line,
        column,
        value: String::from_utf8_lossy(bytes).into_owned(),
    })
}
