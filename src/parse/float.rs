//! Float value parsing, delegated to `fast-float2`'s strtod-equivalent
//! parser rather than hand-rolled accumulation -- the same choice the
//! spec calls out explicitly for re-implementations.

use crate::error::{ReadError, ReadResult};

pub fn parse_float(bytes: &[u8], line: u64, column: usize) -> ReadResult<f64> {
    fast_float2::parse::<f64, _>(bytes).map_err(|_| ReadError::FloatParseError {
        line,
        column,
        value: String::from_utf8_lossy(bytes).into_owned(),
    })
}
