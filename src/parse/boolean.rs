//! Boolean value parsing: a first-byte-only check. The shape
//! classifier has already confirmed the field is one of `t`/`true`/
//! `f`/`false` (any case), so the full literal never needs comparing.

pub fn parse_bool(bytes: &[u8]) -> bool {
    matches!(bytes.first(), Some(b't') | Some(b'T'))
}
