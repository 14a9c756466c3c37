//! C7 — value parsers. Each takes the already-classified, already
//! UTF-8-validated bytes of one field and produces a typed value; none
//! of them re-derive the shape decision `scan::shape` already made.

pub mod boolean;
pub mod date;
pub mod float;
pub mod integer;
pub mod string;

pub use boolean::parse_bool;
pub use float::parse_float;
pub use integer::parse_integer;
pub use string::{materialize_plain, unescape_quoted, StringCache};
