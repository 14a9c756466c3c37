//! C6 — type inference.
//!
//! Turns a column's folded shape bitmap (`summarize::ColumnSummary`)
//! into a concrete [`DataType`], narrowest shape first: INTEGER, then
//! FLOAT, then BOOL, then STRING as the catch-all. Date/datetime
//! upgrades happen later, end-of-parse, in `parse::date` -- they are
//! not part of this ordering because they can't be decided from the
//! shape bitmap alone (a column of all-numeric-looking strings is
//! still `String` here; the date upgrade is attempted afterward and
//! silently reverts on failure).

use crate::error::ReadError;
use crate::summarize::ColumnSummary;
use crate::token::{KIND_BOOL, KIND_FLOAT, KIND_INTEGER};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Int64,
    Float64,
    Bool,
    String,
    /// Assigned only by `parse::date`'s end-of-parse upgrade; never
    /// produced directly from a shape bitmap.
    Date,
    DateTime,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::Int64 => "Int64",
            DataType::Float64 => "Float64",
            DataType::Bool => "Bool",
            DataType::String => "String",
            DataType::Date => "Date",
            DataType::DateTime => "DateTime",
        }
    }
}

/// Decide one column's type from its chunk summary. A column that is
/// entirely missing has no information to narrow from and defaults to
/// `String` -- the widest, always-safe representation of "every value
/// absent" -- wrapped `Optional` by the caller regardless.
pub fn infer_from_summary(summary: &ColumnSummary) -> DataType {
    if summary.all_missing {
        return DataType::String;
    }
    let kinds = summary.compatible_kinds();
    if kinds & KIND_INTEGER != 0 {
        DataType::Int64
    } else if kinds & KIND_FLOAT != 0 {
        DataType::Float64
    } else if kinds & KIND_BOOL != 0 {
        DataType::Bool
    } else {
        DataType::String
    }
}

/// Widen `old` (the type already committed for this column from
/// earlier chunks) with `new` (this chunk's inferred type), per the
/// cross-chunk widening table in the spec: INTEGER and FLOAT widen to
/// FLOAT, anything widens to STRING, and a Bool/numeric clash is a
/// hard error rather than a silent demotion to STRING -- unlike the
/// single-chunk shape reduction, which treats that same clash as "just
/// make it a string", crossing a chunk boundary means a caller may
/// already have committed typed values for earlier rows that a later
/// demotion could silently corrupt, so here it surfaces instead.
pub fn widen(column: usize, old: DataType, new: DataType) -> Result<DataType, ReadError> {
    use DataType::*;
    Ok(match (old, new) {
        (a, b) if a == b => a,
        (Int64, Float64) | (Float64, Int64) => Float64,
        (String, _) | (_, String) => String,
        (Date, DateTime) | (DateTime, Date) => DateTime,
        (a, b) => {
            return Err(ReadError::TypeInferenceConflict { column, old: a.name(), new: b.name() });
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn summary_of(rows: &[Token]) -> ColumnSummary {
        let rows: Vec<Vec<Token>> = rows.iter().map(|&t| vec![t]).collect();
        crate::summarize::summarize_chunk(&rows, 1)[0]
    }

    #[test]
    fn integer_column() {
        let s = summary_of(&[Token::pack(KIND_INTEGER | 0b0010, 0, 1)]);
        assert_eq!(infer_from_summary(&s), DataType::Int64);
    }

    #[test]
    fn all_missing_defaults_to_string() {
        let s = summary_of(&[Token::missing_at(0, 0)]);
        assert_eq!(infer_from_summary(&s), DataType::String);
    }

    #[test]
    fn widen_integer_and_float() {
        assert_eq!(widen(0, DataType::Int64, DataType::Float64).unwrap(), DataType::Float64);
        assert_eq!(widen(0, DataType::Float64, DataType::Int64).unwrap(), DataType::Float64);
    }

    #[test]
    fn widen_anything_to_string() {
        assert_eq!(widen(0, DataType::Int64, DataType::String).unwrap(), DataType::String);
        assert_eq!(widen(0, DataType::Bool, DataType::String).unwrap(), DataType::String);
    }

    #[test]
    fn widen_bool_and_integer_conflicts() {
        let err = widen(3, DataType::Bool, DataType::Int64).unwrap_err();
        assert!(matches!(err, ReadError::TypeInferenceConflict { column: 3, .. }));
    }

    #[test]
    fn widen_same_type_is_identity() {
        assert_eq!(widen(0, DataType::String, DataType::String).unwrap(), DataType::String);
    }
}
