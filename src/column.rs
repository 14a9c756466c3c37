//! The materialized column container.
//!
//! A tagged variant over the handful of concrete value types this
//! crate ever produces, rather than any form of virtual dispatch --
//! there are six shapes total and every consumer needs to match on the
//! concrete type eventually, so a trait object would only add an
//! indirection with nothing to abstract over.

use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ReadResult;
use crate::infer::DataType;
use crate::options::DlmParseOptions;
use crate::parse::date::{try_upgrade_column, DateUpgrade};
use crate::parse::{parse_bool, parse_float, parse_integer, unescape_quoted, StringCache};
use crate::token::Token;

#[derive(Clone, Debug)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    String(Vec<Option<Rc<str>>>),
    Date(Vec<Option<NaiveDate>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl Column {
    pub fn with_capacity(data_type: DataType, cap: usize) -> Column {
        match data_type {
            DataType::Int64 => Column::Int64(Vec::with_capacity(cap)),
            DataType::Float64 => Column::Float64(Vec::with_capacity(cap)),
            DataType::Bool => Column::Bool(Vec::with_capacity(cap)),
            DataType::String => Column::String(Vec::with_capacity(cap)),
            DataType::Date => Column::Date(Vec::with_capacity(cap)),
            DataType::DateTime => Column::DateTime(Vec::with_capacity(cap)),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Column::Int64(_) => DataType::Int64,
            Column::Float64(_) => DataType::Float64,
            Column::Bool(_) => DataType::Bool,
            Column::String(_) => DataType::String,
            Column::Date(_) => DataType::Date,
            Column::DateTime(_) => DataType::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::String(v) => v.len(),
            Column::Date(v) => v.len(),
            Column::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one field's value, materialized from its token. The
    /// column's own variant decides how the bytes are interpreted --
    /// this is only ever called with a `data_type()` already committed
    /// for the whole column, never `Date`/`DateTime` (those come only
    /// from `upgrade_dates`, after every row is in).
    pub fn push_token(
        &mut self,
        buf: &[u8],
        token: Token,
        opts: &DlmParseOptions,
        line: u64,
        col: usize,
        cache: &mut StringCache,
    ) -> ReadResult<()> {
        match self {
            Column::Int64(v) => {
                v.push(if token.is_missing() { None } else { Some(parse_integer(token.bytes(buf), line, col)?) });
            },
            Column::Float64(v) => {
                v.push(if token.is_missing() { None } else { Some(parse_float(token.bytes(buf), line, col)?) });
            },
            Column::Bool(v) => {
                v.push(if token.is_missing() { None } else { Some(parse_bool(token.bytes(buf))) });
            },
            Column::String(v) => {
                v.push(if token.is_missing() {
                    None
                } else if token.is_quoted() {
                    let quote = opts.quote_char.unwrap_or(b'"');
                    let unescaped = unescape_quoted(token.bytes(buf), quote);
                    Some(cache.get_or_insert(&unescaped))
                } else {
                    Some(cache.get_or_insert(token.bytes(buf)))
                });
            },
            Column::Date(_) | Column::DateTime(_) => {
                unreachable!("Date/DateTime columns are only produced by upgrade_dates")
            },
        }
        Ok(())
    }

    /// Convert every value to match a wider type decided by
    /// `infer::widen` across chunks. Only the four shapes that
    /// per-chunk inference ever produces (`Int64`/`Float64`/`Bool`/
    /// `String`) appear here -- `Date`/`DateTime` are never involved in
    /// cross-chunk widening, since they're only assigned once, after
    /// every chunk is in, by `upgrade_dates`.
    pub fn cast_to(self, target: DataType) -> Column {
        if self.data_type() == target {
            return self;
        }
        match (self, target) {
            (Column::Int64(v), DataType::Float64) => {
                Column::Float64(v.into_iter().map(|o| o.map(|i| i as f64)).collect())
            },
            (Column::Int64(v), DataType::String) => {
                let mut buf = itoa::Buffer::new();
                Column::String(v.into_iter().map(|o| o.map(|i| Rc::from(buf.format(i)))).collect())
            },
            (Column::Float64(v), DataType::String) => {
                let mut buf = ryu::Buffer::new();
                Column::String(v.into_iter().map(|o| o.map(|f| Rc::from(buf.format(f)))).collect())
            },
            (Column::Bool(v), DataType::String) => Column::String(
                v.into_iter().map(|o| o.map(|b| Rc::from(if b { "true" } else { "false" }))).collect(),
            ),
            (col, target) => unreachable!("widen() never asks for {:?} -> {target:?}", col.data_type()),
        }
    }

    /// Append another chunk's already-matching-type column onto this
    /// one. Panics if the variants differ -- callers must `cast_to` the
    /// committed type on both sides first.
    pub fn extend_from(&mut self, other: Column) {
        match (self, other) {
            (Column::Int64(a), Column::Int64(b)) => a.extend(b),
            (Column::Float64(a), Column::Float64(b)) => a.extend(b),
            (Column::Bool(a), Column::Bool(b)) => a.extend(b),
            (Column::String(a), Column::String(b)) => a.extend(b),
            (Column::Date(a), Column::Date(b)) => a.extend(b),
            (Column::DateTime(a), Column::DateTime(b)) => a.extend(b),
            (a, b) => panic!("extend_from variant mismatch: {:?} vs {:?}", a.data_type(), b.data_type()),
        }
    }

    /// Attempt the end-of-parse date/datetime upgrade (§4.13). Only
    /// `String` columns are eligible; everything else is returned
    /// unchanged. Reverts silently (logging via `dlm_warn!`) if any
    /// present value fails to parse under the sniffed format.
    pub fn upgrade_dates(self) -> Column {
        let Column::String(values) = &self else { return self };
        let as_str: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
        match try_upgrade_column(&as_str) {
            Some(DateUpgrade::Date(v)) => Column::Date(v),
            Some(DateUpgrade::DateTime(v)) => Column::DateTime(v),
            None => self,
        }
    }
}
