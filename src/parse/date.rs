//! Date/datetime upgrade, attempted once over a fully-materialized
//! `String` column after every chunk has been read -- never per-row,
//! per-chunk, during shape classification. A column only ever becomes
//! `Date`/`DateTime` by this separate, end-of-parse pass; the shape
//! bitmap in `summarize.rs` has no notion of either.
//!
//! The regexes are a cheap sniff, not a parser: they decide which of
//! `NaiveDate`/`NaiveDateTime` to *attempt*, so a column of all-`10/3`
//! junk that happens to match neither pattern is rejected up front
//! without ever calling into `chrono`. If the sniff passes but the
//! actual `chrono` parse fails on any row, the whole upgrade is
//! abandoned and the column silently stays `String`.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:?\d{2})?$").unwrap())
}

pub fn looks_like_date(s: &str) -> bool {
    date_re().is_match(s)
}

pub fn looks_like_datetime(s: &str) -> bool {
    datetime_re().is_match(s)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

/// What an end-of-parse upgrade attempt produced.
pub enum DateUpgrade {
    Date(Vec<Option<NaiveDate>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

/// Attempt to upgrade a fully-materialized `String` column. `values[i]
/// == None` means that row was MISSING; those pass through untouched.
/// Returns `None` (revert to `String`, caller logs via `dlm_warn!`)
/// unless every present value parses under the *same* chosen format.
pub fn try_upgrade_column(values: &[Option<&str>]) -> Option<DateUpgrade> {
    let sniff_target = values.iter().flatten().find_map(|v| {
        if looks_like_datetime(v) {
            Some(true)
        } else if looks_like_date(v) {
            Some(false)
        } else {
            None
        }
    })?;

    if sniff_target {
        let mut out = Vec::with_capacity(values.len());
        for v in values {
            match v {
                None => out.push(None),
                Some(s) => out.push(Some(parse_datetime(s)?)),
            }
        }
        Some(DateUpgrade::DateTime(out))
    } else {
        let mut out = Vec::with_capacity(values.len());
        for v in values {
            match v {
                None => out.push(None),
                Some(s) => out.push(Some(parse_date(s)?)),
            }
        }
        Some(DateUpgrade::Date(out))
    }
}
