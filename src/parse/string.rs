//! String value materialization, plus the small MRU cache that lets
//! columns with few distinct strings (flags, categories, repeated IDs)
//! share one allocation across many rows instead of copying the same
//! bytes over and over.
//!
//! The cache tracks its own hit rate and disables itself once it's
//! clearly not paying for itself (a column of mostly-unique strings),
//! rather than churning through evictions for no benefit.

use std::rc::Rc;

const CAPACITY: usize = 8;
const MIN_SAMPLE: u64 = 64;
const MIN_HIT_RATE: f64 = 0.05;

pub struct StringCache {
    entries: Vec<Rc<str>>,
    lookups: u64,
    hits: u64,
    disabled: bool,
}

impl StringCache {
    pub fn new() -> Self {
        StringCache { entries: Vec::with_capacity(CAPACITY), lookups: 0, hits: 0, disabled: false }
    }

    /// Intern already-unescaped, already-UTF8-validated bytes.
    pub fn get_or_insert(&mut self, bytes: &[u8]) -> Rc<str> {
        if self.disabled {
            return Rc::from(str_from_bytes(bytes));
        }
        self.lookups += 1;
        if let Some(pos) = self.entries.iter().position(|e| e.as_bytes() == bytes) {
            self.hits += 1;
            let found = self.entries.remove(pos);
            self.entries.insert(0, found.clone());
            return found;
        }
        let interned: Rc<str> = Rc::from(str_from_bytes(bytes));
        if self.entries.len() >= CAPACITY {
            self.entries.pop();
        }
        self.entries.insert(0, interned.clone());
        self.maybe_disable();
        interned
    }

    fn maybe_disable(&mut self) {
        if !self.disabled && self.lookups >= MIN_SAMPLE {
            let rate = self.hits as f64 / self.lookups as f64;
            if rate < MIN_HIT_RATE {
                self.disabled = true;
                crate::dlm_warn!("string cache hit rate {rate:.3} below threshold, disabling");
            }
        }
    }
}

impl Default for StringCache {
    fn default() -> Self {
        Self::new()
    }
}

fn str_from_bytes(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).expect("caller must validate UTF-8 before materializing")
}

/// Plain (unquoted) field: a direct view-to-owned copy.
pub fn materialize_plain(bytes: &[u8]) -> String {
    str_from_bytes(bytes).to_owned()
}

/// Quoted field: collapse every doubled quote byte into one.
pub fn unescape_quoted(bytes: &[u8], quote: u8) -> Vec<u8> {
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
    out
}
