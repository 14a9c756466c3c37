//! Configuration types recognized by the core (§6).
//!
//! `DlmParseOptions` governs the byte-level grammar (what a field looks
//! like); `DlmReadOptions` wraps it with the read-level policy (header
//! handling, skipping, chunk sizing). `CsvReadOptions`/`TsvReadOptions`
//! are named presets over the same builder, mirroring how the teacher
//! exposes `CsvReadOptions` with format-specific defaults rather than a
//! second, parallel options type.

use crate::config_bail;
use crate::error::ReadResult;

/// Smallest legal `chunkbits`; below this the per-chunk row-capacity
/// estimate and token-matrix overhead dominate actual work.
pub const MIN_CHUNK_BITS: u32 = 14;
/// Largest legal `chunkbits`: the packed token's addressable range.
pub const MAX_CHUNK_BITS: u32 = 36;
/// Sentinel meaning "single chunk covering the whole input".
pub const SINGLE_CHUNK: u32 = 0;

/// The byte-level grammar: delimiter, quoting, trimming, and the two
/// policies (`lzstring`, comment prefix) that change how a field's
/// shape is classified.
#[derive(Clone, Debug)]
pub struct DlmParseOptions {
    /// `None` means no delimiter has been chosen yet: the driver guesses
    /// one (§4.9) from a sample of the input before the first scan.
    pub separator: Option<u8>,
    /// `None` means `NO_QUOTE`: the quote byte plays no special role.
    pub quote_char: Option<u8>,
    pub trim: bool,
    pub lzstring: bool,
    pub skipblank: bool,
    /// Whole-line comment prefix. Must not contain `\n`/`\r`.
    pub comment_prefix: Option<String>,
    /// The terminator synthesized at EOF when the input doesn't end in
    /// one already. LF, CR, and CR+LF are always *accepted* regardless
    /// of this setting; this only controls what gets synthesized.
    pub eol_char: u8,
}

impl Default for DlmParseOptions {
    fn default() -> Self {
        DlmParseOptions {
            separator: None,
            quote_char: Some(b'"'),
            trim: false,
            lzstring: true,
            skipblank: false,
            comment_prefix: None,
            eol_char: b'\n',
        }
    }
}

impl DlmParseOptions {
    pub fn validate(&self) -> ReadResult<()> {
        if let Some(sep) = self.separator {
            if self.trim && sep == b' ' {
                config_bail!("trim cannot be combined with a space delimiter");
            }
            if let Some(q) = self.quote_char {
                if q == sep {
                    config_bail!("delimiter and quote character must differ");
                }
            }
        }
        if self.trim && self.quote_char == Some(b' ') {
            config_bail!("trim cannot be combined with a space quote character");
        }
        if let Some(prefix) = &self.comment_prefix {
            if prefix.is_empty() {
                config_bail!("comment prefix must not be empty");
            }
            if prefix.as_bytes().iter().any(|&b| b == b'\n' || b == b'\r') {
                config_bail!("comment prefix must not contain a line break");
            }
        }
        Ok(())
    }
}

/// How column names are determined when the caller doesn't supply
/// them outright (`colnames`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Read the first non-comment, non-blank record as names.
    FromFirstRow,
    /// Synthesize `X1..Xn` from a column count probed from one row.
    Synthesize,
}

/// Read-level policy layered on top of [`DlmParseOptions`].
#[derive(Clone, Debug)]
pub struct DlmReadOptions {
    pub parse_options: DlmParseOptions,
    pub header: HeaderPolicy,
    /// Overrides whatever `header` would have produced.
    pub colnames: Option<Vec<String>>,
    pub normalize_names: bool,
    /// Lines to discard before any other pre-processing.
    pub skip: usize,
    /// `0` = single chunk covering the whole input; otherwise the
    /// chunk size is `2^chunkbits` bytes.
    pub chunkbits: u32,
}

impl Default for DlmReadOptions {
    fn default() -> Self {
        DlmReadOptions {
            parse_options: DlmParseOptions::default(),
            header: HeaderPolicy::FromFirstRow,
            colnames: None,
            normalize_names: false,
            skip: 0,
            chunkbits: 20,
        }
    }
}

impl DlmReadOptions {
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.parse_options.separator = Some(separator);
        self
    }

    pub fn with_quote_char(mut self, quote_char: Option<u8>) -> Self {
        self.parse_options.quote_char = quote_char;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.parse_options.trim = trim;
        self
    }

    pub fn with_lzstring(mut self, lzstring: bool) -> Self {
        self.parse_options.lzstring = lzstring;
        self
    }

    pub fn with_skipblank(mut self, skipblank: bool) -> Self {
        self.parse_options.skipblank = skipblank;
        self
    }

    pub fn with_comment_prefix(mut self, prefix: Option<impl Into<String>>) -> Self {
        self.parse_options.comment_prefix = prefix.map(Into::into);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.header = if has_header {
            HeaderPolicy::FromFirstRow
        } else {
            HeaderPolicy::Synthesize
        };
        self
    }

    pub fn with_colnames(mut self, names: Option<Vec<String>>) -> Self {
        self.colnames = names;
        self
    }

    pub fn with_normalize_names(mut self, normalize: bool) -> Self {
        self.normalize_names = normalize;
        self
    }

    pub fn with_skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    pub fn with_chunkbits(mut self, bits: u32) -> Self {
        self.chunkbits = bits;
        self
    }

    pub fn validate(&self) -> ReadResult<()> {
        self.parse_options.validate()?;
        if self.chunkbits != SINGLE_CHUNK
            && !(MIN_CHUNK_BITS..=MAX_CHUNK_BITS).contains(&self.chunkbits)
        {
            config_bail!(
                "chunkbits must be 0 or in [{MIN_CHUNK_BITS}, {MAX_CHUNK_BITS}], got {}",
                self.chunkbits
            );
        }
        Ok(())
    }

    /// Target chunk size in bytes for the current `chunkbits` setting,
    /// given the (optional) total input size known up front -- used
    /// only by `chunkbits = 0`, "single chunk covering the whole
    /// input".
    pub fn target_chunk_bytes(&self, total_input_len: Option<u64>) -> u64 {
        if self.chunkbits == SINGLE_CHUNK {
            total_input_len.unwrap_or(crate::token::MAX_CHUNK_LEN)
        } else {
            1u64 << self.chunkbits
        }
    }
}

/// `CsvReadOptions::default()` is a `DlmReadOptions` with `,` as the
/// delimiter -- the common case gets its own name, not a second type.
pub type CsvReadOptions = DlmReadOptions;

pub fn csv_defaults() -> DlmReadOptions {
    DlmReadOptions::default().with_separator(b',')
}

pub fn tsv_defaults() -> DlmReadOptions {
    DlmReadOptions::default()
        .with_separator(b'\t')
        .with_quote_char(None)
}
