//! A high-throughput reader for character-delimited tabular text (CSV,
//! TSV, and generalized single-byte-delimiter formats) with automatic
//! per-column type inference.
//!
//! The pipeline: [`source`] supplies bytes, [`buffer`] frames them into
//! whole records, [`scan`] tokenizes and shape-classifies each field,
//! [`summarize`]/[`infer`] decide each column's type, [`column`]
//! materializes the typed values, and [`driver`] ties all of it
//! together across as many chunks as the input needs. [`read_dlm`]
//! (and the `read_csv`/`read_tsv` presets) is the entry point most
//! callers want.

pub mod buffer;
pub mod column;
pub mod compression;
pub mod driver;
pub mod error;
pub mod infer;
pub mod options;
pub mod parse;
pub mod preprocess;
pub mod scan;
pub mod source;
pub mod summarize;
pub mod table;
pub mod token;

use std::io::Read;
use std::path::{Path, PathBuf};

pub use column::Column;
pub use error::{set_verbose, ReadError, ReadResult};
pub use infer::DataType;
pub use options::{csv_defaults, tsv_defaults, CsvReadOptions, DlmParseOptions, DlmReadOptions};
pub use source::{FileSource, Source};
pub use table::Table;

/// `TsvReadOptions` exists distinctly from `CsvReadOptions` only in its
/// defaults (`tsv_defaults`); both are the same builder underneath.
pub type TsvReadOptions = DlmReadOptions;

/// What [`read_dlm`] and its presets accept: a path to open directly,
/// or a caller-supplied [`Source`] (subprocess stdout, an HTTP body,
/// anything that isn't a local file -- this crate doesn't make those
/// connections itself, per §1's non-goals).
pub enum SourceKind {
    Path(PathBuf),
    Boxed(Box<dyn Source>),
}

impl From<&str> for SourceKind {
    fn from(s: &str) -> Self {
        SourceKind::Path(PathBuf::from(s))
    }
}

impl From<String> for SourceKind {
    fn from(s: String) -> Self {
        SourceKind::Path(PathBuf::from(s))
    }
}

impl From<&Path> for SourceKind {
    fn from(p: &Path) -> Self {
        SourceKind::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for SourceKind {
    fn from(p: PathBuf) -> Self {
        SourceKind::Path(p)
    }
}

impl From<Box<dyn Source>> for SourceKind {
    fn from(s: Box<dyn Source>) -> Self {
        SourceKind::Boxed(s)
    }
}

/// Read delimited text with a fully custom [`DlmReadOptions`].
pub fn read_dlm(source: impl Into<SourceKind>, options: DlmReadOptions) -> ReadResult<Table> {
    let mut src: Box<dyn Source> = match source.into() {
        SourceKind::Path(p) => Box::new(FileSource::open(p)?),
        SourceKind::Boxed(s) => s,
    };
    let head = src.peek6()?;
    let codec = compression::sniff_codec(&head);
    let boxed_read: Box<dyn Read> = Box::new(src);
    let reader = compression::wrap_decoder(codec, boxed_read)?;
    driver::read(reader, &options)
}

/// Read comma-delimited text. `options.parse_options.separator` is
/// forced to `,` regardless of what the caller set.
pub fn read_csv(source: impl Into<SourceKind>, mut options: CsvReadOptions) -> ReadResult<Table> {
    options.parse_options.separator = Some(b',');
    read_dlm(source, options)
}

/// Read tab-delimited text. `options.parse_options.separator` is
/// forced to `\t` regardless of what the caller set.
pub fn read_tsv(source: impl Into<SourceKind>, mut options: TsvReadOptions) -> ReadResult<Table> {
    options.parse_options.separator = Some(b'\t');
    read_dlm(source, options)
}
