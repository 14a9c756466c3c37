//! X2 — compression dispatch.
//!
//! Sniffs the first bytes of a [`Source`](crate::source::Source) for a
//! known magic number and, when the `decompress` feature is enabled,
//! wraps the stream in the matching decoder before it ever reaches the
//! framer. `xz2` isn't part of the teacher's own dependency stack --
//! see DESIGN.md -- but `flate2`/`zstd` are, and the three are gated
//! behind the same feature the teacher itself uses for this purpose.

use std::io::Read;

use crate::error::ReadResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    None,
    Gzip,
    Xz,
    Zstd,
}

/// Inspect up to the first 6 bytes of a stream and identify a known
/// compression magic number. Anything else, including a stream
/// shorter than the shortest magic number, is `Codec::None`.
pub fn sniff_codec(head: &[u8]) -> Codec {
    if head.starts_with(&[0x1F, 0x8B]) {
        Codec::Gzip
    } else if head.starts_with(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00]) {
        Codec::Xz
    } else if head.starts_with(&[0x28, 0xB5, 0x2F, 0xFD]) {
        Codec::Zstd
    } else {
        Codec::None
    }
}

#[cfg(feature = "decompress")]
pub fn wrap_decoder(codec: Codec, reader: Box<dyn Read>) -> ReadResult<Box<dyn Read>> {
    Ok(match codec {
        Codec::None => reader,
        Codec::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        Codec::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
        Codec::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
    })
}

#[cfg(not(feature = "decompress"))]
pub fn wrap_decoder(codec: Codec, reader: Box<dyn Read>) -> ReadResult<Box<dyn Read>> {
    if codec == Codec::None {
        Ok(reader)
    } else {
        crate::config_bail!("input looks compressed ({codec:?}) but the `decompress` feature is disabled");
    }
}
