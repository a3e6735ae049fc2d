//! Header compression for HEADERS and PUSH_PROMISE frames.
//!
//! The frame encoders only see compression through [`HeaderCompressor`].
//! [`HpackCompressor`] is the shipped implementation, a thin wrapper around
//! `fluke-hpack` whose dynamic table lives as long as the connection.
//! [`HpackDecompressor`] is the receiving half.

use crate::error::{FrameError, Result};

/// A header field. Names and values are opaque bytes to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Header {
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Output of one [`HeaderCompressor::compress`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlock {
    /// The encoded header block.
    pub block: Vec<u8>,
    /// How many entries from the front of the header list the block covers.
    pub consumed: usize,
}

/// A header-compression context.
///
/// Compression mutates the context's dynamic table, so each call must see
/// the state left by the previous one. Taking `&mut self` keeps one encode
/// in flight per context; share a context across threads behind a mutex.
///
/// Encoders validate their arguments and reserve the output buffer before
/// calling [`compress`](HeaderCompressor::compress), so a frame that fails
/// for those reasons leaves the context untouched. A block that breaks the
/// contract below is reported as [`FrameError::Internal`] after the context
/// has already advanced; that context no longer matches its peer and must
/// be dropped.
pub trait HeaderCompressor {
    /// Compress a prefix of `headers` into a block of at most `budget`
    /// bytes.
    ///
    /// Implementations consume at least one entry or fail; an entry that
    /// cannot fit in `budget` on its own is an error, never a truncation.
    fn compress(&mut self, headers: &[Header], budget: usize) -> Result<CompressedBlock>;

    /// Upper bound on the block `compress` can return for `headers`,
    /// whatever the budget. Encoders reserve the frame from
    /// `min(budget, max_block_len(headers))` before compressing.
    ///
    /// The default makes the budget the only bound.
    fn max_block_len(&self, _headers: &[Header]) -> usize {
        usize::MAX
    }
}

/// Bytes in an HPACK integer of `value` with a `prefix_bits`-bit prefix.
fn hpack_int_len(value: usize, prefix_bits: u32) -> usize {
    let max_prefix = (1usize << prefix_bits) - 1;
    if value < max_prefix {
        return 1;
    }
    let mut rest = value - max_prefix;
    let mut len = 2;
    while rest >= 0x80 {
        rest >>= 7;
        len += 1;
    }
    len
}

/// Longest name reference fluke-hpack writes: a 4-bit-prefix index into
/// the 61 static entries plus the at most 128 entries a 4096-byte dynamic
/// table holds.
const MAX_NAME_INDEX_LEN: usize = 3;

/// Upper bound on the bytes HPACK spends on one header field.
///
/// The encoder never Huffman-codes, so a literal costs its representation
/// byte plus two length-prefixed strings. An indexed field or an indexed
/// name is never longer, except that a name index can outgrow an empty
/// literal name.
fn encoded_len_bound(header: &Header) -> usize {
    let name = 1 + hpack_int_len(header.name.len(), 7) + header.name.len();
    let value = hpack_int_len(header.value.len(), 7) + header.value.len();
    name.max(MAX_NAME_INDEX_LEN).saturating_add(value)
}

/// HPACK encoder context.
/// Wraps `fluke_hpack::Encoder` which maintains dynamic table state per-connection.
pub struct HpackCompressor {
    inner: fluke_hpack::Encoder<'static>,
}

impl std::fmt::Debug for HpackCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackCompressor").finish()
    }
}

impl Default for HpackCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackCompressor {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Encoder::new(),
        }
    }
}

impl HeaderCompressor for HpackCompressor {
    fn compress(&mut self, headers: &[Header], budget: usize) -> Result<CompressedBlock> {
        let first = headers
            .first()
            .ok_or_else(|| FrameError::InvalidArgument("empty header list".to_string()))?;
        let first_len = encoded_len_bound(first);
        if first_len > budget {
            return Err(FrameError::InvalidArgument(format!(
                "header field may encode to {} bytes, more than the {} byte header block",
                first_len, budget
            )));
        }

        // Each field is encoded on its own so the loop can stop between
        // fields; the table is only touched for fields that are kept.
        let mut block = Vec::new();
        let mut consumed = 0;
        for header in headers {
            if block.len().saturating_add(encoded_len_bound(header)) > budget {
                break;
            }
            let pair = (header.name.as_slice(), header.value.as_slice());
            block.extend_from_slice(&self.inner.encode(std::iter::once(pair)));
            consumed += 1;
        }

        if consumed < headers.len() {
            tracing::debug!(
                consumed,
                total = headers.len(),
                block_len = block.len(),
                budget,
                "header list split across header blocks"
            );
        }
        Ok(CompressedBlock { block, consumed })
    }

    fn max_block_len(&self, headers: &[Header]) -> usize {
        headers
            .iter()
            .map(encoded_len_bound)
            .fold(0, usize::saturating_add)
    }
}

/// HPACK decoder context, the decompressing half of [`HpackCompressor`].
/// Wraps `fluke_hpack::Decoder` which maintains dynamic table state per-connection.
pub struct HpackDecompressor {
    inner: fluke_hpack::Decoder<'static>,
}

impl std::fmt::Debug for HpackDecompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackDecompressor").finish()
    }
}

impl Default for HpackDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackDecompressor {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Decoder::new(),
        }
    }

    /// Decode a header block back into its header list.
    pub fn decompress(&mut self, block: &[u8]) -> Result<Vec<Header>> {
        let pairs = self
            .inner
            .decode(block)
            .map_err(|e| FrameError::Compression(format!("HPACK decode error: {:?}", e)))?;
        Ok(pairs
            .into_iter()
            .map(|(name, value)| Header { name, value })
            .collect())
    }
}
