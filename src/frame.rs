//! HTTP-over-QUIC frame encoder.
//!
//! Every frame starts with the same header, followed by a payload whose
//! layout depends on the frame type:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Length (i)       ...|    Type (8)   |   Flags (8)   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                       Frame Payload (*)                     ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! `Length` is a variable-length integer counting payload bytes only.
//! The encoder is sans-I/O: each call returns an owned buffer ready to be
//! written to a stream, and keeps no state between calls.

use std::collections::BTreeMap;

use crate::error::{FrameError, Result};
use crate::hpack::{Header, HeaderCompressor};
use crate::varint::{encode_varint, varint_len, MAX_VARINT, MAX_VARINT_LEN};
use crate::writer::FrameWriter;

/// Frame types. The numeric values are fixed by the protocol registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Data = 0x0,
    Headers = 0x1,
    Priority = 0x2,
    CancelPush = 0x3,
    Settings = 0x4,
    PushPromise = 0x5,
    Goaway = 0x7,
    MaxPushId = 0xd,
}

impl FrameType {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x0 => Ok(Self::Data),
            0x1 => Ok(Self::Headers),
            0x2 => Ok(Self::Priority),
            0x3 => Ok(Self::CancelPush),
            0x4 => Ok(Self::Settings),
            0x5 => Ok(Self::PushPromise),
            0x7 => Ok(Self::Goaway),
            0xd => Ok(Self::MaxPushId),
            _ => Err(FrameError::InvalidArgument(format!(
                "unknown frame type 0x{:x}",
                value
            ))),
        }
    }
}

/// PRIORITY frame flags
pub mod flags {
    /// The prioritized element is a push ID, not a request stream.
    pub const PUSH_PRIORITIZED: u8 = 0x4;
    /// The dependency is a push ID, not a request stream.
    pub const PUSH_DEPENDENT: u8 = 0x2;
    /// Exclusive dependency.
    pub const EXCLUSIVE: u8 = 0x1;
}

/// SETTINGS identifiers
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
    pub const MAX_HEADER_LIST_SIZE: u16 = 0x6;
}

/// Default maximum payload carried by one frame (16 KB).
///
/// Larger DATA blocks are split across frames by the caller; header lists
/// are split by the compressor.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 16_384;

/// Smallest allowed maximum payload: a PRIORITY frame with two 8-byte
/// varints and the weight byte must always fit.
///
/// At this size a HEADERS block gets 17 bytes and a PUSH_PROMISE block 9 to
/// 16 bytes, depending on the push ID, which only holds small or indexed
/// fields.
pub const MIN_PAYLOAD_SIZE: usize = 2 * MAX_VARINT_LEN + 1;

/// Largest allowed maximum payload: the varint ceiling, reduced on narrow
/// targets so that header + payload still fits in a `usize`.
pub const MAX_PAYLOAD_SIZE_LIMIT: usize = if (usize::MAX as u64) > MAX_VARINT {
    MAX_VARINT as usize
} else {
    usize::MAX - MAX_HEADER_LEN
};

/// Longest possible frame header: an 8-byte length, type and flags.
pub const MAX_HEADER_LEN: usize = MAX_VARINT_LEN + 2;

/// Size of the frame header for a payload of `payload_len` bytes.
pub fn header_len(payload_len: usize) -> Result<usize> {
    Ok(varint_len(payload_len as u64)? + 2)
}

/// Write a frame header into the front of `buf`.
///
/// Returns the header length, `varint_len(payload_len) + 2`.
pub fn build_header(
    payload_len: usize,
    frame_type: FrameType,
    flags: u8,
    buf: &mut [u8],
) -> Result<usize> {
    let len = header_len(payload_len)?;
    if buf.len() < len {
        return Err(FrameError::BufferTooSmall { needed: len });
    }
    let off = encode_varint(payload_len as u64, buf)?;
    buf[off] = frame_type.as_u8();
    buf[off + 1] = flags;
    Ok(len)
}

/// Result of [`FrameLimits::fit_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFit {
    /// Total encoded frame length, header included.
    pub frame_len: usize,
    /// Payload bytes that fit in the frame.
    pub payload_len: usize,
}

/// Frame size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    max_payload_size: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

impl FrameLimits {
    /// Limits with a custom maximum payload size, between
    /// [`MIN_PAYLOAD_SIZE`] and [`MAX_PAYLOAD_SIZE_LIMIT`].
    pub fn new(max_payload_size: usize) -> Result<Self> {
        if !(MIN_PAYLOAD_SIZE..=MAX_PAYLOAD_SIZE_LIMIT).contains(&max_payload_size) {
            return Err(FrameError::InvalidArgument(format!(
                "max payload size {} outside {}..={}",
                max_payload_size, MIN_PAYLOAD_SIZE, MAX_PAYLOAD_SIZE_LIMIT
            )));
        }
        Ok(Self { max_payload_size })
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// How much of a `payload_len` byte payload fits in one frame, and how
    /// long that frame is.
    ///
    /// Never fails: oversized payloads are cut to the maximum payload size.
    pub fn fit_frame(&self, payload_len: usize) -> FrameFit {
        let payload_len = payload_len.min(self.max_payload_size);
        // max_payload_size <= MAX_VARINT, so the length always encodes.
        let header = varint_len(payload_len as u64).unwrap_or(MAX_VARINT_LEN) + 2;
        FrameFit {
            frame_len: header + payload_len,
            payload_len,
        }
    }

    /// Like `fit_frame`, for payloads that cannot be split.
    fn fit_whole(&self, frame_type: FrameType, payload_len: usize) -> Result<FrameFit> {
        let fit = self.fit_frame(payload_len);
        if fit.payload_len != payload_len {
            return Err(FrameError::Internal(format!(
                "{:?} payload of {} bytes exceeds max payload size {}",
                frame_type, payload_len, self.max_payload_size
            )));
        }
        Ok(fit)
    }
}

/// SETTINGS frame contents: identifier → opaque value.
///
/// Each entry is written as
///
/// ```text
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         Identifier (16)       |            Length (i)       ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Contents (?)                       ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// in ascending identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: BTreeMap<u16, Vec<u8>>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `id` to raw contents, replacing any previous value.
    pub fn insert(&mut self, id: u16, contents: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.insert(id, contents.into());
        self
    }

    /// Set `id` to a varint-encoded integer.
    pub fn insert_varint(&mut self, id: u16, value: u64) -> Result<&mut Self> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let n = encode_varint(value, &mut buf)?;
        Ok(self.insert(id, &buf[..n]))
    }

    pub fn get(&self, id: u16) -> Option<&[u8]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &[u8])> {
        self.entries.iter().map(|(id, v)| (*id, v.as_slice()))
    }

    /// Encoded payload length of all entries.
    fn payload_len(&self) -> Result<usize> {
        let mut total: usize = 0;
        for contents in self.entries.values() {
            let entry = varint_len(contents.len() as u64)?
                .checked_add(2 + contents.len())
                .and_then(|n| total.checked_add(n));
            total = entry.ok_or_else(|| {
                FrameError::Unsupported("SETTINGS payload overflows usize".to_string())
            })?;
        }
        Ok(total)
    }
}

/// A frame that may carry only part of its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// The complete encoded frame.
    pub bytes: Vec<u8>,
    /// Input consumed: payload bytes for DATA, header-list entries for
    /// HEADERS and PUSH_PROMISE.
    pub consumed: usize,
}

impl EncodedFrame {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Frame encoder.
///
/// Holds only the frame limits; the header-compression context is passed
/// into the calls that need it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder {
    limits: FrameLimits,
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: FrameLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &FrameLimits {
        &self.limits
    }

    /// Create a DATA frame carrying as much of `block` as fits.
    ///
    /// `consumed` tells the caller where to resume; an empty block gives an
    /// empty DATA frame.
    pub fn create_data_frame(&self, block: &[u8]) -> Result<EncodedFrame> {
        let fit = self.limits.fit_frame(block.len());
        if fit.payload_len < block.len() {
            tracing::debug!(
                block_len = block.len(),
                payload_len = fit.payload_len,
                "DATA block truncated to frame size"
            );
        }

        let mut w = FrameWriter::with_capacity(fit.frame_len)?;
        w.put_header(fit.payload_len, FrameType::Data, 0)?;
        w.put_slice(&block[..fit.payload_len])?;
        let bytes = finish(w, FrameType::Data, fit.payload_len)?;
        Ok(EncodedFrame {
            bytes,
            consumed: fit.payload_len,
        })
    }

    /// Split `block` into as many DATA frames as it takes.
    pub fn create_data_frames(&self, block: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut frames = Vec::new();
        let mut rest = block;
        loop {
            let frame = self.create_data_frame(rest)?;
            rest = &rest[frame.consumed..];
            frames.push(frame.bytes);
            if rest.is_empty() {
                return Ok(frames);
            }
        }
    }

    /// Create a HEADERS frame from as many of `headers` as fit.
    ///
    /// With `push_id`, the push stream header (the push ID as a varint) is
    /// written in front of the frame and is not counted in its length.
    /// `consumed` is the number of header entries encoded; call again with
    /// the rest on the same context if it is short.
    pub fn create_headers_frame<C>(
        &self,
        ctx: &mut C,
        push_id: Option<u64>,
        headers: &[Header],
    ) -> Result<EncodedFrame>
    where
        C: HeaderCompressor + ?Sized,
    {
        require_headers(headers)?;
        let prefix_len = match push_id {
            Some(id) => varint_len(id)?,
            None => 0,
        };

        let budget = self.limits.max_payload_size;
        let mut w = reserve_header_frame(&*ctx, headers, prefix_len, budget)?;
        let compressed = ctx.compress(headers, budget)?;
        check_consumed(compressed.consumed, headers.len())?;
        let fit = self
            .limits
            .fit_whole(FrameType::Headers, compressed.block.len())?;
        let total = prefix_len.checked_add(fit.frame_len).ok_or_else(|| {
            FrameError::Internal("HEADERS frame length overflows usize".to_string())
        })?;
        w.shrink_to(total)?;

        if let Some(id) = push_id {
            w.put_varint(id)?;
        }
        w.put_header(fit.payload_len, FrameType::Headers, 0)?;
        w.put_slice(&compressed.block)?;
        let bytes = finish(w, FrameType::Headers, fit.payload_len)?;
        Ok(EncodedFrame {
            bytes,
            consumed: compressed.consumed,
        })
    }

    /// Create a PRIORITY frame.
    ///
    /// ```text
    /// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /// |                 Prioritized Request ID (i)                  ...
    /// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /// |                  Stream Dependency ID (i)                   ...
    /// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    /// |   Weight (8)  |
    /// +-+-+-+-+-+-+-+-+
    /// ```
    pub fn create_priority_frame(
        &self,
        flags: u8,
        request_id: u64,
        dependency_id: u64,
        weight: u8,
    ) -> Result<Vec<u8>> {
        let payload_len = varint_len(request_id)? + varint_len(dependency_id)? + 1;
        let fit = self.limits.fit_whole(FrameType::Priority, payload_len)?;

        let mut w = FrameWriter::with_capacity(fit.frame_len)?;
        w.put_header(payload_len, FrameType::Priority, flags)?;
        w.put_varint(request_id)?;
        w.put_varint(dependency_id)?;
        w.put_u8(weight)?;
        finish(w, FrameType::Priority, payload_len)
    }

    /// Create a CANCEL_PUSH frame.
    pub fn create_cancel_push_frame(&self, push_id: u64) -> Result<Vec<u8>> {
        self.varint_frame(FrameType::CancelPush, push_id)
    }

    /// Create a SETTINGS frame.
    ///
    /// The whole table must fit in one frame; settings are never split.
    pub fn create_settings_frame(&self, settings: &Settings) -> Result<Vec<u8>> {
        let payload_len = settings.payload_len()?;
        if payload_len > self.limits.max_payload_size {
            return Err(FrameError::Unsupported(format!(
                "SETTINGS payload of {} bytes exceeds max payload size {}",
                payload_len, self.limits.max_payload_size
            )));
        }
        let fit = self.limits.fit_whole(FrameType::Settings, payload_len)?;

        let mut w = FrameWriter::with_capacity(fit.frame_len)?;
        w.put_header(payload_len, FrameType::Settings, 0)?;
        for (id, contents) in settings.iter() {
            w.put_slice(&id.to_be_bytes())?;
            w.put_varint(contents.len() as u64)?;
            w.put_slice(contents)?;
        }
        finish(w, FrameType::Settings, payload_len)
    }

    /// Create a PUSH_PROMISE frame.
    ///
    /// Unlike HEADERS, the push ID is part of the payload. `consumed` is the
    /// number of header entries encoded.
    pub fn create_push_promise_frame<C>(
        &self,
        ctx: &mut C,
        push_id: u64,
        headers: &[Header],
    ) -> Result<EncodedFrame>
    where
        C: HeaderCompressor + ?Sized,
    {
        require_headers(headers)?;
        let id_len = varint_len(push_id)?;

        let budget = self.limits.max_payload_size - id_len;
        let mut w = reserve_header_frame(&*ctx, headers, id_len, budget)?;
        let compressed = ctx.compress(headers, budget)?;
        check_consumed(compressed.consumed, headers.len())?;
        let payload_len = id_len.checked_add(compressed.block.len()).ok_or_else(|| {
            FrameError::Internal("PUSH_PROMISE payload length overflows usize".to_string())
        })?;
        let fit = self.limits.fit_whole(FrameType::PushPromise, payload_len)?;
        w.shrink_to(fit.frame_len)?;

        w.put_header(payload_len, FrameType::PushPromise, 0)?;
        w.put_varint(push_id)?;
        w.put_slice(&compressed.block)?;
        let bytes = finish(w, FrameType::PushPromise, payload_len)?;
        Ok(EncodedFrame {
            bytes,
            consumed: compressed.consumed,
        })
    }

    /// Create a GOAWAY frame naming the last stream that will be processed.
    pub fn create_goaway_frame(&self, last_stream_id: u64) -> Result<Vec<u8>> {
        self.varint_frame(FrameType::Goaway, last_stream_id)
    }

    /// Create a MAX_PUSH_ID frame.
    pub fn create_max_push_id_frame(&self, max_push_id: u64) -> Result<Vec<u8>> {
        self.varint_frame(FrameType::MaxPushId, max_push_id)
    }

    /// A frame whose whole payload is one varint.
    fn varint_frame(&self, frame_type: FrameType, value: u64) -> Result<Vec<u8>> {
        let payload_len = varint_len(value)?;
        let fit = self.limits.fit_whole(frame_type, payload_len)?;

        let mut w = FrameWriter::with_capacity(fit.frame_len)?;
        w.put_header(payload_len, frame_type, 0)?;
        w.put_varint(value)?;
        finish(w, frame_type, payload_len)
    }
}

fn require_headers(headers: &[Header]) -> Result<()> {
    if headers.is_empty() {
        return Err(FrameError::InvalidArgument("empty header list".to_string()));
    }
    Ok(())
}

/// Reserve a header-bearing frame before its block is compressed, so that
/// allocation failure leaves the compression context untouched.
///
/// `fixed_len` is the push ID in front of (HEADERS) or inside
/// (PUSH_PROMISE) the frame; `budget` is what the block may use.
fn reserve_header_frame<C>(
    ctx: &C,
    headers: &[Header],
    fixed_len: usize,
    budget: usize,
) -> Result<FrameWriter>
where
    C: HeaderCompressor + ?Sized,
{
    let block_len = budget.min(ctx.max_block_len(headers));
    let capacity = fixed_len
        .checked_add(MAX_HEADER_LEN)
        .and_then(|n| n.checked_add(block_len))
        .ok_or(FrameError::OutOfMemory {
            requested: usize::MAX,
        })?;
    FrameWriter::with_capacity(capacity)
}

fn check_consumed(consumed: usize, available: usize) -> Result<()> {
    if consumed == 0 || consumed > available {
        return Err(FrameError::Internal(format!(
            "compressor consumed {} of {} header entries",
            consumed, available
        )));
    }
    Ok(())
}

fn finish(w: FrameWriter, frame_type: FrameType, payload_len: usize) -> Result<Vec<u8>> {
    let bytes = w.finish()?;
    tracing::trace!(
        ?frame_type,
        payload_len,
        frame_len = bytes.len(),
        "frame encoded"
    );
    Ok(bytes)
}
