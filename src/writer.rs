//! Exact-size output buffer for one frame.
//!
//! Every encoder computes the final frame length up front, reserves exactly
//! that much, and then writes through a [`FrameWriter`]. Header-bearing
//! frames only learn their length from the compressor, so they reserve an
//! upper bound first and narrow it with [`FrameWriter::shrink_to`]. A write that would
//! pass the reserved length is rejected instead of growing the buffer, and
//! [`FrameWriter::finish`] refuses to hand back a buffer that was not filled
//! completely. Either case means the size arithmetic disagrees with the
//! layout, which is reported as [`FrameError::Internal`].

use crate::error::{FrameError, Result};
use crate::frame::{build_header, FrameType};
use crate::varint::{encode_varint, MAX_VARINT_LEN};

pub(crate) struct FrameWriter {
    buf: Vec<u8>,
    capacity: usize,
}

impl FrameWriter {
    /// Reserve exactly `capacity` bytes, reporting allocation failure.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| FrameError::OutOfMemory { requested: capacity })?;
        Ok(Self { buf, capacity })
    }

    /// Narrow the frame to `len` bytes once its real size is known.
    ///
    /// The allocation is kept; only the length `finish` insists on changes.
    pub(crate) fn shrink_to(&mut self, len: usize) -> Result<()> {
        if len > self.capacity || len < self.buf.len() {
            tracing::warn!(
                capacity = self.capacity,
                written = self.buf.len(),
                requested = len,
                "frame length outside reserved range"
            );
            return Err(FrameError::Internal(format!(
                "frame of {} bytes does not fit the {} reserved",
                len, self.capacity
            )));
        }
        self.capacity = len;
        Ok(())
    }

    pub(crate) fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            tracing::warn!(
                capacity = self.capacity,
                written = self.buf.len(),
                requested = n,
                "frame write past reserved length"
            );
            return Err(FrameError::Internal(format!(
                "write of {} bytes at offset {} overruns frame of {} bytes",
                n,
                self.buf.len(),
                self.capacity
            )));
        }
        Ok(())
    }

    pub(crate) fn put_u8(&mut self, byte: u8) -> Result<()> {
        self.ensure(1)?;
        self.buf.push(byte);
        Ok(())
    }

    pub(crate) fn put_slice(&mut self, data: &[u8]) -> Result<()> {
        self.ensure(data.len())?;
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub(crate) fn put_varint(&mut self, value: u64) -> Result<()> {
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let n = encode_varint(value, &mut scratch)?;
        self.put_slice(&scratch[..n])
    }

    /// Write a frame header for a payload of `payload_len` bytes.
    pub(crate) fn put_header(
        &mut self,
        payload_len: usize,
        frame_type: FrameType,
        flags: u8,
    ) -> Result<()> {
        let mut scratch = [0u8; MAX_VARINT_LEN + 2];
        let n = build_header(payload_len, frame_type, flags, &mut scratch)?;
        self.put_slice(&scratch[..n])
    }

    /// Hand back the buffer, provided it was filled to the reserved length.
    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        if self.buf.len() != self.capacity {
            tracing::warn!(
                capacity = self.capacity,
                written = self.buf.len(),
                "frame underfilled"
            );
            return Err(FrameError::Internal(format!(
                "frame of {} bytes only has {} bytes written",
                self.capacity,
                self.buf.len()
            )));
        }
        Ok(self.buf)
    }
}
