//! hq-sans-io: A minimal, sans-I/O frame encoder for HTTP over QUIC
//!
//! This crate turns typed protocol messages into wire-ready frames for an
//! HTTP/3-style (hq) connection. It performs no I/O and keeps no connection
//! state: every call returns an owned buffer that the caller writes to a
//! QUIC stream however it likes.
//!
//! # Features
//!
//! - **Sans-I/O Design**: No async runtime, no transport, no sockets
//! - **All hq frame types**: DATA, HEADERS, PRIORITY, CANCEL_PUSH, SETTINGS,
//!   PUSH_PROMISE, GOAWAY, MAX_PUSH_ID
//! - **QUIC varints**: 1/2/4/8-byte variable-length integers
//! - **HPACK Support**: Header compression via fluke-hpack, behind a trait
//! - **No panics on input**: sizes are checked before allocation and every
//!   write is bounds-checked
//!
//! # Quick Start
//!
//! ```rust
//! use hq_sans_io::{FrameEncoder, Header, HpackCompressor};
//!
//! let encoder = FrameEncoder::new();
//! let mut hpack = HpackCompressor::new();
//!
//! let headers = vec![Header::new(":status", "200")];
//! let frame = encoder.create_headers_frame(&mut hpack, None, &headers).unwrap();
//! assert_eq!(frame.consumed, 1);
//!
//! let body = b"hello";
//! let data = encoder.create_data_frame(body).unwrap();
//! assert_eq!(data.consumed, body.len());
//! assert_eq!(&data.bytes[data.bytes.len() - 5..], body);
//! ```
//!
//! # Splitting
//!
//! A frame never carries more than [`FrameLimits::max_payload_size`] payload
//! bytes. DATA and header-bearing encoders report how much input went into
//! the frame through [`EncodedFrame::consumed`]; call again with the rest.
//!
//! It does NOT provide:
//! - Frame parsing (you get bytes out, not events)
//! - QUIC streams or connection management (your responsibility)

pub mod error;
pub mod frame;
pub mod hpack;
pub mod varint;
mod writer;

pub use error::{FrameError, Result};

pub use frame::{
    build_header, flags, header_len, settings_id, EncodedFrame, FrameEncoder, FrameFit,
    FrameLimits, FrameType, Settings, DEFAULT_MAX_PAYLOAD_SIZE, MAX_HEADER_LEN,
    MAX_PAYLOAD_SIZE_LIMIT, MIN_PAYLOAD_SIZE,
};

pub use hpack::{CompressedBlock, Header, HeaderCompressor, HpackCompressor, HpackDecompressor};

pub use varint::{decode_varint, encode_varint, varint_len, MAX_VARINT, MAX_VARINT_LEN};
