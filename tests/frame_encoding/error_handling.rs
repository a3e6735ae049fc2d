//! Tests for encoder error handling

use hq_sans_io::{
    CompressedBlock, FrameEncoder, FrameError, FrameLimits, Header, HeaderCompressor, Settings,
    MAX_PAYLOAD_SIZE_LIMIT, MAX_VARINT,
};

/// Counts calls so tests can check nothing was compressed.
#[derive(Default)]
struct CountingCompressor {
    calls: usize,
}

impl HeaderCompressor for CountingCompressor {
    fn compress(&mut self, headers: &[Header], _budget: usize) -> hq_sans_io::Result<CompressedBlock> {
        self.calls += 1;
        Ok(CompressedBlock {
            block: vec![0x82],
            consumed: headers.len(),
        })
    }
}

#[test]
fn test_empty_header_list_headers() {
    let encoder = FrameEncoder::new();
    let mut ctx = CountingCompressor::default();

    let result = encoder.create_headers_frame(&mut ctx, None, &[]);
    assert!(matches!(result, Err(FrameError::InvalidArgument(_))));
    assert_eq!(ctx.calls, 0);
}

#[test]
fn test_empty_header_list_push_promise() {
    let encoder = FrameEncoder::new();
    let mut ctx = CountingCompressor::default();

    let result = encoder.create_push_promise_frame(&mut ctx, 3, &[]);
    assert!(matches!(result, Err(FrameError::InvalidArgument(_))));
    assert_eq!(ctx.calls, 0);
}

#[test]
fn test_push_promise_push_id_overflow() {
    let encoder = FrameEncoder::new();
    let mut ctx = CountingCompressor::default();
    let headers = vec![Header::new(":path", "/")];

    let result = encoder.create_push_promise_frame(&mut ctx, MAX_VARINT + 1, &headers);
    assert_eq!(
        result,
        Err(FrameError::EncodingOverflow { value: MAX_VARINT + 1 })
    );
    assert_eq!(ctx.calls, 0);
}

#[test]
fn test_varint_frames_overflow() {
    let encoder = FrameEncoder::new();
    let too_big = 1u64 << 62;
    let expected = Err(FrameError::EncodingOverflow { value: too_big });

    assert_eq!(encoder.create_cancel_push_frame(too_big), expected);
    assert_eq!(encoder.create_goaway_frame(too_big), expected);
    assert_eq!(encoder.create_max_push_id_frame(too_big), expected);
    assert_eq!(encoder.create_priority_frame(0, too_big, 0, 0), expected);
    assert_eq!(encoder.create_priority_frame(0, 0, too_big, 0), expected);
}

#[test]
fn test_oversized_settings_unsupported() {
    let encoder = FrameEncoder::with_limits(FrameLimits::new(64).unwrap());
    let mut settings = Settings::new();
    for id in 0..20u16 {
        settings.insert(id, vec![0u8; 4]);
    }

    let result = encoder.create_settings_frame(&settings);
    assert!(matches!(result, Err(FrameError::Unsupported(_))));
}

#[test]
fn test_header_field_too_large_for_frame() {
    let encoder = FrameEncoder::with_limits(FrameLimits::new(64).unwrap());
    let mut ctx = hq_sans_io::HpackCompressor::new();
    let headers = vec![Header::new("x-huge", vec![b'h'; 500])];

    let result = encoder.create_headers_frame(&mut ctx, None, &headers);
    assert!(matches!(result, Err(FrameError::InvalidArgument(_))));
}

#[test]
fn test_allocation_failure_leaves_context_untouched() {
    let encoder = FrameEncoder::with_limits(FrameLimits::new(MAX_PAYLOAD_SIZE_LIMIT).unwrap());
    let mut ctx = CountingCompressor::default();
    let headers = vec![Header::new(":path", "/")];

    let result = encoder.create_headers_frame(&mut ctx, Some(2), &headers);
    assert!(matches!(result, Err(FrameError::OutOfMemory { .. })));
    let result = encoder.create_push_promise_frame(&mut ctx, 2, &headers);
    assert!(matches!(result, Err(FrameError::OutOfMemory { .. })));
    assert_eq!(ctx.calls, 0);
}

#[test]
fn test_header_field_error_reports_encoded_size() {
    let encoder = FrameEncoder::with_limits(FrameLimits::new(32).unwrap());
    let mut ctx = hq_sans_io::HpackCompressor::new();
    let headers = vec![Header::new("x-field", vec![b'f'; 30])];

    let err = encoder
        .create_headers_frame(&mut ctx, None, &headers)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid argument: header field may encode to 40 bytes, more than the 32 byte header block"
    );
}

#[test]
fn test_invalid_limits() {
    assert!(matches!(
        FrameLimits::new(0),
        Err(FrameError::InvalidArgument(_))
    ));
}
