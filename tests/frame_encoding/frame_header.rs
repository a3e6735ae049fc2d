//! Tests for frame header building and frame sizing

use hq_sans_io::{
    build_header, decode_varint, header_len, varint_len, FrameLimits, FrameType,
    DEFAULT_MAX_PAYLOAD_SIZE, MAX_HEADER_LEN,
};

#[test]
fn test_build_header_split_roundtrip() {
    let types = [
        FrameType::Data,
        FrameType::Headers,
        FrameType::Priority,
        FrameType::CancelPush,
        FrameType::Settings,
        FrameType::PushPromise,
        FrameType::Goaway,
        FrameType::MaxPushId,
    ];
    let lengths = [0usize, 5, 63, 64, 16383, 16384, 1 << 30];

    for &frame_type in &types {
        for &len in &lengths {
            for flags in [0u8, 0x1, 0xff] {
                let mut buf = [0u8; MAX_HEADER_LEN];
                let n = build_header(len, frame_type, flags, &mut buf).unwrap();
                assert_eq!(n, varint_len(len as u64).unwrap() + 2);
                assert_eq!(n, header_len(len).unwrap());

                let (decoded_len, off) = decode_varint(&buf[..n]).unwrap();
                assert_eq!(decoded_len, len as u64);
                assert_eq!(FrameType::try_from(buf[off]).unwrap(), frame_type);
                assert_eq!(buf[off + 1], flags);
                assert_eq!(off + 2, n);
            }
        }
    }
}

#[test]
fn test_fit_frame_exact() {
    let limits = FrameLimits::default();
    for len in [0usize, 1, 63, 64, 1000, DEFAULT_MAX_PAYLOAD_SIZE] {
        let fit = limits.fit_frame(len);
        assert_eq!(fit.payload_len, len);
        assert_eq!(fit.frame_len, header_len(len).unwrap() + len);
    }
}

#[test]
fn test_fit_frame_never_exceeds_limit() {
    let limits = FrameLimits::new(1000).unwrap();
    for len in [1001usize, 5000, 1 << 40, usize::MAX] {
        let fit = limits.fit_frame(len);
        assert_eq!(fit.payload_len, 1000);
        assert_eq!(fit.frame_len, 1000 + 4);
    }
}

#[test]
fn test_default_limits() {
    assert_eq!(
        FrameLimits::default().max_payload_size(),
        DEFAULT_MAX_PAYLOAD_SIZE
    );
}
