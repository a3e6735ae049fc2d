//! Tests for HPACK decompression

use hq_sans_io::{FrameError, Header, HpackDecompressor};

#[test]
fn test_decompress_indexed_header() {
    let mut decompressor = HpackDecompressor::new();

    // 0x82 = indexed header, index 2 = :method: GET
    let headers = decompressor.decompress(&[0x82]).unwrap();

    assert_eq!(headers, vec![Header::new(":method", "GET")]);
}

#[test]
fn test_decompress_multiple_indexed_headers() {
    let mut decompressor = HpackDecompressor::new();

    // 0x82 = :method: GET, 0x86 = :scheme: http, 0x84 = :path: /
    let headers = decompressor.decompress(&[0x82, 0x86, 0x84]).unwrap();

    assert_eq!(
        headers,
        vec![
            Header::new(":method", "GET"),
            Header::new(":scheme", "http"),
            Header::new(":path", "/"),
        ]
    );
}

#[test]
fn test_decompress_literal_with_indexing() {
    let mut decompressor = HpackDecompressor::new();

    let data = [
        0x40, // Literal with indexing, new name
        0x06, // Name length: 6
        b'c', b'u', b's', b't', b'o', b'm',
        0x05, // Value length: 5
        b'v', b'a', b'l', b'u', b'e',
    ];
    let headers = decompressor.decompress(&data).unwrap();
    assert_eq!(headers, vec![Header::new("custom", "value")]);

    // The entry went into the dynamic table at index 62.
    let again = decompressor.decompress(&[0xbe]).unwrap();
    assert_eq!(again, vec![Header::new("custom", "value")]);
}

#[test]
fn test_decompress_non_utf8_value() {
    let mut decompressor = HpackDecompressor::new();

    // Literal without indexing, new name "x" with value 0xff 0xfe.
    let data = [0x00, 0x01, b'x', 0x02, 0xff, 0xfe];
    let headers = decompressor.decompress(&data).unwrap();
    assert_eq!(headers[0].value, vec![0xff, 0xfe]);
}

#[test]
fn test_decompress_truncated_block() {
    let mut decompressor = HpackDecompressor::new();

    // Claims a 6-byte name but carries 2.
    let result = decompressor.decompress(&[0x40, 0x06, b'c', b'u']);
    assert!(matches!(result, Err(FrameError::Compression(_))));
}
