//! Round-trip and conformance tests for the frame container.

use zframe::{
    FrameDecoder, FrameEncoder, StoreCodec, ZframeError, compress, compress_no_checksum,
    decompress, parse_frame_header,
};

#[test]
fn test_empty_input() {
    let input = b"";
    let frame = compress(input).unwrap();
    assert_eq!(decompress(&frame).unwrap(), input);
}

#[test]
fn test_single_byte() {
    let input = b"a";
    let frame = compress(input).unwrap();
    assert_eq!(decompress(&frame).unwrap(), input);

    let header = parse_frame_header(&frame).unwrap();
    assert_eq!(header.content_size.value(), Some(1));
}

#[test]
fn test_typical_string() {
    let input = b"hello, world! my name is bailey";
    let frame = compress(input).unwrap();
    assert_eq!(decompress(&frame).unwrap(), input);
}

#[test]
fn test_repeated_content_shrinks() {
    let input = vec![b'a'; 1000];
    let frame = compress(&input).unwrap();

    // One repeated byte must not travel as a Raw block.
    assert!(
        frame.len() < input.len() / 10,
        "1000 repeated bytes produced a {} byte frame",
        frame.len()
    );
    assert_eq!(decompress(&frame).unwrap(), input);
}

#[test]
fn test_binary_patterns_roundtrip() {
    let cases: Vec<Vec<u8>> = vec![
        vec![0],
        vec![1, 2, 3, 4, 5],
        (0u8..=255).collect(),
        (0u32..10_000).flat_map(|i| i.to_le_bytes()).collect(),
        vec![0xFF; 128 * 1024 + 17],
    ];
    for input in cases {
        let frame = compress(&input).unwrap();
        assert_eq!(decompress(&frame).unwrap(), input, "len {}", input.len());
    }
}

#[test]
fn test_header_introspection_without_blocks() {
    let frame = compress(b"hello, world! my name is bailey").unwrap();
    let header = parse_frame_header(&frame).unwrap();

    assert_eq!(header.content_size.value(), Some(31));
    assert!(header.checksum);
    assert!(header.single_segment());

    // The header parses from the header bytes alone even though every
    // block byte is missing.
    let header_only = &frame[..header.header_len];
    let reparsed = parse_frame_header(header_only).unwrap();
    assert_eq!(reparsed, header);
    assert!(decompress(header_only).is_err());
}

#[test]
fn test_checksum_policy_is_on_by_default() {
    assert!(parse_frame_header(&compress(b"x").unwrap()).unwrap().checksum);
    assert!(
        !parse_frame_header(&compress_no_checksum(b"x").unwrap())
            .unwrap()
            .checksum
    );
}

#[test]
fn test_store_codec_frames_decode_anywhere() {
    // Frames built on the trivial codec contain only Raw and RLE blocks,
    // so a decoder with either codec reads them.
    let data = b"interchangeable blocks".repeat(100);
    let frame = FrameEncoder::new(StoreCodec::new()).compress(&data).unwrap();

    assert_eq!(decompress(&frame).unwrap(), data);
    assert_eq!(
        FrameDecoder::new(StoreCodec::new()).decompress(&frame).unwrap(),
        data
    );
}

#[test]
fn test_truncation_always_fails() {
    let input = b"hello, world! my name is bailey";
    let frame = compress(input).unwrap();

    for cut in 0..frame.len() {
        match decompress(&frame[..cut]) {
            Err(ZframeError::FrameFormat { .. }) | Err(ZframeError::IncompleteFrame { .. }) => {}
            Err(other) => panic!("cut at {cut}: unexpected error kind {other:?}"),
            Ok(_) => panic!("cut at {cut}: truncated frame decoded successfully"),
        }
    }
}

#[test]
fn test_truncation_of_undeclared_size_frame_fails() {
    let input = b"no declared size here";
    let mut encoder = FrameEncoder::new(StoreCodec::new());
    encoder.set_content_size(false);
    let frame = encoder.compress(input).unwrap();
    assert_eq!(decompress(&frame).unwrap(), input);

    for cut in 0..frame.len() {
        assert!(
            decompress(&frame[..cut]).is_err(),
            "cut at {cut} decoded successfully"
        );
    }
}

#[test]
fn test_block_region_corruption_never_returns_wrong_bytes() {
    let input = b"hello, world! my name is bailey";
    let frame = compress(input).unwrap();
    let header_len = parse_frame_header(&frame).unwrap().header_len;

    // Flip one bit per byte position across blocks and trailer; the header
    // stays intact so the checksum is always demanded.
    for position in header_len..frame.len() {
        let mut corrupted = frame.clone();
        corrupted[position] ^= 0x01;
        assert!(
            decompress(&corrupted).is_err(),
            "flip at {position} went unnoticed"
        );
    }
}

#[test]
fn test_multi_block_content() {
    let input: Vec<u8> = (0..400_000u32).map(|i| (i % 249) as u8).collect();
    let frame = compress(&input).unwrap();
    assert_eq!(decompress(&frame).unwrap(), input);

    let header = parse_frame_header(&frame).unwrap();
    assert_eq!(header.content_size.value(), Some(input.len() as u64));
}

#[test]
fn test_headers_differ_but_content_agrees() {
    // The same logical content in two header variants: declared size and
    // undeclared size. Byte-level header equality is not a goal; content
    // equality is.
    let input = b"same content, different headers";

    let declared = compress_no_checksum(input).unwrap();
    let mut encoder = FrameEncoder::new(StoreCodec::new());
    encoder.set_content_size(false).set_checksum(false);
    let undeclared = encoder.compress(input).unwrap();

    assert_ne!(declared, undeclared);
    assert_eq!(decompress(&declared).unwrap(), decompress(&undeclared).unwrap());
}
