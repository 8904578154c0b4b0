// tests/property/framing_test.rs

//! Property-based tests for the wire framing layer.

use bytes::{Bytes, BytesMut};
use mudstone::core::protocol::{Frame, FrameCodec, HEADER_LEN, Header};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

/// Frames with arbitrary kinds and bodies (empty bodies included).
fn arb_frame() -> impl Strategy<Value = Frame> {
    (0u16..=9, prop::collection::vec(any::<u8>(), 0..2048)).prop_map(|(kind, body)| Frame {
        kind,
        payload: Bytes::from(body),
    })
}

fn encode_all(frames: &[Frame]) -> Vec<u8> {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::new();
    for frame in frames {
        codec.encode(frame.clone(), &mut buf).unwrap();
    }
    buf.to_vec()
}

/// Splits `stream` at the given cut points and feeds the pieces to a fresh
/// decoder, collecting every completed frame.
fn feed_split(stream: &[u8], cuts: &[usize]) -> Vec<Frame> {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::new();
    let mut out = Vec::new();
    let mut start = 0;
    let mut boundaries: Vec<usize> = cuts.iter().map(|c| c % (stream.len() + 1)).collect();
    boundaries.sort_unstable();
    boundaries.push(stream.len());
    for end in boundaries {
        if end > start {
            buf.extend_from_slice(&stream[start..end]);
            start = end;
        }
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            out.push(frame);
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_header_pack_unpack_roundtrip(kind in any::<u16>(), length in 4u16..) {
        let header = Header { kind, length };
        prop_assert_eq!(Header::unpack(&header.pack()), header);
    }

    #[test]
    fn test_single_frame_survives_any_split(
        frame in arb_frame(),
        cuts in prop::collection::vec(any::<usize>(), 0..8),
    ) {
        let stream = encode_all(std::slice::from_ref(&frame));
        let decoded = feed_split(&stream, &cuts);
        prop_assert_eq!(decoded, vec![frame]);
    }

    #[test]
    fn test_message_sequence_survives_any_split(
        frames in prop::collection::vec(arb_frame(), 1..8),
        cuts in prop::collection::vec(any::<usize>(), 0..16),
    ) {
        let stream = encode_all(&frames);
        let decoded = feed_split(&stream, &cuts);
        prop_assert_eq!(decoded, frames);
    }

    #[test]
    fn test_byte_by_byte_equals_single_chunk(frames in prop::collection::vec(arb_frame(), 1..5)) {
        let stream = encode_all(&frames);

        let whole = feed_split(&stream, &[]);
        let trickled = {
            let mut codec = FrameCodec::new();
            let mut buf = BytesMut::new();
            let mut out = Vec::new();
            for byte in &stream {
                buf.extend_from_slice(&[*byte]);
                while let Some(frame) = codec.decode(&mut buf).unwrap() {
                    out.push(frame);
                }
            }
            out
        };
        prop_assert_eq!(whole, trickled);
    }

    #[test]
    fn test_encoded_length_field_matches_reality(frame in arb_frame()) {
        let stream = encode_all(std::slice::from_ref(&frame));
        let header = Header::unpack(&stream[..HEADER_LEN]);
        prop_assert_eq!(header.kind, frame.kind);
        prop_assert_eq!(header.length as usize, stream.len());
        prop_assert_eq!(header.length as usize, HEADER_LEN + frame.payload.len());
    }
}
