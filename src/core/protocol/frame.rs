// src/core/protocol/frame.rs

//! Implements the framed wire format and the corresponding `Encoder` and
//! `Decoder` for network communication.
//!
//! Every message starts with a fixed 4-byte header: a little-endian `u16`
//! message kind followed by a little-endian `u16` total length, where the
//! length counts the header itself. The body, when present, is UTF-8 JSON.
//! A header whose length equals [`HEADER_LEN`] carries no body at all; kind
//! `0` with an empty body is the heartbeat.

use crate::core::MudstoneError;
use crate::core::protocol::message::MessageKind;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};

/// Size of the fixed message header.
pub const HEADER_LEN: usize = 4;

/// Largest encodable message (header included), bounded by the 16-bit length field.
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// The heartbeat message, encoded once. Both the periodic scheduler and the
/// inbound heartbeat echo reuse these bytes.
pub static HEARTBEAT_BYTES: Lazy<Bytes> = Lazy::new(|| {
    Frame::heartbeat()
        .encode_to_bytes()
        .expect("a header-only frame always fits the wire limit")
});

/// The fixed prefix carried by every wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Application-defined message kind code; `0` is reserved for the heartbeat.
    pub kind: u16,
    /// Total message length including this header. Minimum legal value is 4.
    pub length: u16,
}

impl Header {
    /// Packs the header fields into little-endian byte order:
    /// `[kind(low)][kind(high)][length(low)][length(high)]`.
    pub fn pack(&self) -> [u8; HEADER_LEN] {
        [
            (self.kind & 0xFF) as u8,
            ((self.kind >> 8) & 0xFF) as u8,
            (self.length & 0xFF) as u8,
            ((self.length >> 8) & 0xFF) as u8,
        ]
    }

    /// Inverse of [`Header::pack`]. The slice must hold at least 4 bytes.
    pub fn unpack(bytes: &[u8]) -> Self {
        Self {
            kind: u16::from(bytes[0]) | (u16::from(bytes[1]) << 8),
            length: u16::from(bytes[2]) | (u16::from(bytes[3]) << 8),
        }
    }
}

/// A complete wire message: the raw kind code and its (possibly empty) body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: u16,
    pub payload: Bytes,
}

impl Frame {
    /// The header-only liveness message.
    pub fn heartbeat() -> Self {
        Self {
            kind: MessageKind::Heartbeat.code(),
            payload: Bytes::new(),
        }
    }

    /// Serializes `payload` to JSON and wraps it in a frame of the given kind.
    pub fn from_payload<T: Serialize>(kind: MessageKind, payload: &T) -> Result<Self, MudstoneError> {
        let body = serde_json::to_vec(payload).map_err(|e| MudstoneError::Encoding(e.to_string()))?;
        if HEADER_LEN + body.len() > MAX_MESSAGE_LEN {
            return Err(MudstoneError::MessageTooLarge(HEADER_LEN + body.len()));
        }
        Ok(Self {
            kind: kind.code(),
            payload: Bytes::from(body),
        })
    }

    /// A convenience method to encode a frame into a `Bytes` buffer.
    /// Useful for broadcast paths that send the same encoded message to many
    /// connections.
    pub fn encode_to_bytes(&self) -> Result<Bytes, MudstoneError> {
        let mut buf = BytesMut::new();
        FrameCodec::new().encode(self.clone(), &mut buf)?;
        Ok(buf.freeze())
    }
}

/// The decoder's position within the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Waiting for the next 4-byte header.
    AwaitingHeader,
    /// Header consumed; waiting for exactly `remaining` body bytes.
    AwaitingBody { kind: u16, remaining: usize },
}

/// A `tokio_util::codec` implementation for encoding and decoding [`Frame`]s.
///
/// The decoder is a two-state machine over the growable buffer the codec is
/// handed: it consumes exactly 4 bytes per header and exactly the announced
/// remainder per body, so an arbitrarily-chunked read can never bleed into
/// the next message. Header-only messages are emitted without waiting for
/// further bytes.
#[derive(Debug)]
pub struct FrameCodec {
    state: DecodeState,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            state: DecodeState::AwaitingHeader,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = MudstoneError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let total = HEADER_LEN + item.payload.len();
        if total > MAX_MESSAGE_LEN {
            return Err(MudstoneError::MessageTooLarge(total));
        }
        let header = Header {
            kind: item.kind,
            length: total as u16,
        };
        dst.reserve(total);
        dst.put_slice(&header.pack());
        dst.extend_from_slice(&item.payload);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = MudstoneError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::AwaitingHeader => {
                    if src.len() < HEADER_LEN {
                        return Ok(None);
                    }
                    let header = Header::unpack(&src[..HEADER_LEN]);
                    src.advance(HEADER_LEN);

                    let total = header.length as usize;
                    if total < HEADER_LEN {
                        return Err(MudstoneError::Protocol(format!(
                            "header length {total} is below the {HEADER_LEN}-byte minimum"
                        )));
                    }
                    if total == HEADER_LEN {
                        // Header-only message (e.g. heartbeat): complete as-is.
                        return Ok(Some(Frame {
                            kind: header.kind,
                            payload: Bytes::new(),
                        }));
                    }
                    self.state = DecodeState::AwaitingBody {
                        kind: header.kind,
                        remaining: total - HEADER_LEN,
                    };
                }
                DecodeState::AwaitingBody { kind, remaining } => {
                    if src.len() < remaining {
                        return Ok(None);
                    }
                    // Consume exactly the remaining need, never past the
                    // message boundary.
                    let payload = src.split_to(remaining).freeze();
                    self.state = DecodeState::AwaitingHeader;
                    return Ok(Some(Frame { kind, payload }));
                }
            }
        }
    }
}
