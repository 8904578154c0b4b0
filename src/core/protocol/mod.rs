// src/core/protocol/mod.rs

pub mod frame;
pub mod message;

pub use frame::{Frame, FrameCodec, HEADER_LEN, HEARTBEAT_BYTES, Header, MAX_MESSAGE_LEN};
pub use message::{
    Ack, AckKind, ClientMessage, Command, CommandType, Login, LoginType, MessageKind, Room,
    ServerMessage, ServerMessageKind, Who,
};
