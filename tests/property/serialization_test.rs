// tests/property/serialization_test.rs

//! Property-based tests for the typed payload schemas: for every declared
//! message type and a range of payload sizes, decode(encode(payload)) is the
//! identity.

use bytes::BytesMut;
use mudstone::core::protocol::{
    ClientMessage, Command, CommandType, Frame, FrameCodec, Login, LoginType, MessageKind, Room,
    ServerMessage, ServerMessageKind, Who,
};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

fn arb_login_type() -> impl Strategy<Value = LoginType> {
    prop_oneof![Just(LoginType::Existing), Just(LoginType::New)]
}

fn arb_command_type() -> impl Strategy<Value = CommandType> {
    prop_oneof![
        Just(CommandType::Look),
        Just(CommandType::Move),
        Just(CommandType::Who),
        Just(CommandType::Say),
        Just(CommandType::Tell),
        Just(CommandType::Ooc),
        Just(CommandType::Ignore),
        Just(CommandType::Quit),
    ]
}

/// Round-trips a payload through the full wire path: JSON encode, frame,
/// byte stream, decode, JSON parse.
fn wire_roundtrip<T>(kind: MessageKind, payload: &T) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let frame = Frame::from_payload(kind, payload).unwrap();
    let mut stream = BytesMut::new();
    FrameCodec::new().encode(frame, &mut stream).unwrap();
    let decoded = FrameCodec::new().decode(&mut stream).unwrap().unwrap();
    assert_eq!(decoded.kind, kind.code());
    serde_json::from_slice(&decoded.payload).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_login_roundtrip(
        login_type in arb_login_type(),
        name in ".{0,100}",
        hash in "[a-f0-9]{0,128}",
    ) {
        let login = Login { login_type, name, hash };
        prop_assert_eq!(wire_roundtrip(MessageKind::Login, &login), login);
    }

    #[test]
    fn test_command_roundtrip(
        command_type in arb_command_type(),
        arguments in ".{0,10000}",
    ) {
        let command = Command { command_type, arguments };
        prop_assert_eq!(wire_roundtrip(MessageKind::Command, &command), command);
    }

    #[test]
    fn test_server_message_roundtrip(text in ".{0,10000}") {
        for message_type in [ServerMessageKind::Console, ServerMessageKind::Popup] {
            let message = ServerMessage { message_type, message_text: text.clone() };
            prop_assert_eq!(wire_roundtrip(MessageKind::ServerMessage, &message), message);
        }
    }

    #[test]
    fn test_room_roundtrip(
        title in ".{0,200}",
        description in ".{0,2000}",
        exits in ".{0,100}",
        players in prop::collection::vec(".{1,50}", 0..10),
        mobs in prop::collection::vec(".{1,50}", 0..10),
        items in prop::collection::vec(".{1,50}", 0..10),
    ) {
        let room = Room { title, description, exits, players, mobs, items };
        prop_assert_eq!(wire_roundtrip(MessageKind::Room, &room), room);
    }

    #[test]
    fn test_who_roundtrip(players in prop::collection::vec(".{0,60}", 0..50)) {
        let who = Who { players };
        prop_assert_eq!(wire_roundtrip(MessageKind::Who, &who), who);
    }

    #[test]
    fn test_decoded_command_dispatch_view_matches(
        command_type in arb_command_type(),
        arguments in ".{0,200}",
    ) {
        let command = Command { command_type, arguments };
        let frame = Frame::from_payload(MessageKind::Command, &command).unwrap();
        let message = ClientMessage::try_from(&frame).unwrap();
        prop_assert_eq!(message, ClientMessage::Command(command));
    }
}

/// ASCII bodies near the 16-bit wire limit round-trip; one byte past it is
/// rejected before anything hits the wire.
#[test]
fn test_body_sizes_at_the_wire_limit() {
    // JSON overhead for ServerMessage with MessageType 0:
    // {"MessageType":0,"MessageText":"..."} -> 37 bytes + text.
    let overhead = serde_json::to_vec(&ServerMessage::console("")).unwrap().len();
    let max_text = (u16::MAX as usize) - 4 - overhead;

    let message = ServerMessage::console("x".repeat(max_text));
    let back: ServerMessage = wire_roundtrip(MessageKind::ServerMessage, &message);
    assert_eq!(back, message);

    let too_big = ServerMessage::console("x".repeat(max_text + 1));
    assert!(Frame::from_payload(MessageKind::ServerMessage, &too_big).is_err());
}
