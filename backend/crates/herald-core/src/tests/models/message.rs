use crate::{CoreError, Message, MessagePriority, MessageType};

use herald_proto::{WireMessage, WireMessageType, WirePriority};

use prost::Message as _;

#[test]
fn given_two_messages_when_constructed_then_ids_differ() {
    let first = Message::new(MessageType::Heartbeat);
    let second = Message::new(MessageType::Heartbeat);

    assert!(!first.id().is_empty());
    assert_ne!(first.id(), second.id());
}

#[test]
fn given_control_message_when_constructed_then_no_priority() {
    let message = Message::with_data(MessageType::Heartbeat, "worker-1");

    assert_eq!(message.message_type(), MessageType::Heartbeat);
    assert_eq!(message.priority(), None);
    assert_eq!(message.data(), Some("worker-1"));
}

#[test]
fn given_generated_message_when_inspected_then_push_with_priority_and_payload() {
    let message = Message::generate();

    assert!(message.is_type(MessageType::ServerPush));
    assert!(message.priority().is_some());
    assert!(message.data().is_some_and(|d| !d.is_empty()));
}

#[test]
fn given_response_when_constructed_then_echoes_original_id() {
    let push = Message::server_push(MessagePriority::Low, "payload");
    let response = Message::response(push.id());

    assert_eq!(response.message_type(), MessageType::Response);
    assert_eq!(response.data(), Some(push.id()));
}

#[test]
fn given_push_when_encoded_and_decoded_then_identity_preserved() {
    let push = Message::server_push(MessagePriority::Medium, "payload");

    let decoded = Message::decode(&push.encode()).unwrap();

    assert_eq!(decoded, push);
}

#[test]
fn given_garbage_bytes_when_decoded_then_error() {
    let result = Message::decode(&[0xff, 0xff, 0xff]);

    assert!(result.is_err());
}

#[test]
fn given_push_without_priority_when_converted_then_malformed() {
    let wire = WireMessage {
        id: "abc".into(),
        message_type: WireMessageType::ServerPush as i32,
        priority: None,
        data: Some("payload".into()),
    };

    let result = Message::try_from(wire);

    assert!(matches!(result, Err(CoreError::MalformedMessage { .. })));
}

#[test]
fn given_heartbeat_with_priority_when_converted_then_malformed() {
    let wire = WireMessage {
        id: "abc".into(),
        message_type: WireMessageType::Heartbeat as i32,
        priority: Some(WirePriority::High as i32),
        data: None,
    };

    let result = Message::try_from(wire);

    assert!(matches!(result, Err(CoreError::MalformedMessage { .. })));
}

#[test]
fn given_unknown_type_when_decoded_then_invalid_message_type() {
    let wire = WireMessage {
        id: "abc".into(),
        message_type: 42,
        priority: None,
        data: None,
    };

    let result = Message::decode(&wire.encode_to_vec());

    assert!(matches!(result, Err(CoreError::InvalidMessageType { .. })));
}

#[test]
fn given_empty_id_when_converted_then_malformed() {
    let wire = WireMessage {
        id: String::new(),
        message_type: WireMessageType::Heartbeat as i32,
        priority: None,
        data: None,
    };

    assert!(Message::try_from(wire).is_err());
}
