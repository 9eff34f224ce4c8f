use crate::MessageType;

use herald_proto::WireMessageType;

use std::str::FromStr;

#[test]
fn test_message_type_as_str() {
    assert_eq!(MessageType::Heartbeat.as_str(), "HEARTBEAT");
    assert_eq!(MessageType::ServerPush.as_str(), "SERVER_PUSH");
    assert_eq!(MessageType::Deregister.as_str(), "DEREGISTER");
}

#[test]
fn test_message_type_from_str() {
    assert_eq!(
        MessageType::from_str("RESPONSE").unwrap(),
        MessageType::Response
    );
    assert_eq!(
        MessageType::from_str("REGISTERED").unwrap(),
        MessageType::Registered
    );
    assert!(MessageType::from_str("heartbeat").is_err());
}

#[test]
fn test_message_type_wire_mapping() {
    assert_eq!(
        WireMessageType::from(MessageType::ServerPush),
        WireMessageType::ServerPush
    );
    assert!(MessageType::try_from(WireMessageType::Unspecified).is_err());
}
