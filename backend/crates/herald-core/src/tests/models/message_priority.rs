use crate::MessagePriority;

use herald_proto::WirePriority;

use std::str::FromStr;

#[test]
fn test_message_priority_rank() {
    assert_eq!(MessagePriority::High.rank(), 1);
    assert_eq!(MessagePriority::Medium.rank(), 2);
    assert_eq!(MessagePriority::Low.rank(), 3);
}

#[test]
fn test_message_priority_orders_high_first() {
    let mut priorities = vec![
        MessagePriority::Low,
        MessagePriority::High,
        MessagePriority::Medium,
    ];
    priorities.sort();

    assert_eq!(
        priorities,
        vec![
            MessagePriority::High,
            MessagePriority::Medium,
            MessagePriority::Low
        ]
    );
}

#[test]
fn test_message_priority_from_rank() {
    assert_eq!(MessagePriority::from_rank(1).unwrap(), MessagePriority::High);
    assert_eq!(MessagePriority::from_rank(3).unwrap(), MessagePriority::Low);
    assert!(MessagePriority::from_rank(0).is_err());
    assert!(MessagePriority::from_rank(4).is_err());
}

#[test]
fn test_message_priority_from_str() {
    assert_eq!(
        MessagePriority::from_str("MEDIUM").unwrap(),
        MessagePriority::Medium
    );
    assert!(MessagePriority::from_str("urgent").is_err());
}

#[test]
fn test_message_priority_unspecified_wire_value_rejected() {
    assert!(MessagePriority::try_from(WirePriority::Unspecified).is_err());
    assert_eq!(
        MessagePriority::try_from(WirePriority::Low).unwrap(),
        MessagePriority::Low
    );
}
