use crate::tests::connection_pair;
use crate::{BrokerError, ConnectionState};

use herald_core::{Message, MessagePriority, MessageType};

use std::time::Duration;

use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn given_pair_when_sent_both_ways_then_received_in_order() {
    // Given
    let (broker, worker) = connection_pair();
    let push = Message::server_push(MessagePriority::High, "first");
    let heartbeat = Message::new(MessageType::Heartbeat);

    // When
    broker.send(&push).await.unwrap();
    broker.send(&heartbeat).await.unwrap();
    worker.send(&Message::response(push.id())).await.unwrap();

    // Then
    assert_eq!(worker.receive().await.unwrap(), push);
    assert_eq!(worker.receive().await.unwrap(), heartbeat);
    let reply = broker.receive().await.unwrap();
    assert_eq!(reply.data(), Some(push.id()));
}

#[tokio::test]
async fn given_peer_deregisters_when_read_then_state_changes_and_message_is_kept() {
    // Given
    let (broker, worker) = connection_pair();
    let mut changes = broker.state_changes();

    // When
    worker
        .send(&Message::new(MessageType::Deregister))
        .await
        .unwrap();
    timeout(
        WAIT,
        changes.wait_for(|state| *state == ConnectionState::Deregistered),
    )
    .await
    .unwrap()
    .unwrap();

    // Then
    let message = broker.receive().await.unwrap();
    assert!(message.is_type(MessageType::Deregister));
    assert_eq!(broker.state(), ConnectionState::Deregistered);
}

#[tokio::test]
async fn given_peer_dropped_when_receive_then_connection_closed_error() {
    // Given
    let (broker, worker) = connection_pair();

    // When
    worker.close();
    drop(worker);

    // Then
    let error = timeout(WAIT, broker.receive()).await.unwrap().unwrap_err();
    assert!(error.is_connection_fault());
    timeout(WAIT, broker.closed()).await.unwrap();
    assert!(broker.is_closed());
}

#[tokio::test]
async fn given_closed_connection_when_send_then_error() {
    let (broker, _worker) = connection_pair();

    broker.close();
    let result = broker.send(&Message::new(MessageType::Heartbeat)).await;

    assert!(matches!(result, Err(BrokerError::ConnectionClosed { .. })));
}

#[tokio::test]
async fn given_queued_frames_when_closed_then_still_receivable() {
    // Given
    let (broker, worker) = connection_pair();
    let push = Message::server_push(MessagePriority::Low, "late");
    broker.send(&push).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // When
    worker.close();

    // Then
    assert_eq!(worker.receive().await.unwrap(), push);
    assert!(worker.receive().await.is_err());
}

#[tokio::test]
async fn given_stale_replies_when_discarded_then_next_receive_sees_fresh_message() {
    // Given
    let (broker, worker) = connection_pair();
    worker.send(&Message::response("old-1")).await.unwrap();
    worker.send(&Message::response("old-2")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // When
    let discarded = broker.discard_pending();
    worker.send(&Message::response("fresh")).await.unwrap();

    // Then
    assert_eq!(discarded, 2);
    let reply = broker.receive().await.unwrap();
    assert_eq!(reply.data(), Some("fresh"));
}

#[tokio::test]
async fn given_outbound_held_when_other_send_then_it_waits() {
    // Given
    let (broker, worker) = connection_pair();
    let mut outbound = broker.outbound().await;

    // When
    let blocked = timeout(
        Duration::from_millis(50),
        broker.send(&Message::new(MessageType::Heartbeat)),
    )
    .await;
    outbound
        .send(&Message::new(MessageType::Registered))
        .await
        .unwrap();
    drop(outbound);

    // Then
    assert!(blocked.is_err());
    let first = worker.receive().await.unwrap();
    assert!(first.is_type(MessageType::Registered));
}

#[tokio::test]
async fn given_queued_deregister_when_shutdown_then_peer_reads_it_before_close() {
    // Given
    let (broker, worker) = connection_pair();
    worker
        .send(&Message::new(MessageType::Deregister))
        .await
        .unwrap();

    // When
    worker.shutdown().await.unwrap();

    // Then
    assert!(worker.is_closed());
    let message = timeout(WAIT, broker.receive()).await.unwrap().unwrap();
    assert!(message.is_type(MessageType::Deregister));
    let ended = timeout(WAIT, broker.receive()).await.unwrap();
    assert!(matches!(ended, Err(BrokerError::ConnectionClosed { .. })));
    broker.closed().await;
}
