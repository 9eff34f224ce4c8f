use crate::tests::connection_pair;
use crate::{BrokerError, WorkerRegistry};

use std::time::Duration;

use tokio::time::timeout;

#[tokio::test]
async fn given_free_name_when_register_then_entry_present() {
    // Given
    let registry = WorkerRegistry::new();
    let (connection, _worker) = connection_pair();

    // When
    let guard = registry.try_register("alpha", &connection).unwrap();

    // Then
    assert!(registry.contains("alpha"));
    assert_eq!(registry.len(), 1);
    assert_eq!(guard.name(), "alpha");
    assert_eq!(guard.connection_id(), connection.id());
    assert_eq!(registry.get("alpha").unwrap().id(), connection.id());
}

#[tokio::test]
async fn given_taken_name_when_register_then_rejected_and_first_kept() {
    // Given
    let registry = WorkerRegistry::new();
    let (first, _w1) = connection_pair();
    let (second, _w2) = connection_pair();
    let _guard = registry.try_register("alpha", &first).unwrap();

    // When
    let result = registry.try_register("alpha", &second);

    // Then
    assert!(matches!(result, Err(BrokerError::HandshakeRejected { .. })));
    assert_eq!(registry.get("alpha").unwrap().id(), first.id());
}

#[tokio::test]
async fn given_empty_name_when_register_then_rejected() {
    let registry = WorkerRegistry::new();
    let (connection, _worker) = connection_pair();

    let result = registry.try_register("", &connection);

    assert!(result.is_err());
    assert!(registry.is_empty());
}

#[tokio::test]
async fn given_guard_when_dropped_then_entry_released() {
    let registry = WorkerRegistry::new();
    let (connection, _worker) = connection_pair();
    let guard = registry.try_register("alpha", &connection).unwrap();

    drop(guard);

    assert!(!registry.contains("alpha"));
}

#[tokio::test]
async fn given_name_reused_by_new_connection_when_old_guard_dropped_then_new_entry_kept() {
    // Given
    let registry = WorkerRegistry::new();
    let (old, _w1) = connection_pair();
    let (new, _w2) = connection_pair();
    let old_guard = registry.try_register("alpha", &old).unwrap();
    registry.remove("alpha");
    let _new_guard = registry.try_register("alpha", &new).unwrap();

    // When
    drop(old_guard);

    // Then
    assert_eq!(registry.get("alpha").unwrap().id(), new.id());
}

#[tokio::test]
async fn given_other_connection_when_release_then_entry_kept() {
    let registry = WorkerRegistry::new();
    let (owner, _w1) = connection_pair();
    let (other, _w2) = connection_pair();
    let _guard = registry.try_register("alpha", &owner).unwrap();

    let released = registry.release("alpha", other.id());

    assert!(!released);
    assert!(registry.contains("alpha"));
}

#[tokio::test]
async fn given_registrations_when_snapshot_then_all_entries_listed() {
    let registry = WorkerRegistry::new();
    let (a, _wa) = connection_pair();
    let (b, _wb) = connection_pair();
    let _ga = registry.try_register("a", &a).unwrap();
    let _gb = registry.try_register("b", &b).unwrap();

    let mut names: Vec<String> = registry
        .snapshot()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    names.sort();

    assert_eq!(names, vec![String::from("a"), String::from("b")]);
}

#[tokio::test]
async fn given_waiter_when_worker_registers_then_changed_resolves() {
    // Given
    let registry = WorkerRegistry::new();
    let (connection, _worker) = connection_pair();
    let waiter = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.changed().await })
    };
    tokio::task::yield_now().await;

    // When
    let _guard = registry.try_register("alpha", &connection).unwrap();

    // Then
    timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
}
