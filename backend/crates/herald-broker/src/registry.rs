use crate::{BrokerError, Connection, ConnectionId, Result as BrokerResult};

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::info;
use tokio::sync::Notify;

/// Live mapping from worker name to its connection.
///
/// Cloning is cheap and every clone sees the same entries. The lock is never
/// held across an await point.
pub struct WorkerRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    workers: RwLock<HashMap<String, Arc<Connection>>>,
    changed: Notify,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                workers: RwLock::new(HashMap::new()),
                changed: Notify::new(),
            }),
        }
    }

    /// Insert `name` if it is non-empty and not taken.
    ///
    /// The returned guard removes the entry when dropped, unless the name has
    /// since been taken over by another connection.
    pub fn try_register(
        &self,
        name: &str,
        connection: &Arc<Connection>,
    ) -> BrokerResult<RegistrationGuard> {
        if name.is_empty() {
            return Err(BrokerError::rejected(name, "empty name"));
        }

        {
            let mut workers = self.write();
            if workers.contains_key(name) {
                return Err(BrokerError::rejected(name, "name already registered"));
            }
            workers.insert(name.to_string(), Arc::clone(connection));
            info!(
                "Registered worker '{name}' on connection {} ({} total)",
                connection.id(),
                workers.len()
            );
        }

        self.inner.changed.notify_one();

        Ok(RegistrationGuard {
            registry: self.clone(),
            name: name.to_string(),
            connection_id: connection.id(),
        })
    }

    /// Remove `name` regardless of which connection it points at.
    pub fn remove(&self, name: &str) -> Option<Arc<Connection>> {
        let removed = self.write().remove(name);
        if removed.is_some() {
            info!("Removed worker '{name}'");
            self.inner.changed.notify_one();
        }
        removed
    }

    /// Remove `name` only while it still belongs to `connection_id`.
    pub fn release(&self, name: &str, connection_id: ConnectionId) -> bool {
        let released = {
            let mut workers = self.write();
            let owned = workers
                .get(name)
                .is_some_and(|connection| connection.id() == connection_id);
            if owned {
                workers.remove(name);
            }
            owned
        };

        if released {
            info!("Released worker '{name}' (connection {connection_id})");
            self.inner.changed.notify_one();
        }
        released
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Connection>> {
        self.read().get(name).cloned()
    }

    /// Point-in-time copy of every entry.
    pub fn snapshot(&self) -> Vec<(String, Arc<Connection>)> {
        self.read()
            .iter()
            .map(|(name, connection)| (name.clone(), Arc::clone(connection)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Resolves after the next membership change. Meant for a single waiter.
    pub async fn changed(&self) {
        self.inner.changed.notified().await;
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Connection>>> {
        self.inner
            .workers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Connection>>> {
        self.inner
            .workers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for WorkerRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Ties a registry entry to the lifetime of the connection that owns it.
pub struct RegistrationGuard {
    registry: WorkerRegistry,
    name: String,
    connection_id: ConnectionId,
}

impl RegistrationGuard {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.release(&self.name, self.connection_id);
    }
}
