// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Desktop Remote Contributors

//! In-flight request registry

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use desktop_remote_common::{Operation, RequestId};

struct Entry {
    operation: Operation,
    cancel: CancellationToken,
}

/// Requests that have been issued and not yet resolved
#[derive(Clone, Default)]
pub(crate) struct Registry {
    entries: Arc<Mutex<HashMap<RequestId, Entry>>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<RequestId, Entry>> {
        // Entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a request; the entry lives until the returned guard is dropped
    pub(crate) fn register(
        &self,
        id: RequestId,
        operation: Operation,
        cancel: CancellationToken,
    ) -> RegistryGuard {
        self.lock().insert(id, Entry { operation, cancel });
        RegistryGuard {
            registry: self.clone(),
            id,
        }
    }

    pub(crate) fn cancel(&self, id: RequestId) -> bool {
        match self.lock().get(&id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<(RequestId, Operation)> {
        self.lock()
            .iter()
            .map(|(id, entry)| (*id, entry.operation))
            .collect()
    }

    fn remove(&self, id: RequestId) {
        self.lock().remove(&id);
    }
}

/// Removes its request from the registry on drop, on every exit path
pub(crate) struct RegistryGuard {
    registry: Registry,
    id: RequestId,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
