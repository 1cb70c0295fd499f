//! In-memory registry of live form instances.
//!
//! Each rendered form gets a UUID; later requests for that form look the
//! instance up here. Entries expire after a period without access. Removing
//! or expiring an entry drops the form, which cancels anything it scheduled.

use crate::navigation::NavigationRecorder;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Identifier of a form instance.
pub type FormId = Uuid;

/// Shared handle to one form instance and the navigator it reports to.
pub struct FormHandle<C> {
    /// The form. Locked for the duration of each event or submit.
    pub form: Arc<tokio::sync::Mutex<C>>,
    /// Navigation requested by the form.
    pub navigator: Arc<NavigationRecorder>,
}

impl<C> Clone for FormHandle<C> {
    fn clone(&self) -> Self {
        Self {
            form: Arc::clone(&self.form),
            navigator: Arc::clone(&self.navigator),
        }
    }
}

impl<C> fmt::Debug for FormHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHandle")
            .field("navigator", &self.navigator)
            .finish_non_exhaustive()
    }
}

struct Entry<C> {
    handle: FormHandle<C>,
    last_access: Instant,
}

/// Live form instances of one kind.
pub struct FormRegistry<C> {
    entries: Mutex<HashMap<FormId, Entry<C>>>,
    ttl: Duration,
}

impl<C> fmt::Debug for FormRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormRegistry")
            .field("live", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<C> FormRegistry<C> {
    /// Empty registry whose entries expire after `ttl` without access.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Register a new form built by `build`, which receives the navigator the
    /// form must report to.
    pub fn open(&self, build: impl FnOnce(Arc<NavigationRecorder>) -> C) -> (FormId, FormHandle<C>) {
        self.evict_expired();

        let id = Uuid::new_v4();
        let navigator = Arc::new(NavigationRecorder::new());
        let handle = FormHandle {
            form: Arc::new(tokio::sync::Mutex::new(build(Arc::clone(&navigator)))),
            navigator,
        };

        self.entries.lock().insert(
            id,
            Entry {
                handle: handle.clone(),
                last_access: Instant::now(),
            },
        );
        tracing::debug!(form_id = %id, "Form instance opened");

        (id, handle)
    }

    /// Look up a live form and extend its lifetime.
    #[must_use]
    pub fn get(&self, id: &FormId) -> Option<FormHandle<C>> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        let expired = entries
            .get(id)
            .is_some_and(|entry| now.duration_since(entry.last_access) >= self.ttl);
        if expired {
            entries.remove(id);
            tracing::debug!(form_id = %id, "Form instance expired");
            return None;
        }

        entries.get_mut(id).map(|entry| {
            entry.last_access = now;
            entry.handle.clone()
        })
    }

    /// Remove a form instance.
    pub fn remove(&self, id: &FormId) -> Option<FormHandle<C>> {
        let removed = self.entries.lock().remove(id).map(|entry| entry.handle);
        if removed.is_some() {
            tracing::debug!(form_id = %id, "Form instance closed");
        }
        removed
    }

    /// Drop every entry not accessed within the TTL. Returns how many went.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_access) < self.ttl);

        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Expired form instances evicted");
        }
        evicted
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether there are no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
