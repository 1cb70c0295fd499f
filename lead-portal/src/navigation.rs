//! Navigation collaborator.
//!
//! Controllers request navigation through a [`Navigator`]; the HTTP layer
//! uses a [`NavigationRecorder`] and turns the recorded requests into
//! `HX-Redirect` / `Location` responses.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Receives navigation requests from controllers.
pub trait Navigator: Send + Sync {
    /// Leave the page with a full reload.
    fn navigate_to(&self, path: &str);

    /// In-app transition without a reload.
    fn router_push(&self, path: &str);
}

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Full page load of the path.
    Reload(String),
    /// In-app transition to the path.
    Push(String),
}

impl Navigation {
    /// Target path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Reload(path) | Self::Push(path) => path,
        }
    }
}

/// Navigator that stores requests until someone takes them.
#[derive(Debug, Default)]
pub struct NavigationRecorder {
    requests: Mutex<Vec<Navigation>>,
}

impl NavigationRecorder {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every recorded request, oldest first.
    pub fn take(&self) -> Vec<Navigation> {
        std::mem::take(&mut *self.requests.lock())
    }

    /// Whether nothing has been requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

impl Navigator for NavigationRecorder {
    fn navigate_to(&self, path: &str) {
        tracing::debug!(path, "Navigation requested (reload)");
        self.requests.lock().push(Navigation::Reload(path.to_string()));
    }

    fn router_push(&self, path: &str) {
        tracing::debug!(path, "Navigation requested (push)");
        self.requests.lock().push(Navigation::Push(path.to_string()));
    }
}

/// A navigation scheduled to happen after a delay.
///
/// The timer belongs to whoever holds this value: dropping it (or calling
/// [`cancel`](Self::cancel)) aborts the navigation if it has not fired yet.
#[derive(Debug)]
pub struct DeferredNavigation {
    target: String,
    delay: Duration,
    handle: JoinHandle<()>,
}

impl DeferredNavigation {
    /// Schedule `navigate_to(target)` after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn schedule(navigator: Arc<dyn Navigator>, target: &str, delay: Duration) -> Self {
        let path = target.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate_to(&path);
        });

        Self {
            target: target.to_string(),
            delay,
            handle,
        }
    }

    /// Path the navigation goes to.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Delay the navigation was scheduled with.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Abort the navigation.
    pub fn cancel(self) {
        tracing::debug!(path = %self.target, "Deferred navigation cancelled");
    }
}

impl Drop for DeferredNavigation {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
