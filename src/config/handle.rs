//! Shared access to the current settings snapshot

use super::{ConfigErrors, ConfigResolver, Environment, Settings};
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to the current [`Settings`] snapshot
///
/// Readers get an `Arc` of whatever snapshot was current when they asked
/// and keep it for as long as they hold it. Publishing swaps the whole
/// snapshot; nothing ever observes a partially updated one.
#[derive(Clone)]
pub struct SettingsHandle {
    tx: Arc<watch::Sender<Arc<Settings>>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(settings));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot
    pub fn current(&self) -> Arc<Settings> {
        Arc::clone(&self.tx.borrow())
    }

    /// Replace the snapshot, returning the previous one
    pub fn publish(&self, settings: Settings) -> Arc<Settings> {
        self.swap(settings).1
    }

    /// Publish and return `(published, previous)`
    fn swap(&self, settings: Settings) -> (Arc<Settings>, Arc<Settings>) {
        let published = Arc::new(settings);
        let previous = self.tx.send_replace(Arc::clone(&published));
        tracing::info!(mode = %published.mode(), "Published new settings snapshot");
        (published, previous)
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<Arc<Settings>> {
        self.tx.subscribe()
    }

    /// Resolve `env` and publish the result
    ///
    /// Returns the snapshot this call published, even if another publish
    /// has already replaced it. On failure the current snapshot stays in
    /// place.
    pub fn reload(&self, env: &Environment) -> Result<Arc<Settings>, ConfigErrors> {
        let settings = ConfigResolver::resolve_settings(env)?;
        Ok(self.swap(settings).0)
    }
}

impl std::fmt::Debug for SettingsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsHandle")
            .field("current", &*self.tx.borrow())
            .finish()
    }
}
