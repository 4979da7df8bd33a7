//! Invalidation router: turns file changes into evictions and reloads.

use tokio::sync::mpsc;

use crate::dev::bus::BusHandle;
use crate::dev::cache::Caches;
use crate::dev::watcher::FileChange;
use crate::dev::Dialect;

/// Pending changes between the watcher and the router.
pub const CHANGE_BUFFER: usize = 64;

/// Consumes watcher output until the watcher stops.
pub struct InvalidationRouter {
    changes: mpsc::Receiver<FileChange>,
    caches: Caches,
    bus: BusHandle,
}

impl InvalidationRouter {
    pub fn new(changes: mpsc::Receiver<FileChange>, caches: Caches, bus: BusHandle) -> Self {
        Self { changes, caches, bus }
    }

    /// Run the router event loop
    pub async fn run(mut self) {
        while let Some(change) = self.changes.recv().await {
            self.route(change);
        }
        tracing::debug!("invalidation router stopped");
    }

    fn route(&self, change: FileChange) {
        let dialect = Dialect::from_path(&change.path);
        tracing::debug!(path = %change.path.display(), kind = ?change.kind, dialect = dialect.name(), "changed");

        match dialect {
            // Compiled Elm embeds every imported module, so any source
            // change can make any entry stale
            Dialect::Elm => self.caches.get(Dialect::Elm).clear(),
            Dialect::Static | Dialect::TypeScript => {
                self.caches.get(dialect).evict(change.path.clone());
            }
        }

        self.bus.broadcast(change.path);
    }
}
