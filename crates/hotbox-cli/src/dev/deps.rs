//! Detached Elm dependency discovery.
//!
//! Serving an Elm entry module starts a background lookup of the modules it
//! imports; each one found is registered with the watcher. Nothing waits on
//! the lookup and its failures are only logged.

use std::path::PathBuf;
use std::sync::Arc;

use hotbox_transform::ElmDependencies;
use tokio::task::JoinHandle;

use crate::dev::watcher::WatchHandle;

/// Look up `entry`'s dependencies in the background and watch them.
pub fn spawn_discovery(
    finder: Arc<ElmDependencies>,
    entry: PathBuf,
    watcher: WatchHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let lookup = entry.clone();
        let found = tokio::task::spawn_blocking(move || finder.discover(&lookup)).await;

        match found {
            Ok(Ok(paths)) => {
                tracing::debug!(entry = %entry.display(), count = paths.len(), "elm dependencies");
                for path in paths {
                    watcher.watch(path);
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(entry = %entry.display(), "dependency discovery failed: {}", e);
            }
            Err(e) => {
                tracing::warn!(entry = %entry.display(), "dependency discovery aborted: {}", e);
            }
        }
    })
}
