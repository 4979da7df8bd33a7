//! Filesystem watcher: watches exactly the files that have been served.
//!
//! ```text
//! notify thread --> bridge thread --[Event]--> FileWatcher --[FileChange]--> router
//! handler --[Watch/Unwatch]------------------------^
//! ```
//!
//! Each file is registered non-recursively. A path stays in the watch set
//! until it is removed or renamed; re-serving it registers it again.

use std::collections::HashSet;
use std::path::PathBuf;

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Notify events buffered between the bridge thread and the loop.
const EVENT_BUFFER: usize = 64;

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Removed,
}

/// A change to a watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Messages accepted by the [`FileWatcher`] loop.
#[derive(Debug)]
pub enum WatchMsg {
    Watch(PathBuf),
    Unwatch(PathBuf),
}

/// Map a notify event kind to a change, ignoring kinds that don't alter content.
pub fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Removed),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

/// The loop that owns the OS watcher and the watch set.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    watched: HashSet<PathBuf>,
    rx: mpsc::Receiver<WatchMsg>,
    events: mpsc::Receiver<notify::Event>,
    changes: mpsc::Sender<FileChange>,
}

impl FileWatcher {
    /// Start the OS watcher. Nothing is watched until [`WatchMsg::Watch`] arrives.
    pub fn new(
        rx: mpsc::Receiver<WatchMsg>,
        changes: mpsc::Sender<FileChange>,
    ) -> notify::Result<Self> {
        // notify calls back on its own thread; bridge to tokio through a
        // plain thread so the callback never blocks
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let (async_tx, events) = mpsc::channel::<notify::Event>(EVENT_BUFFER);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Loop stopped
                        }
                    }
                    Err(e) => tracing::warn!("watch error: {}", e),
                }
            }
        });

        Ok(Self {
            watcher,
            watched: HashSet::new(),
            rx,
            events,
            changes,
        })
    }

    /// Spawn the loop and return the registration handle.
    ///
    /// `buffer` bounds pending registrations; see [`WatchHandle::watch`].
    pub fn spawn(buffer: usize, changes: mpsc::Sender<FileChange>) -> notify::Result<WatchHandle> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let watcher = Self::new(rx, changes)?;
        tokio::spawn(watcher.run());
        Ok(WatchHandle { tx })
    }

    /// Run the watcher event loop
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(WatchMsg::Watch(path)) => self.watch(path),
                    Some(WatchMsg::Unwatch(path)) => self.unwatch(&path),
                    None => break,
                },
                event = self.events.recv() => match event {
                    Some(event) => {
                        if self.handle_event(event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        tracing::debug!("file watcher stopped");
    }

    fn watch(&mut self, path: PathBuf) {
        if self.watched.contains(&path) {
            return;
        }
        match self.watcher.watch(&path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "watching");
                self.watched.insert(path);
            }
            Err(e) => tracing::warn!(path = %path.display(), "cannot watch: {}", e),
        }
    }

    fn unwatch(&mut self, path: &std::path::Path) {
        if self.watched.remove(path) {
            // The OS drops the watch itself when the file is deleted
            let _ = self.watcher.unwatch(path);
            tracing::debug!(path = %path.display(), "unwatched");
        }
    }

    /// Forward changes to watched paths. `Err` once the router is gone.
    async fn handle_event(&mut self, event: notify::Event) -> Result<(), ()> {
        let Some(kind) = classify(&event.kind) else {
            return Ok(());
        };

        for path in event.paths {
            if !self.watched.contains(&path) {
                continue;
            }
            if kind == ChangeKind::Removed {
                self.unwatch(&path);
            }
            self.changes
                .send(FileChange { path, kind })
                .await
                .map_err(|_| ())?;
        }
        Ok(())
    }
}

/// Sending side of the watcher's registration queue.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    tx: mpsc::Sender<WatchMsg>,
}

impl WatchHandle {
    pub fn new(tx: mpsc::Sender<WatchMsg>) -> Self {
        Self { tx }
    }

    /// Register `path` without waiting. A saturated queue skips the
    /// registration; the file is registered again the next time it's served.
    pub fn watch(&self, path: PathBuf) {
        self.post(WatchMsg::Watch(path));
    }

    pub fn unwatch(&self, path: PathBuf) {
        self.post(WatchMsg::Unwatch(path));
    }

    fn post(&self, msg: WatchMsg) {
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(msg)) => {
                tracing::warn!("watcher busy, skipped {:?}", msg);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("watcher stopped, registration dropped");
            }
        }
    }
}
