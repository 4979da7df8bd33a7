//! Handles shared by every request.
//!
//! Nothing here is locked: each field is the sending side of a loop that
//! owns its own state, so cloning the `Arc` is all a handler needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hotbox_transform::ElmDependencies;
use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::dev::bus::{Bus, BusHandle};
use crate::dev::cache::Caches;
use crate::dev::router::{InvalidationRouter, CHANGE_BUFFER};
use crate::dev::watcher::{FileWatcher, WatchHandle};
use crate::error::Result;

/// State shared between handlers.
pub type SharedState = Arc<DevServerState>;

#[derive(Debug)]
pub struct DevServerState {
    root: PathBuf,
    caches: Caches,
    watcher: WatchHandle,
    bus: BusHandle,
    elm_deps: Arc<ElmDependencies>,
    request_timeout: Duration,
}

impl DevServerState {
    /// Start every loop with the standard transforms.
    ///
    /// `root` must be canonical; request paths are checked against it.
    pub fn spawn(root: PathBuf, config: &ServerConfig) -> Result<SharedState> {
        Self::spawn_with(root, config, Caches::spawn(&config.elm_program))
    }

    /// Start the watcher, router and bus around already running caches.
    pub fn spawn_with(root: PathBuf, config: &ServerConfig, caches: Caches) -> Result<SharedState> {
        let bus = Bus::spawn(config.subscriber_buffer);

        let (changes_tx, changes_rx) = mpsc::channel(CHANGE_BUFFER);
        let watcher = FileWatcher::spawn(config.watch_buffer, changes_tx)?;
        tokio::spawn(InvalidationRouter::new(changes_rx, caches.clone(), bus.clone()).run());

        Ok(Arc::new(Self {
            root,
            caches,
            watcher,
            bus,
            elm_deps: Arc::new(ElmDependencies::new(config.elm_deps_program.clone())),
            request_timeout: config.request_timeout(),
        }))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    pub fn watcher(&self) -> &WatchHandle {
        &self.watcher
    }

    pub fn bus(&self) -> &BusHandle {
        &self.bus
    }

    pub fn elm_deps(&self) -> Arc<ElmDependencies> {
        Arc::clone(&self.elm_deps)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// End every SSE stream, then stop the cache workers.
    pub fn shutdown(&self) {
        self.bus.shutdown();
        self.caches.shutdown();
    }
}
