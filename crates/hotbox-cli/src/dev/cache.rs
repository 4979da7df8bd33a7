//! Cache workers: one sequential loop per dialect.
//!
//! A worker owns its `path -> bytes` map and its transform. Requests arrive
//! as [`CacheMsg::Convert`] and are answered one at a time, so concurrent
//! requests for the same uncached file run the transform once: the first
//! stores the result and the rest are hits.
//!
//! ```text
//! gateway --[Convert]--> CacheWorker --[spawn_blocking]--> Transform
//! router  --[Evict/Clear]-->   |
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use hotbox_transform::{ElmMake, StaticFile, Transform, TransformError, TypeScript};
use tokio::sync::{mpsc, oneshot};

use crate::dev::Dialect;

/// Pending messages per worker before senders wait.
pub const MAILBOX_SIZE: usize = 32;

/// Result a worker sends back for one request.
pub type ConvertReply = Result<Bytes, TransformError>;

/// Messages accepted by a [`CacheWorker`].
#[derive(Debug)]
pub enum CacheMsg {
    /// Return the bytes for `path`, running the transform on a miss
    Convert {
        path: PathBuf,
        reply: oneshot::Sender<ConvertReply>,
    },
    /// Drop the entry for `path`
    Evict { path: PathBuf },
    /// Drop every entry
    Clear,
    /// Stop the loop; pending messages are discarded
    Shutdown,
}

/// Sequential cache loop bound to one transform.
pub struct CacheWorker {
    dialect: Dialect,
    transform: Arc<dyn Transform>,
    entries: HashMap<PathBuf, Bytes>,
    rx: mpsc::Receiver<CacheMsg>,
}

impl CacheWorker {
    pub fn new(dialect: Dialect, transform: Arc<dyn Transform>, rx: mpsc::Receiver<CacheMsg>) -> Self {
        Self {
            dialect,
            transform,
            entries: HashMap::new(),
            rx,
        }
    }

    /// Spawn a worker on the current runtime and return its handle.
    pub fn spawn(dialect: Dialect, transform: Arc<dyn Transform>) -> CacheHandle {
        let (tx, rx) = mpsc::channel(MAILBOX_SIZE);
        tokio::spawn(Self::new(dialect, transform, rx).run());
        CacheHandle::new(dialect, tx)
    }

    /// Run the worker event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                CacheMsg::Convert { path, reply } => {
                    let result = self.convert(path).await;
                    // The requester may have timed out; the entry is kept either way
                    let _ = reply.send(result);
                }
                CacheMsg::Evict { path } => {
                    if self.entries.remove(&path).is_some() {
                        tracing::debug!(dialect = self.dialect.name(), path = %path.display(), "evicted");
                    }
                }
                CacheMsg::Clear => {
                    tracing::debug!(
                        dialect = self.dialect.name(),
                        entries = self.entries.len(),
                        "cleared"
                    );
                    self.entries.clear();
                }
                CacheMsg::Shutdown => break,
            }
        }
        tracing::debug!(dialect = self.dialect.name(), "cache worker stopped");
    }

    async fn convert(&mut self, path: PathBuf) -> ConvertReply {
        if let Some(bytes) = self.entries.get(&path) {
            tracing::debug!(dialect = self.dialect.name(), path = %path.display(), "cache hit");
            return Ok(bytes.clone());
        }

        let transform = Arc::clone(&self.transform);
        let job_path = path.clone();
        let joined = tokio::task::spawn_blocking(move || transform.transform(&job_path)).await;

        match joined {
            Ok(Ok(output)) => {
                let bytes = Bytes::from(output);
                self.entries.insert(path, bytes.clone());
                Ok(bytes)
            }
            Ok(Err(err)) => Err(err),
            Err(join_err) => Err(TransformError::Aborted {
                path,
                message: join_err.to_string(),
            }),
        }
    }
}

/// Sending side of a worker's mailbox.
#[derive(Debug, Clone)]
pub struct CacheHandle {
    dialect: Dialect,
    tx: mpsc::Sender<CacheMsg>,
}

impl CacheHandle {
    pub fn new(dialect: Dialect, tx: mpsc::Sender<CacheMsg>) -> Self {
        Self { dialect, tx }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn sender(&self) -> &mpsc::Sender<CacheMsg> {
        &self.tx
    }

    /// Queue an eviction without waiting on a busy worker.
    pub fn evict(&self, path: PathBuf) {
        self.post(CacheMsg::Evict { path });
    }

    /// Queue a full clear without waiting on a busy worker.
    pub fn clear(&self) {
        self.post(CacheMsg::Clear);
    }

    /// Ask the worker to stop without waiting.
    ///
    /// A full mailbox means the worker is stuck in a transform; the message
    /// is skipped and the worker ends with the runtime instead.
    pub fn shutdown(&self) {
        match self.tx.try_send(CacheMsg::Shutdown) {
            Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(dialect = self.dialect.name(), "cache worker busy, not waiting for it to stop");
            }
        }
    }

    // A full mailbox means the worker is busy compiling; hand the send to a
    // task so the caller's loop keeps moving. Invalidations must not be lost.
    fn post(&self, msg: CacheMsg) {
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(msg)) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(msg).await;
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(dialect = self.dialect.name(), "cache worker gone, invalidation dropped");
            }
        }
    }
}

/// One worker per dialect.
#[derive(Debug, Clone)]
pub struct Caches {
    static_files: CacheHandle,
    typescript: CacheHandle,
    elm: CacheHandle,
}

impl Caches {
    /// Spawn the standard workers.
    pub fn spawn(elm_program: &str) -> Self {
        Self::spawn_with(
            Arc::new(StaticFile),
            Arc::new(TypeScript::new()),
            Arc::new(ElmMake::new(elm_program)),
        )
    }

    /// Spawn workers with custom transforms.
    pub fn spawn_with(
        static_files: Arc<dyn Transform>,
        typescript: Arc<dyn Transform>,
        elm: Arc<dyn Transform>,
    ) -> Self {
        Self {
            static_files: CacheWorker::spawn(Dialect::Static, static_files),
            typescript: CacheWorker::spawn(Dialect::TypeScript, typescript),
            elm: CacheWorker::spawn(Dialect::Elm, elm),
        }
    }

    pub fn get(&self, dialect: Dialect) -> &CacheHandle {
        match dialect {
            Dialect::Static => &self.static_files,
            Dialect::TypeScript => &self.typescript,
            Dialect::Elm => &self.elm,
        }
    }

    pub fn shutdown(&self) {
        for handle in [&self.static_files, &self.typescript, &self.elm] {
            handle.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::gateway::convert;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Transform that counts calls and echoes a per-call payload.
    fn counting(counter: Arc<AtomicUsize>) -> Arc<dyn Transform> {
        Arc::new(move |path: &Path| -> hotbox_transform::Result<Vec<u8>> {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{}#{}", path.display(), n).into_bytes())
        })
    }

    #[tokio::test]
    async fn test_hit_does_not_rerun_transform() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = CacheWorker::spawn(Dialect::Static, counting(counter.clone()));

        let first = convert(&handle, PathBuf::from("/a.txt"), TIMEOUT).await.unwrap();
        let second = convert(&handle, PathBuf::from("/a.txt"), TIMEOUT).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(&first[..], b"/a.txt#1");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_evict_forces_recompute() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = CacheWorker::spawn(Dialect::TypeScript, counting(counter.clone()));
        let path = PathBuf::from("/app.ts");

        convert(&handle, path.clone(), TIMEOUT).await.unwrap();
        handle.evict(path.clone());
        let after = convert(&handle, path.clone(), TIMEOUT).await.unwrap();

        assert_eq!(&after[..], b"/app.ts#2");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_drops_every_entry() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = CacheWorker::spawn(Dialect::Elm, counting(counter.clone()));

        convert(&handle, PathBuf::from("/Main.elm"), TIMEOUT).await.unwrap();
        convert(&handle, PathBuf::from("/Other.elm"), TIMEOUT).await.unwrap();
        handle.clear();
        convert(&handle, PathBuf::from("/Main.elm"), TIMEOUT).await.unwrap();
        convert(&handle, PathBuf::from("/Other.elm"), TIMEOUT).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = counter.clone();
        let failing: Arc<dyn Transform> = Arc::new(move |path: &Path| -> hotbox_transform::Result<Vec<u8>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TransformError::NotFound(path.to_path_buf()))
        });
        let handle = CacheWorker::spawn(Dialect::Static, failing);

        for _ in 0..3 {
            assert!(convert(&handle, PathBuf::from("/gone.txt"), TIMEOUT).await.is_err());
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_share_one_transform() {
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = counter.clone();
        let slow: Arc<dyn Transform> = Arc::new(move |path: &Path| -> hotbox_transform::Result<Vec<u8>> {
            std::thread::sleep(Duration::from_millis(50));
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{}#{}", path.display(), n).into_bytes())
        });
        let handle = CacheWorker::spawn(Dialect::TypeScript, slow);

        let requests: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { convert(&handle, PathBuf::from("/x.ts"), TIMEOUT).await })
            })
            .collect();

        let mut results = Vec::new();
        for request in requests {
            results.push(request.await.unwrap().unwrap());
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|bytes| &bytes[..] == b"/x.ts#1"));
    }

    #[tokio::test]
    async fn test_panicking_transform_reports_aborted() {
        let panicking: Arc<dyn Transform> =
            Arc::new(|_: &Path| -> hotbox_transform::Result<Vec<u8>> { panic!("boom") });
        let handle = CacheWorker::spawn(Dialect::Static, panicking);

        let err = convert(&handle, PathBuf::from("/p.txt"), TIMEOUT).await.unwrap_err();
        assert!(err.to_string().contains("aborted"));
    }

    #[tokio::test]
    async fn test_caches_route_by_dialect() {
        let echo = |tag: &'static str| -> Arc<dyn Transform> {
            Arc::new(move |_: &Path| -> hotbox_transform::Result<Vec<u8>> {
                Ok(tag.as_bytes().to_vec())
            })
        };
        let caches = Caches::spawn_with(echo("static"), echo("ts"), echo("elm"));

        let ts = convert(caches.get(Dialect::TypeScript), PathBuf::from("/a.ts"), TIMEOUT)
            .await
            .unwrap();
        let elm = convert(caches.get(Dialect::Elm), PathBuf::from("/A.elm"), TIMEOUT)
            .await
            .unwrap();

        assert_eq!(&ts[..], b"ts");
        assert_eq!(&elm[..], b"elm");
        assert_eq!(caches.get(Dialect::Static).dialect(), Dialect::Static);
        caches.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = CacheWorker::spawn(Dialect::Static, counting(counter));
        handle.shutdown();

        let err = convert(&handle, PathBuf::from("/a.txt"), TIMEOUT).await.unwrap_err();
        assert!(matches!(
            err,
            crate::dev::ConvertError::WorkerUnavailable | crate::dev::ConvertError::Timeout(_)
        ));
    }

    #[test]
    fn test_shutdown_does_not_wait_on_full_mailbox() {
        // A worker stuck mid-transform never drains its mailbox
        let (tx, mut rx) = mpsc::channel(1);
        tx.try_send(CacheMsg::Clear).unwrap();
        let handle = CacheHandle::new(Dialect::Elm, tx);

        handle.shutdown();

        assert!(matches!(rx.try_recv(), Ok(CacheMsg::Clear)));
        assert!(rx.try_recv().is_err());
    }
}
