//! Request gateway: ask a cache worker for a file, bounded by a deadline.

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Bytes;
use hotbox_transform::TransformError;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::dev::cache::{CacheHandle, CacheMsg};

/// Why a request got no bytes.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The worker did not answer in time
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The worker has shut down
    #[error("Cache worker is not running")]
    WorkerUnavailable,

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ConvertError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Fetch the bytes for `path` from `worker`.
///
/// The deadline covers queueing as well as the reply. A request abandoned on
/// timeout is still completed by the worker, which caches a success and
/// discards the reply.
pub async fn convert(
    worker: &CacheHandle,
    path: PathBuf,
    timeout: Duration,
) -> Result<Bytes, ConvertError> {
    let (reply, response) = oneshot::channel();
    let request = async {
        worker
            .sender()
            .send(CacheMsg::Convert { path, reply })
            .await
            .map_err(|_| ConvertError::WorkerUnavailable)?;
        response.await.map_err(|_| ConvertError::WorkerUnavailable)
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(result)) => result.map_err(ConvertError::from),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(ConvertError::Timeout(timeout)),
    }
}
