//! The development server.
//!
//! Every piece of mutable state belongs to exactly one loop and is reached
//! by message passing:
//!
//! ```text
//!             request
//!                |
//!          [server.rs] --Convert--> [cache.rs] x3 (static, ts, elm)
//!                |                       ^
//!              Watch                  Evict/Clear
//!                v                       |
//!          [watcher.rs] --FileChange--> [router.rs] --Broadcast--> [bus.rs] --> SSE clients
//! ```
//!
//! [`gateway::convert`] bounds how long a request waits on a worker; it is
//! the only place a timeout cancels anything.

pub mod bus;
pub mod cache;
pub mod deps;
pub mod dialect;
pub mod gateway;
pub mod router;
pub mod server;
pub mod state;
pub mod watcher;

pub use bus::{Bus, BusHandle, Subscription};
pub use cache::{CacheHandle, CacheMsg, CacheWorker, Caches};
pub use dialect::Dialect;
pub use gateway::{convert, ConvertError};
pub use server::{build_router, DevServer, RELOAD_PATH};
pub use state::{DevServerState, SharedState};
pub use watcher::{ChangeKind, FileChange, FileWatcher, WatchHandle};
