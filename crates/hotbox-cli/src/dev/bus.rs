//! Notification bus: fans reload events out to every SSE connection.
//!
//! One loop owns the subscriber set. Subscribing, unsubscribing and
//! broadcasting are all messages into that loop, so the set is never shared.
//! Each subscriber has its own bounded queue and a broadcast never waits on
//! it: a full queue drops the event for that subscriber only.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

/// Identifies one subscriber for the lifetime of the bus.
pub type SubscriberId = u64;

/// Messages accepted by the [`Bus`] loop.
#[derive(Debug)]
pub enum BusMsg {
    /// Register a subscriber and reply with its id and queue
    Subscribe {
        reply: oneshot::Sender<(SubscriberId, mpsc::Receiver<Arc<str>>)>,
    },
    /// Remove a subscriber; unknown ids are ignored
    Unsubscribe { id: SubscriberId },
    /// Deliver a changed path to every current subscriber
    Broadcast { path: PathBuf },
    /// Drop every subscriber, ending their streams, and stop
    Shutdown,
}

struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<Arc<str>>,
}

/// The loop that owns the subscriber set.
pub struct Bus {
    rx: mpsc::UnboundedReceiver<BusMsg>,
    subscribers: Vec<Subscriber>,
    next_id: SubscriberId,
    buffer: usize,
}

impl Bus {
    pub fn new(rx: mpsc::UnboundedReceiver<BusMsg>, buffer: usize) -> Self {
        Self {
            rx,
            subscribers: Vec::new(),
            next_id: 0,
            buffer: buffer.max(1),
        }
    }

    /// Spawn the bus with a per-subscriber queue of `buffer` events.
    pub fn spawn(buffer: usize) -> BusHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::new(rx, buffer).run());
        BusHandle { tx }
    }

    /// Run the bus event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                BusMsg::Subscribe { reply } => {
                    let id = self.next_id;
                    self.next_id += 1;
                    let (tx, rx) = mpsc::channel(self.buffer);
                    if reply.send((id, rx)).is_ok() {
                        self.subscribers.push(Subscriber { id, tx });
                        tracing::debug!(id, total = self.subscribers.len(), "subscriber added");
                    }
                }
                BusMsg::Unsubscribe { id } => {
                    self.subscribers.retain(|s| s.id != id);
                    tracing::debug!(id, total = self.subscribers.len(), "subscriber removed");
                }
                BusMsg::Broadcast { path } => self.broadcast(&path),
                BusMsg::Shutdown => break,
            }
        }
        // Dropping the senders ends every open stream
        self.subscribers.clear();
        tracing::debug!("notification bus stopped");
    }

    fn broadcast(&mut self, path: &std::path::Path) {
        let event: Arc<str> = Arc::from(path.display().to_string());
        self.subscribers.retain(|subscriber| {
            match subscriber.tx.try_send(Arc::clone(&event)) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(id = subscriber.id, path = %event, "reload event dropped, subscriber queue full");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
        tracing::info!(path = %event, subscribers = self.subscribers.len(), "reload");
    }
}

/// Cloneable sending side of the bus.
#[derive(Debug, Clone)]
pub struct BusHandle {
    tx: mpsc::UnboundedSender<BusMsg>,
}

impl BusHandle {
    /// Register a new subscriber. `None` once the bus has stopped.
    pub async fn subscribe(&self) -> Option<Subscription> {
        let (reply, response) = oneshot::channel();
        self.tx.send(BusMsg::Subscribe { reply }).ok()?;
        let (id, rx) = response.await.ok()?;
        Some(Subscription {
            id,
            rx,
            bus: self.tx.clone(),
        })
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        let _ = self.tx.send(BusMsg::Unsubscribe { id });
    }

    pub fn broadcast(&self, path: PathBuf) {
        let _ = self.tx.send(BusMsg::Broadcast { path });
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(BusMsg::Shutdown);
    }
}

/// One subscriber's event queue. Unsubscribes itself when dropped.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<str>>,
    bus: mpsc::UnboundedSender<BusMsg>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next changed path, or `None` when the bus has stopped.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.bus.send(BusMsg::Unsubscribe { id: self.id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let bus = Bus::spawn(16);
        let mut first = bus.subscribe().await.unwrap();
        let mut second = bus.subscribe().await.unwrap();
        assert_ne!(first.id(), second.id());

        bus.broadcast(PathBuf::from("/src/app.ts"));

        assert_eq!(&*timeout(WAIT, first.recv()).await.unwrap().unwrap(), "/src/app.ts");
        assert_eq!(&*timeout(WAIT, second.recv()).await.unwrap().unwrap(), "/src/app.ts");
    }

    #[tokio::test]
    async fn test_unsubscribed_subscriber_gets_nothing() {
        let bus = Bus::spawn(16);
        let mut kept = bus.subscribe().await.unwrap();
        let mut gone = bus.subscribe().await.unwrap();

        bus.unsubscribe(gone.id());
        bus.broadcast(PathBuf::from("/src/index.html"));

        assert_eq!(&*timeout(WAIT, kept.recv()).await.unwrap().unwrap(), "/src/index.html");
        // The bus dropped its sender, so the queue is closed and empty
        assert_eq!(timeout(WAIT, gone.recv()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dropped_subscription_unsubscribes() {
        let bus = Bus::spawn(16);
        let mut kept = bus.subscribe().await.unwrap();
        drop(bus.subscribe().await.unwrap());

        bus.broadcast(PathBuf::from("/a.ts"));
        assert_eq!(&*timeout(WAIT, kept.recv()).await.unwrap().unwrap(), "/a.ts");
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let bus = Bus::spawn(1);
        let mut slow = bus.subscribe().await.unwrap();
        let mut fast = bus.subscribe().await.unwrap();

        bus.broadcast(PathBuf::from("/one.ts"));
        assert_eq!(&*timeout(WAIT, fast.recv()).await.unwrap().unwrap(), "/one.ts");
        bus.broadcast(PathBuf::from("/two.ts"));
        assert_eq!(&*timeout(WAIT, fast.recv()).await.unwrap().unwrap(), "/two.ts");

        // The slow subscriber kept the first event and missed the second
        assert_eq!(&*slow.recv().await.unwrap(), "/one.ts");
        assert!(timeout(Duration::from_millis(50), slow.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_ends_streams() {
        let bus = Bus::spawn(16);
        let mut sub = bus.subscribe().await.unwrap();

        bus.shutdown();

        assert_eq!(timeout(WAIT, sub.recv()).await.unwrap(), None);
        assert!(bus.subscribe().await.is_none());
    }
}
