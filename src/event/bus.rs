//! Per-connection publish/subscribe registry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::error;

use super::{Event, EventKind};
use crate::error::BusError;

type SyncFn = dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync;
type AsyncFn = dyn Fn(Event) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// A subscriber callback.
///
/// Synchronous subscribers run inline and their failure is returned from
/// [`EventBus::publish`]. Asynchronous subscribers are spawned onto the
/// runtime; the publisher never waits for them and their failures are
/// logged by the spawned task.
#[derive(Clone)]
pub enum Subscriber {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl Subscriber {
    /// Wrap a synchronous callback.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Wrap an asynchronous callback.
    pub fn spawned<F, Fut>(f: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Async(Arc::new(move |event| f(event).boxed()))
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Subscriber::Sync"),
            Self::Async(_) => f.write_str("Subscriber::Async"),
        }
    }
}

/// Identifies one subscription for [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps event kinds to ordered subscriber lists.
///
/// The accepted kinds are fixed at construction; using any other kind is
/// an error.
#[derive(Debug)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<(SubscriptionId, Subscriber)>>,
    next_id: u64,
}

impl EventBus {
    /// Create a bus accepting exactly `kinds`.
    pub fn new(kinds: &[EventKind]) -> Self {
        Self {
            subscribers: kinds.iter().map(|kind| (*kind, Vec::new())).collect(),
            next_id: 0,
        }
    }

    /// Create a bus accepting every [`EventKind`].
    pub fn with_all_kinds() -> Self {
        Self::new(EventKind::ALL)
    }

    /// Append a subscriber for `kind`.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        subscriber: Subscriber,
    ) -> Result<SubscriptionId, BusError> {
        let list = self
            .subscribers
            .get_mut(&kind)
            .ok_or(BusError::UnknownKind(kind))?;
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        list.push((id, subscriber));
        Ok(id)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> Result<(), BusError> {
        let list = self
            .subscribers
            .get_mut(&kind)
            .ok_or(BusError::UnknownKind(kind))?;
        let index = list
            .iter()
            .position(|(sub_id, _)| *sub_id == id)
            .ok_or(BusError::NotSubscribed(id))?;
        list.remove(index);
        Ok(())
    }

    /// Deliver `event` to its subscribers in subscription order.
    ///
    /// Stops at the first failing synchronous subscriber. Must be called
    /// from within a tokio runtime when asynchronous subscribers exist.
    pub fn publish(&self, event: &Event) -> Result<(), BusError> {
        let kind = event.kind();
        let list = self
            .subscribers
            .get(&kind)
            .ok_or(BusError::UnknownKind(kind))?;

        for (id, subscriber) in list {
            match subscriber {
                Subscriber::Sync(f) => {
                    f(event).map_err(|error| BusError::Subscriber { kind, error })?;
                }
                Subscriber::Async(f) => {
                    let fut = f(event.clone());
                    let id = *id;
                    tokio::spawn(async move {
                        if let Err(e) = fut.await {
                            error!(subscription = %id, kind = ?kind, error = %format!("{e:#}"), "event subscriber failed");
                        }
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of subscribers for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    /// Detach every subscriber, keeping the accepted kinds.
    pub fn clear(&mut self) {
        for list in self.subscribers.values_mut() {
            list.clear();
        }
    }
}
