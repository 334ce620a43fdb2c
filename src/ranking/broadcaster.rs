//! Live ranking update fan-out
//!
//! The broadcaster keeps one unbounded channel per subscriber, in
//! subscription order. Publishing never waits on a subscriber: a player update
//! is queued on every live channel and channels whose receiving end has gone
//! away are dropped on the spot.

use crate::error::{RankerError, Result};
use crate::types::{Player, SubscriberId};
use crate::utils::generate_id;
use std::pin::Pin;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::{debug, warn};

struct SubscriberHandle {
    id: SubscriberId,
    sender: mpsc::UnboundedSender<Player>,
}

/// Publish/subscribe hub for ranking updates plus an advisory ranking cache
#[derive(Default)]
pub struct Broadcaster {
    subscribers: Mutex<Vec<SubscriberHandle>>,
    ranking_cache: RwLock<Vec<Player>>,
}

impl Broadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new subscriber. Dropping the returned handle unsubscribes it.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = generate_id();

        match self.subscribers.lock() {
            Ok(mut subscribers) => {
                subscribers.push(SubscriberHandle { id, sender });
                debug!(
                    "Subscriber {} attached ({} active)",
                    id,
                    subscribers.len()
                );
            }
            // The sender is dropped here, so the stream ends immediately
            Err(_) => warn!("Subscriber list lock poisoned, subscriber {} not registered", id),
        }

        Subscription {
            id,
            receiver,
            broadcaster: Arc::downgrade(self),
        }
    }

    /// Remove a subscriber. Returns false when it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|handle| handle.id != id);
        let removed = subscribers.len() != before;

        if removed {
            debug!(
                "Subscriber {} detached ({} active)",
                id,
                subscribers.len()
            );
        }
        removed
    }

    /// Forward a player update to every live subscriber, in subscription
    /// order. Returns how many subscribers received it.
    pub fn publish(&self, player: &Player) -> usize {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            warn!("Subscriber list lock poisoned, dropping update for '{}'", player.id);
            return 0;
        };

        let mut delivered = 0;
        subscribers.retain(|handle| match handle.sender.send(player.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                debug!("Pruning closed subscriber {}", handle.id);
                false
            }
        });

        debug!(
            "Published update for '{}' (rating {}) to {} subscribers",
            player.id, player.rating, delivered
        );
        delivered
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Replace the cached ranking snapshot
    pub fn update_cache(&self, players: &[Player]) -> Result<()> {
        let mut cache = self
            .ranking_cache
            .write()
            .map_err(|_| RankerError::lock_poisoned("ranking cache write"))?;
        *cache = players.to_vec();
        Ok(())
    }

    /// Last cached ranking snapshot. Not authoritative.
    pub fn cached_ranking(&self) -> Vec<Player> {
        self.ranking_cache
            .read()
            .map(|cache| cache.clone())
            .unwrap_or_default()
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.ranking_cache.write() {
            cache.clear();
        }
    }
}

/// Live stream of ranking updates for one subscriber
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<Player>,
    broadcaster: Weak<Broadcaster>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Detach from the broadcaster. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.unsubscribe(self.id);
        }
        self.receiver.close();
    }

    /// Next update, or `None` once unsubscribed and drained
    pub async fn recv(&mut self) -> Option<Player> {
        self.receiver.recv().await
    }

    /// Next queued update without waiting
    pub fn try_recv(&mut self) -> Option<Player> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Player;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
