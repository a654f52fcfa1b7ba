use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// Receive half of one subscription. The stream ends when the bus shuts
/// down or the subscription is pruned.
pub type SignalStream<T> = mpsc::Receiver<T>;

/// In-process publish/subscribe registry keyed by topic name.
///
/// Every subscription is an independent stream with a buffer of one value:
/// a publisher never waits for a subscriber that is merely behind by one,
/// but blocks once that slot is full until the subscriber catches up. The
/// bus carries identifiers only; anything stateful is looked up in the
/// record store by the consumer.
///
/// Cloning the bus clones a handle to the same registry, so the component
/// wiring the system together can hand it to producers and consumers alike.
#[derive(Debug, Clone)]
pub struct SignalBus<T> {
    topics: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<T>>>>>,
}

impl<T: Clone + Send + 'static> SignalBus<T> {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Open an independent stream of values published on `topic`.
    pub fn subscribe(&self, topic: &str) -> SignalStream<T> {
        let (tx, rx) = mpsc::channel(1);
        let mut topics = self
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        topics.entry(topic.to_string()).or_default().push(tx);
        rx
    }

    /// Deliver `value` to every current subscriber of `topic`.
    ///
    /// Publishing to a topic nobody subscribes to is a no-op. Waits on each
    /// subscriber whose buffer is full, so a stalled consumer stalls the
    /// publisher too.
    pub async fn publish(&self, topic: &str, value: T) {
        // Senders are cloned out so the registry lock is never held across
        // an await.
        let senders = {
            let topics = self
                .topics
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match topics.get(topic) {
                Some(senders) => senders.clone(),
                None => return,
            }
        };

        let mut dropped = false;
        for sender in senders {
            if sender.send(value.clone()).await.is_err() {
                dropped = true;
            }
        }

        if dropped {
            self.prune(topic);
        }
    }

    /// Number of live subscriptions for `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        topics.get(topic).map_or(0, Vec::len)
    }

    /// Close every stream on every topic. Subscribers observe end-of-stream,
    /// which is how handler loops learn to exit.
    pub fn shutdown(&self) {
        let mut topics = self
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug!("signal bus shutting down {} topic(s)", topics.len());
        topics.clear();
    }

    /// Drop senders whose receiving side has gone away.
    fn prune(&self, topic: &str) {
        let mut topics = self
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(senders) = topics.get_mut(topic) {
            senders.retain(|sender| !sender.is_closed());
            if senders.is_empty() {
                topics.remove(topic);
            }
        }
    }
}
