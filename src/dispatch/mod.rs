//! Message lifecycle dispatcher.
//!
//! Two handler loops bound to one bus topic each: the receive loop takes
//! identifiers from [`topic::MESSAGE_RECEIVED`] and publishes on
//! [`topic::MESSAGE_READY`] (or [`topic::MESSAGE_RETIRED`] for
//! undeliverable messages); the return loop takes identifiers from
//! [`topic::MESSAGE_RETURNED`] and publishes on
//! [`topic::MESSAGE_RETIRED`]. Each loop is strictly sequential: one
//! message is fully processed, blocking HTTP included, before the next is
//! taken, which preserves per-topic FIFO order at the cost of head-of-line
//! blocking. Failures are contained per message; the loops only end when
//! the bus closes their input streams.

pub mod receive;
pub mod respond;

use crate::config::DeliveryPolicy;
use crate::signal::{SignalBus, SignalStream};
use crate::store::Store;
use crate::transport::HttpTransport;
use receive::ReceiveOutcome;
use respond::ReturnOutcome;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Bus topics the dispatcher consumes and emits. Values are message
/// identifiers, never content.
pub mod topic {
    /// An inbound message landed in the store.
    pub const MESSAGE_RECEIVED: &str = "message-received";
    /// A message is resolved and safe for local delivery.
    pub const MESSAGE_READY: &str = "message-ready";
    /// A worker produced a reply, stored and awaiting return handling.
    pub const MESSAGE_RETURNED: &str = "message-returned";
    /// A message finished its lifecycle and may be archived.
    pub const MESSAGE_RETIRED: &str = "message-retired";
}

/// The dispatch core: store, transport and bus wired to the two handler
/// loops.
pub struct Dispatcher {
    store: Arc<Store>,
    transport: HttpTransport,
    bus: SignalBus<String>,
    policy: DeliveryPolicy,
}

impl Dispatcher {
    pub fn new(store: Arc<Store>, transport: HttpTransport, bus: SignalBus<String>) -> Self {
        Self {
            store,
            transport,
            bus,
            policy: DeliveryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Subscribe both input topics and start the handler loops.
    ///
    /// Subscriptions are taken before this returns, so anything published
    /// afterwards is observed. The loops run until [`SignalBus::shutdown`]
    /// closes their streams.
    pub fn spawn(self) -> DispatcherHandle {
        let received = self.bus.subscribe(topic::MESSAGE_RECEIVED);
        let returned = self.bus.subscribe(topic::MESSAGE_RETURNED);

        let receive = tokio::spawn(receive_loop(
            Arc::clone(&self.store),
            self.transport.clone(),
            self.bus.clone(),
            received,
        ));
        let reply = tokio::spawn(return_loop(
            self.store,
            self.transport,
            self.bus,
            self.policy,
            returned,
        ));

        DispatcherHandle { receive, reply }
    }
}

/// Join handle for the two spawned loops.
#[derive(Debug)]
pub struct DispatcherHandle {
    receive: JoinHandle<()>,
    reply: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Wait for both loops to exit. Call after shutting down the bus.
    pub async fn join(self) {
        if let Err(error) = self.receive.await {
            warn!("receive loop task failed: {error}");
        }
        if let Err(error) = self.reply.await {
            warn!("return loop task failed: {error}");
        }
    }
}

async fn receive_loop(
    store: Arc<Store>,
    transport: HttpTransport,
    bus: SignalBus<String>,
    mut stream: SignalStream<String>,
) {
    while let Some(id) = stream.recv().await {
        match receive::process_received(&store, &transport, &id).await {
            Ok(ReceiveOutcome::Ready) => {
                debug!("message {id} ready for delivery");
                bus.publish(topic::MESSAGE_READY, id).await;
            }
            Ok(ReceiveOutcome::Undeliverable) => {
                info!("retiring undeliverable message {id}");
                bus.publish(topic::MESSAGE_RETIRED, id).await;
            }
            Err(err) => {
                error!("abandoning received message {id}: {err}");
            }
        }
    }
    debug!("received stream closed, receive loop exiting");
}

async fn return_loop(
    store: Arc<Store>,
    transport: HttpTransport,
    bus: SignalBus<String>,
    policy: DeliveryPolicy,
    mut stream: SignalStream<String>,
) {
    while let Some(id) = stream.recv().await {
        match respond::process_returned(&store, &transport, policy, &id).await {
            Ok(ReturnOutcome::Retired) => {
                debug!("reply {id} retired");
                bus.publish(topic::MESSAGE_RETIRED, id).await;
            }
            Ok(ReturnOutcome::RetiredWithError(err)) => {
                warn!("delivery of reply {id} failed, retiring anyway: {err}");
                bus.publish(topic::MESSAGE_RETIRED, id).await;
            }
            Err(err) => {
                error!("abandoning returned message {id}: {err}");
            }
        }
    }
    debug!("returned stream closed, return loop exiting");
}
