use ratatosk::{
    DeliveryPolicy, Dispatcher, DispatcherHandle, HttpTransport, Message, SignalBus, SignalStream,
    Store, Worker, topic,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const SIGNAL_WAIT: Duration = Duration::from_secs(5);
const SILENCE_WAIT: Duration = Duration::from_millis(200);

/// A running dispatcher plus subscriptions to its output topics.
pub struct DispatchHarness {
    pub store: Arc<Store>,
    pub bus: SignalBus<String>,
    ready: SignalStream<String>,
    retired: SignalStream<String>,
    handle: DispatcherHandle,
}

impl DispatchHarness {
    pub fn start() -> Self {
        Self::start_with_policy(DeliveryPolicy::RetireAlways)
    }

    pub fn start_with_policy(policy: DeliveryPolicy) -> Self {
        init_tracing();

        let store = Arc::new(Store::new());
        let bus = SignalBus::new();
        let ready = bus.subscribe(topic::MESSAGE_READY);
        let retired = bus.subscribe(topic::MESSAGE_RETIRED);
        let handle = Dispatcher::new(Arc::clone(&store), HttpTransport::new(), bus.clone())
            .with_policy(policy)
            .spawn();

        Self {
            store,
            bus,
            ready,
            retired,
            handle,
        }
    }

    pub fn register_worker(&self, handler: &str, detached_content: bool) {
        let mut txn = self.store.write().expect("store should accept writes");
        txn.put_worker(Worker::new(handler, detached_content));
        txn.commit().expect("worker registration should commit");
    }

    pub fn insert_message(&self, message: Message) {
        let mut txn = self.store.write().expect("store should accept writes");
        txn.put_message(message);
        txn.commit().expect("message insert should commit");
    }

    pub async fn publish_received(&self, id: &str) {
        self.bus
            .publish(topic::MESSAGE_RECEIVED, id.to_string())
            .await;
    }

    pub async fn publish_returned(&self, id: &str) {
        self.bus
            .publish(topic::MESSAGE_RETURNED, id.to_string())
            .await;
    }

    pub async fn next_ready(&mut self) -> String {
        next_signal(&mut self.ready, "ready").await
    }

    pub async fn next_retired(&mut self) -> String {
        next_signal(&mut self.retired, "retired").await
    }

    pub async fn expect_ready_silence(&mut self) {
        expect_silence(&mut self.ready, "ready").await;
    }

    pub async fn expect_retired_silence(&mut self) {
        expect_silence(&mut self.retired, "retired").await;
    }

    pub fn stored_content(&self, id: &str) -> Vec<u8> {
        self.store
            .read()
            .expect("store should open a read txn")
            .message(id)
            .expect("message should exist")
            .content
            .clone()
    }

    /// Close the bus and wait for both handler loops to exit.
    pub async fn shutdown(self) {
        self.bus.shutdown();
        self.handle.join().await;
    }
}

async fn next_signal(stream: &mut SignalStream<String>, name: &str) -> String {
    tokio::time::timeout(SIGNAL_WAIT, stream.recv())
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for a {name} signal"))
        .unwrap_or_else(|| panic!("{name} stream closed unexpectedly"))
}

async fn expect_silence(stream: &mut SignalStream<String>, name: &str) {
    if let Ok(value) = tokio::time::timeout(SILENCE_WAIT, stream.recv()).await {
        panic!("expected no {name} signal, got {value:?}");
    }
}

fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
