use super::dispatch_harness::DispatchHarness;
use ratatosk::{Message, topic};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn messages_complete_in_publish_order_despite_variable_latency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow-body")
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fast-body"))
        .mount(&server)
        .await;

    let mut harness = DispatchHarness::start();
    harness.register_worker("fetch", true);
    for i in 0..5 {
        let route = if i == 0 { "slow" } else { "fast" };
        let envelope = format!("\"{}/{route}\"", server.uri());
        harness.insert_message(
            Message::inbound("fetch", envelope.into_bytes()).with_id(format!("m-{i}")),
        );
    }

    // Feed identifiers from a separate task: the received stream has a
    // single-slot buffer, so the publisher blocks while the loop works.
    let bus = harness.bus.clone();
    let publisher = tokio::spawn(async move {
        for i in 0..5 {
            bus.publish(topic::MESSAGE_RECEIVED, format!("m-{i}")).await;
        }
    });

    // The slow head must not be overtaken by the fast tail.
    for i in 0..5 {
        assert_eq!(harness.next_ready().await, format!("m-{i}"));
    }

    publisher.await.expect("publisher task should finish");
    harness.shutdown().await;
}

#[tokio::test]
async fn receive_and_return_loops_run_independently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("payload")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let mut harness = DispatchHarness::start();
    harness.register_worker("fetch", true);
    harness.register_worker("echo", false);
    let envelope = format!("\"{}/data\"", server.uri());
    harness.insert_message(Message::inbound("fetch", envelope.into_bytes()).with_id("m1"));
    harness.insert_message(Message::inbound("echo", b"task".to_vec()).with_id("m2"));
    harness.insert_message(
        Message::reply("http://collector.test", "m2", b"out".to_vec()).with_id("r1"),
    );

    // While the receive loop sits in the slow GET for m1, the return loop
    // retires r1.
    let started = std::time::Instant::now();
    harness.publish_received("m1").await;
    harness.publish_returned("r1").await;

    assert_eq!(harness.next_retired().await, "r1");
    assert!(
        started.elapsed() < Duration::from_millis(300),
        "return loop must not wait for the receive loop"
    );
    assert_eq!(harness.next_ready().await, "m1");
    harness.shutdown().await;
}
