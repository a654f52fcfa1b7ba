use super::dispatch_harness::DispatchHarness;
use ratatosk::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn passthrough_message_becomes_ready_with_content_untouched() {
    let mut harness = DispatchHarness::start();
    harness.register_worker("echo", false);
    harness.insert_message(Message::inbound("echo", b"hello".to_vec()).with_id("m1"));

    harness.publish_received("m1").await;

    assert_eq!(harness.next_ready().await, "m1");
    assert_eq!(harness.stored_content("m1"), b"hello".to_vec());
    harness.shutdown().await;
}

#[tokio::test]
async fn detached_message_is_dereferenced_before_becoming_ready() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
        .expect(1)
        .mount(&server)
        .await;

    let mut harness = DispatchHarness::start();
    harness.register_worker("fetch", true);
    let envelope = format!("\"{}/data\"", server.uri());
    harness.insert_message(Message::inbound("fetch", envelope.into_bytes()).with_id("m2"));

    harness.publish_received("m2").await;

    assert_eq!(harness.next_ready().await, "m2");
    assert_eq!(harness.stored_content("m2"), b"payload".to_vec());
    harness.shutdown().await;
}

#[tokio::test]
async fn unroutable_message_retires_exactly_once() {
    let mut harness = DispatchHarness::start();
    harness.insert_message(Message::inbound("nobody", b"hello".to_vec()).with_id("m1"));

    harness.publish_received("m1").await;

    assert_eq!(harness.next_retired().await, "m1");
    harness.expect_retired_silence().await;
    assert_eq!(harness.stored_content("m1"), b"hello".to_vec());
    harness.shutdown().await;
}

#[tokio::test]
async fn failed_dereference_emits_nothing_and_keeps_the_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(500).set_body_string("downstream broke"))
        .mount(&server)
        .await;

    let mut harness = DispatchHarness::start();
    harness.register_worker("fetch", true);
    let envelope = format!("\"{}/data\"", server.uri());
    harness.insert_message(
        Message::inbound("fetch", envelope.clone().into_bytes()).with_id("m2"),
    );

    harness.publish_received("m2").await;

    harness.expect_ready_silence().await;
    harness.expect_retired_silence().await;
    assert_eq!(harness.stored_content("m2"), envelope.into_bytes());
    harness.shutdown().await;
}

#[tokio::test]
async fn one_bad_message_does_not_stall_the_loop() {
    let mut harness = DispatchHarness::start();
    harness.register_worker("echo", false);
    harness.insert_message(Message::inbound("echo", b"good".to_vec()).with_id("m2"));

    // The first identifier has no record behind it; the loop must log and
    // move on to the next one.
    harness.publish_received("ghost").await;
    harness.publish_received("m2").await;

    assert_eq!(harness.next_ready().await, "m2");
    harness.shutdown().await;
}
