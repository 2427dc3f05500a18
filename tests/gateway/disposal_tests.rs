//! Disposal semantics of the client facade.

use crate::harness::GatewayHarness;
use skein_client::{SkeinClient, SkeinError};
use std::time::Duration;

async fn client_for(harness: &GatewayHarness) -> SkeinClient {
    SkeinClient::builder()
        .gateway_address(harness.address())
        .with_plaintext()
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_repeated_dispose_is_a_noop() {
    let harness = GatewayHarness::plaintext().await;
    let client = client_for(&harness).await;

    assert!(!client.is_disposed());
    client.dispose();
    assert!(client.is_disposed());
    // calls 2..N neither error nor change state
    for _ in 0..4 {
        client.dispose();
    }
    assert!(client.is_disposed());
}

#[tokio::test]
async fn test_send_after_dispose_fails_with_disposed_error() {
    let harness = GatewayHarness::plaintext().await;
    let client = client_for(&harness).await;
    client.dispose();

    let err = client
        .publish_message()
        .message_name("order-paid")
        .correlation_key("order-4711")
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, SkeinError::ClientDisposed));
    assert!(err.to_string().contains("disposed"));

    let err = client.topology().send().await.unwrap_err();
    assert!(matches!(err, SkeinError::ClientDisposed));

    // nothing reached the gateway
    assert!(harness.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_in_flight_send_completes_across_dispose() {
    let harness = GatewayHarness::plaintext_with_delay(Duration::from_millis(500)).await;
    let client = client_for(&harness).await;

    let in_flight = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .publish_message()
                .message_name("order-paid")
                .correlation_key("order-4711")
                .send()
                .await
        }
    });

    // let the send pass admission, then dispose underneath it
    tokio::time::sleep(Duration::from_millis(150)).await;
    client.dispose();

    let ack = in_flight.await.unwrap().unwrap();
    assert!(ack.message_key > 0);

    // new sends are rejected
    let err = client.topology().send().await.unwrap_err();
    assert!(matches!(err, SkeinError::ClientDisposed));
}
