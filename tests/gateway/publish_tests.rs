//! Publish-message command against the in-process gateway.

use crate::harness::GatewayHarness;
use skein_client::{SkeinClient, SkeinError};
use serde_json::json;
use tonic::Code;

async fn client_for(harness: &GatewayHarness) -> SkeinClient {
    SkeinClient::builder()
        .gateway_address(harness.address())
        .with_plaintext()
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_publish_returns_an_acknowledgment() {
    let harness = GatewayHarness::plaintext().await;
    let client = client_for(&harness).await;

    let first = client
        .publish_message()
        .message_name("order-paid")
        .correlation_key("order-4711")
        .variables(&json!({"amount": 42}))
        .unwrap()
        .send()
        .await
        .unwrap();
    let second = client
        .publish_message()
        .message_name("order-paid")
        .correlation_key("order-4712")
        .send()
        .await
        .unwrap();

    assert!(first.message_key > 0);
    assert_ne!(first.message_key, second.message_key);
}

#[tokio::test]
async fn test_duplicate_message_id_is_rejected_by_the_gateway() {
    let harness = GatewayHarness::plaintext().await;
    let client = client_for(&harness).await;

    let publish = || {
        client
            .publish_message()
            .message_name("order-paid")
            .correlation_key("order-4711")
            .message_id("msg-1")
            .send()
    };

    publish().await.unwrap();
    let err = publish().await.unwrap_err();
    assert!(matches!(err, SkeinError::Grpc(_)));
    assert_eq!(err.status_code(), Some(Code::AlreadyExists));
}

#[tokio::test]
async fn test_unreachable_gateway_fails_as_unavailable() {
    // nothing listens on port 1; the lazy channel only fails at send time
    let client = SkeinClient::builder()
        .gateway_address("localhost:1")
        .with_plaintext()
        .build()
        .await
        .unwrap();

    let err = client
        .publish_message()
        .message_name("order-paid")
        .send()
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(Code::Unavailable));
}
