//! Credential propagation, asserted on what the gateway actually observed.

use crate::harness::GatewayHarness;
use skein_client::{
    BasicAuthCredentials, CredentialsProvider, SkeinClient, SkeinError, StaticCredentials,
    TokenSupplier,
};
use uuid::Uuid;

async fn client_with(
    harness: &GatewayHarness,
    credentials: impl CredentialsProvider + 'static,
) -> SkeinClient {
    SkeinClient::builder()
        .gateway_address(harness.address())
        .with_plaintext()
        .credentials(credentials)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_static_headers_observed_on_every_call() {
    let harness = GatewayHarness::plaintext().await;
    let credentials = StaticCredentials::new()
        .with_header("authorization", "Basic dGVzdDp0ZXN0")
        .unwrap()
        .with_header("customheader", "custom-value")
        .unwrap();
    let client = client_with(&harness, credentials).await;

    for _ in 0..3 {
        client
            .publish_message()
            .message_name("order-paid")
            .correlation_key(Uuid::new_v4().to_string())
            .send()
            .await
            .unwrap();
    }

    let calls = harness.recorded_calls();
    assert_eq!(calls.len(), 3);
    for call in &calls {
        assert_eq!(call.header("authorization"), Some("Basic dGVzdDp0ZXN0"));
        assert_eq!(call.header("customheader"), Some("custom-value"));
    }
}

#[tokio::test]
async fn test_basic_auth_reaches_the_gateway() {
    let harness = GatewayHarness::plaintext().await;
    let client = client_with(&harness, BasicAuthCredentials::new("user", "pass")).await;

    client.topology().send().await.unwrap();

    let calls = harness.recorded_calls();
    assert_eq!(calls[0].header("authorization"), Some("Basic dXNlcjpwYXNz"));
}

#[tokio::test]
async fn test_token_supplier_invoked_once_per_send() {
    let harness = GatewayHarness::plaintext().await;
    let supplier = TokenSupplier::new(|| async { Ok("tok-123".to_string()) });
    let client = client_with(&harness, supplier.clone()).await;

    for _ in 0..3 {
        client.topology().send().await.unwrap();
    }

    assert_eq!(supplier.invocation_count(), 3);
    let calls = harness.recorded_calls();
    assert_eq!(calls.len(), 3);
    for call in &calls {
        assert_eq!(call.header("authorization"), Some("Bearer tok-123"));
    }
}

#[tokio::test]
async fn test_supplier_failure_never_reaches_the_gateway() {
    let harness = GatewayHarness::plaintext().await;
    let supplier = TokenSupplier::new(|| async {
        Err(SkeinError::Authentication("identity provider offline".to_string()))
    });
    let client = client_with(&harness, supplier).await;

    let err = client
        .publish_message()
        .message_name("order-paid")
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, SkeinError::Authentication(_)));
    assert!(harness.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_without_credentials_no_authorization_header_is_sent() {
    let harness = GatewayHarness::plaintext().await;
    let client = SkeinClient::builder()
        .gateway_address(harness.address())
        .with_plaintext()
        .build()
        .await
        .unwrap();

    client.topology().send().await.unwrap();

    let calls = harness.recorded_calls();
    assert_eq!(calls[0].header("authorization"), None);
}
