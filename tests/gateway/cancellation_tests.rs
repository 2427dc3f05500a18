//! Cancellation of commands before they reach the wire.

use crate::harness::GatewayHarness;
use skein_client::{SkeinClient, SkeinError, TokenSupplier};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_pre_cancelled_token_fails_the_send() {
    let harness = GatewayHarness::plaintext().await;
    let client = SkeinClient::builder()
        .gateway_address(harness.address())
        .with_plaintext()
        .build()
        .await
        .unwrap();

    let token = CancellationToken::new();
    token.cancel();

    let err = client
        .publish_message()
        .message_name("order-paid")
        .with_cancellation(token)
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, SkeinError::Cancelled));
    assert!(harness.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_during_credential_fetch_aborts_the_send() {
    let harness = GatewayHarness::plaintext().await;
    let supplier = TokenSupplier::new(|| async {
        // stands in for a token refresh that never finishes
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("tok".to_string())
    });
    let client = SkeinClient::builder()
        .gateway_address(harness.address())
        .with_plaintext()
        .credentials(supplier)
        .build()
        .await
        .unwrap();

    let token = CancellationToken::new();
    let in_flight = tokio::spawn({
        let token = token.clone();
        async move {
            client
                .topology()
                .with_cancellation(token)
                .send()
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let err = in_flight.await.unwrap().unwrap_err();
    assert!(matches!(err, SkeinError::Cancelled));
    assert!(harness.recorded_calls().is_empty());
}
