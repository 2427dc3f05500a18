//! Topology command against the in-process gateway.

use crate::harness::GatewayHarness;
use skein_client::{PartitionHealth, PartitionRole, SkeinClient};

async fn client_for(harness: &GatewayHarness) -> SkeinClient {
    SkeinClient::builder()
        .gateway_address(harness.address())
        .with_plaintext()
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_topology_returns_the_cluster_view() {
    let harness = GatewayHarness::plaintext().await;
    let client = client_for(&harness).await;

    let topology = client.topology().send().await.unwrap();

    assert_eq!(topology.cluster_size, 1);
    assert_eq!(topology.partition_count, 1);
    assert_eq!(topology.replication_factor, 1);
    assert!(!topology.gateway_version.is_empty());

    let broker = &topology.brokers[0];
    assert_eq!(broker.node_id, 0);
    assert_eq!(broker.address(), "localhost:26501");
    assert_eq!(broker.partitions[0].partition_id, 1);
    assert_eq!(broker.partitions[0].role, PartitionRole::Leader);
    assert_eq!(broker.partitions[0].health, PartitionHealth::Healthy);
}

#[tokio::test]
async fn test_concurrent_sends_resolve_independently() {
    let harness = GatewayHarness::plaintext().await;
    let client = client_for(&harness).await;

    let (topology, first, second) = tokio::join!(
        client.topology().send(),
        client
            .publish_message()
            .message_name("order-paid")
            .correlation_key("order-1")
            .send(),
        client
            .publish_message()
            .message_name("order-paid")
            .correlation_key("order-2")
            .send(),
    );

    assert_eq!(topology.unwrap().cluster_size, 1);
    assert!(first.unwrap().message_key > 0);
    assert!(second.unwrap().message_key > 0);

    let calls = harness.recorded_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls.iter().filter(|c| c.method == "Topology").count(),
        1
    );
    assert_eq!(
        calls.iter().filter(|c| c.method == "PublishMessage").count(),
        2
    );
}
