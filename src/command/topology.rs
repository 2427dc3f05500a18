//! Topology command and the cluster view it returns.

use crate::client::ClientInner;
use crate::error::Result;
use crate::generated::skein_v1 as proto;
use crate::generated::skein_v1::gateway_client::GatewayClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Requests the gateway's current view of the cluster.
///
/// Created via [`SkeinClient::topology`]; has no fields beyond an optional
/// cancellation token.
///
/// [`SkeinClient::topology`]: crate::client::SkeinClient::topology
pub struct TopologyCommand {
    client: Arc<ClientInner>,
    cancellation: CancellationToken,
}

impl TopologyCommand {
    pub(crate) fn new(client: Arc<ClientInner>) -> Self {
        Self {
            client,
            cancellation: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token; cancelling it before the request is on
    /// the wire fails the send with [`SkeinError::Cancelled`].
    ///
    /// [`SkeinError::Cancelled`]: crate::error::SkeinError::Cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Send the request and await the cluster topology.
    pub async fn send(self) -> Result<Topology> {
        let channel = self.client.channel()?;
        let request = self
            .client
            .authorize(proto::TopologyRequest {}, "Topology", self.cancellation)
            .await?;
        let response = GatewayClient::new(channel).topology(request).await?;
        Ok(response.into_inner().into())
    }
}

/// The gateway's view of the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Brokers that are part of the cluster
    pub brokers: Vec<BrokerInfo>,
    /// Number of nodes in the cluster
    pub cluster_size: i32,
    /// Number of partitions spread across the cluster
    pub partition_count: i32,
    /// Configured replication factor
    pub replication_factor: i32,
    /// Version the gateway reports
    pub gateway_version: String,
}

/// One broker in the cluster and the partitions it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerInfo {
    /// Node ID, unique within the cluster
    pub node_id: i32,
    /// Hostname of the broker
    pub host: String,
    /// Command port of the broker
    pub port: i32,
    /// Partitions managed or replicated on this broker
    pub partitions: Vec<PartitionInfo>,
}

impl BrokerInfo {
    /// The broker's address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One partition as seen from a single broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionInfo {
    /// Unique ID of the partition
    pub partition_id: i32,
    /// Role the broker plays for this partition
    pub role: PartitionRole,
    /// Reported health of the partition
    pub health: PartitionHealth,
}

/// Role a broker plays for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionRole {
    Leader,
    Follower,
    Inactive,
}

/// Health of one partition on one broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionHealth {
    Healthy,
    Unhealthy,
    Dead,
}

impl From<proto::TopologyResponse> for Topology {
    fn from(response: proto::TopologyResponse) -> Self {
        Self {
            brokers: response.brokers.into_iter().map(Into::into).collect(),
            cluster_size: response.cluster_size,
            partition_count: response.partitions_count,
            replication_factor: response.replication_factor,
            gateway_version: response.gateway_version,
        }
    }
}

impl From<proto::BrokerInfo> for BrokerInfo {
    fn from(broker: proto::BrokerInfo) -> Self {
        Self {
            node_id: broker.node_id,
            host: broker.host,
            port: broker.port,
            partitions: broker.partitions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<proto::Partition> for PartitionInfo {
    fn from(partition: proto::Partition) -> Self {
        // Unknown enum values from a newer gateway degrade to the most
        // conservative reading rather than failing the whole response
        let role = proto::PartitionBrokerRole::try_from(partition.role)
            .map(Into::into)
            .unwrap_or(PartitionRole::Inactive);
        let health = proto::PartitionHealthStatus::try_from(partition.health)
            .map(Into::into)
            .unwrap_or(PartitionHealth::Dead);
        Self {
            partition_id: partition.partition_id,
            role,
            health,
        }
    }
}

impl From<proto::PartitionBrokerRole> for PartitionRole {
    fn from(role: proto::PartitionBrokerRole) -> Self {
        match role {
            proto::PartitionBrokerRole::Leader => Self::Leader,
            proto::PartitionBrokerRole::Follower => Self::Follower,
            proto::PartitionBrokerRole::Inactive => Self::Inactive,
        }
    }
}

impl From<proto::PartitionHealthStatus> for PartitionHealth {
    fn from(health: proto::PartitionHealthStatus) -> Self {
        match health {
            proto::PartitionHealthStatus::Healthy => Self::Healthy,
            proto::PartitionHealthStatus::Unhealthy => Self::Unhealthy,
            proto::PartitionHealthStatus::Dead => Self::Dead,
        }
    }
}
