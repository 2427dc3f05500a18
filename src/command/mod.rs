//! Fluent command builders for gateway operations.
//!
//! Each command is created from a [`SkeinClient`] factory method, configured
//! through chained setters, and consumed by its terminal `send()`. Responses
//! are mapped from the wire types into the domain types exported here.
//!
//! [`SkeinClient`]: crate::client::SkeinClient

mod publish_message;
mod topology;

pub use publish_message::{PublishMessageAck, PublishMessageCommand, DEFAULT_TIME_TO_LIVE};
pub use topology::{
    BrokerInfo, PartitionHealth, PartitionInfo, PartitionRole, Topology, TopologyCommand,
};
