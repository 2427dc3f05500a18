//! Skein client SDK for Rust
//!
//! This SDK provides a builder-style API for connecting to a Skein gateway
//! and issuing commands to the cluster behind it, over plaintext or TLS,
//! with pluggable per-call credentials.
//!
//! ```ignore
//! use skein_client::SkeinClient;
//!
//! let client = SkeinClient::builder()
//!     .gateway_address("localhost:26500")
//!     .with_root_certificate_file("/etc/skein/ca.pem")
//!     .build()
//!     .await?;
//!
//! let ack = client
//!     .publish_message()
//!     .message_name("order-paid")
//!     .correlation_key("order-4711")
//!     .send()
//!     .await?;
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod generated;

// Re-export error types
pub use error::{Result, SkeinError};

// Re-export client types
pub use client::{
    BasicAuthCredentials, CallContext, CertificateSource, CredentialsProvider, NoCredentials,
    SkeinClient, SkeinClientBuilder, StaticCredentials, TokenCredentials, TokenSupplier,
};
#[cfg(feature = "oauth2")]
pub use client::{OAuth2Credentials, OAuth2Provider};

// Re-export command types
pub use command::{
    BrokerInfo, PartitionHealth, PartitionInfo, PartitionRole, PublishMessageAck,
    PublishMessageCommand, Topology, TopologyCommand,
};

// Re-export config types
pub use config::ClientConfig;
