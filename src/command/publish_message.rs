//! Publish-message command.

use crate::client::ClientInner;
use crate::error::{Result, SkeinError};
use crate::generated::skein_v1 as proto;
use crate::generated::skein_v1::gateway_client::GatewayClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long a published message is buffered on the gateway unless the caller
/// overrides it.
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(3600);

/// Publishes a single message, correlated to waiting workflows by its
/// correlation key.
///
/// Created via [`SkeinClient::publish_message`]; the message name is
/// required, everything else is optional.
///
/// [`SkeinClient::publish_message`]: crate::client::SkeinClient::publish_message
pub struct PublishMessageCommand {
    client: Arc<ClientInner>,
    request: proto::PublishMessageRequest,
    cancellation: CancellationToken,
}

impl PublishMessageCommand {
    pub(crate) fn new(client: Arc<ClientInner>) -> Self {
        Self {
            client,
            request: proto::PublishMessageRequest {
                time_to_live_millis: DEFAULT_TIME_TO_LIVE.as_millis() as i64,
                ..Default::default()
            },
            cancellation: CancellationToken::new(),
        }
    }

    /// Set the name of the message. Required.
    pub fn message_name(mut self, name: impl Into<String>) -> Self {
        self.request.name = name.into();
        self
    }

    /// Set the correlation key used to match the message to waiting
    /// workflows. May stay empty for messages that start new workflows.
    pub fn correlation_key(mut self, key: impl Into<String>) -> Self {
        self.request.correlation_key = key.into();
        self
    }

    /// Set a unique message ID. While a message with this ID is buffered, the
    /// gateway rejects further messages carrying the same ID.
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.request.message_id = id.into();
        self
    }

    /// Override how long the message is buffered on the gateway.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.request.time_to_live_millis = ttl.as_millis() as i64;
        self
    }

    /// Attach message variables, serialized as a JSON document.
    pub fn variables(mut self, variables: &impl Serialize) -> Result<Self> {
        self.request.variables = serde_json::to_string(variables)?;
        Ok(self)
    }

    /// Attach message variables as a pre-serialized JSON document.
    pub fn variables_json(mut self, json: impl Into<String>) -> Self {
        self.request.variables = json.into();
        self
    }

    /// Attach a cancellation token; cancelling it before the request is on
    /// the wire fails the send with [`SkeinError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Send the message and await the gateway's acknowledgment.
    pub async fn send(self) -> Result<PublishMessageAck> {
        if self.request.name.is_empty() {
            return Err(SkeinError::InvalidConfiguration(
                "message name is required".to_string(),
            ));
        }
        let channel = self.client.channel()?;
        let request = self
            .client
            .authorize(self.request, "PublishMessage", self.cancellation)
            .await?;
        let response = GatewayClient::new(channel).publish_message(request).await?;
        Ok(PublishMessageAck {
            message_key: response.into_inner().key,
        })
    }
}

/// Acknowledgment for a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishMessageAck {
    /// Key the cluster assigned to the message
    pub message_key: i64,
}
