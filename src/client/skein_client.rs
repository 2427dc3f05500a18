//! SkeinClient - entry point for issuing gateway commands
//!
//! The facade hands out one command builder per gateway operation; every
//! builder shares the facade's channel, credential strategy, and disposal
//! state.

use crate::client::builder::SkeinClientBuilder;
use crate::client::credentials::{CallContext, CredentialsProvider};
use crate::command::{PublishMessageCommand, TopologyCommand};
use crate::config::ClientConfig;
use crate::error::{Result, SkeinError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::metadata::KeyAndValueRef;
use tonic::transport::Channel;
use tonic::Request;
use tracing::debug;

/// Main client for issuing commands to a Skein gateway.
///
/// Cheap to clone; all clones share one channel and one disposal state.
///
/// Example:
/// ```ignore
/// let client = SkeinClient::builder()
///     .gateway_address("localhost:26500")
///     .with_plaintext()
///     .build()?;
///
/// let topology = client.topology().send().await?;
/// println!("cluster has {} brokers", topology.brokers.len());
///
/// client.dispose();
/// ```
#[derive(Clone)]
pub struct SkeinClient {
    inner: Arc<ClientInner>,
}

impl SkeinClient {
    /// Create a new builder for [`SkeinClient`].
    pub fn builder() -> SkeinClientBuilder {
        SkeinClientBuilder::new()
    }

    pub(crate) fn from_parts(
        channel: Channel,
        credentials: Arc<dyn CredentialsProvider>,
        config: ClientConfig,
        gateway_address: String,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                channel,
                credentials,
                config,
                gateway_address,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The address this client was configured with.
    pub fn gateway_address(&self) -> &str {
        &self.inner.gateway_address
    }

    /// The transport configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Request the gateway's current view of the cluster.
    pub fn topology(&self) -> TopologyCommand {
        TopologyCommand::new(self.inner.clone())
    }

    /// Publish a message, correlated to workflows by its correlation key.
    pub fn publish_message(&self) -> PublishMessageCommand {
        PublishMessageCommand::new(self.inner.clone())
    }

    /// Dispose the client.
    ///
    /// One-way and idempotent: the first call transitions the client, later
    /// calls are no-ops. Commands already in flight run to completion; any
    /// send admitted after this point fails with
    /// [`SkeinError::ClientDisposed`]. The underlying connection closes once
    /// the last in-flight command finishes.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            debug!(
                "Client for {} disposed, gateway channel released",
                self.inner.gateway_address
            );
        }
    }

    /// Whether [`dispose`] has been called.
    ///
    /// [`dispose`]: SkeinClient::dispose
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SkeinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkeinClient")
            .field("gateway_address", &self.inner.gateway_address)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// State shared between the facade and the commands it creates.
pub(crate) struct ClientInner {
    channel: Channel,
    credentials: Arc<dyn CredentialsProvider>,
    config: ClientConfig,
    gateway_address: String,
    disposed: AtomicBool,
}

impl ClientInner {
    /// Admission check for a new send; hands out the channel only while the
    /// client is open. The load pairs with the swap in `dispose`, so no send
    /// is admitted after a dispose completes.
    pub(crate) fn channel(&self) -> Result<Channel> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(SkeinError::ClientDisposed);
        }
        Ok(self.channel.clone())
    }

    /// Build the authenticated request for one outbound call: fetch credential
    /// headers, racing the cancellation token, and merge them into the request
    /// metadata.
    pub(crate) async fn authorize<T>(
        &self,
        message: T,
        method: &'static str,
        cancellation: CancellationToken,
    ) -> Result<Request<T>> {
        if cancellation.is_cancelled() {
            return Err(SkeinError::Cancelled);
        }

        let ctx = CallContext::new(method, cancellation.clone());
        let headers = tokio::select! {
            _ = cancellation.cancelled() => return Err(SkeinError::Cancelled),
            headers = self.credentials.headers(&ctx) => headers.map_err(|e| match e {
                SkeinError::Authentication(_) | SkeinError::Cancelled => e,
                other => SkeinError::Authentication(other.to_string()),
            })?,
        };

        let mut request = Request::new(message);
        for entry in headers.iter() {
            match entry {
                KeyAndValueRef::Ascii(key, value) => {
                    request.metadata_mut().append(key.clone(), value.clone());
                }
                KeyAndValueRef::Binary(key, value) => {
                    request.metadata_mut().append_bin(key.clone(), value.clone());
                }
            }
        }
        Ok(request)
    }
}
