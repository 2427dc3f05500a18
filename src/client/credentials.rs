//! Per-call credential strategies for gateway requests
//!
//! Every command send asks the configured [`CredentialsProvider`] for a set of
//! metadata headers to merge into the outgoing request. Strategies range from
//! nothing at all to a dynamic token supplier awaited before each call.
//! Providers must be safe to call concurrently; several commands may be in
//! flight on the same client.

use crate::error::{Result, SkeinError};
use async_trait::async_trait;
use base64::Engine;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};
use tracing::debug;

/// Context describing one outbound call, handed to credential providers.
#[derive(Debug, Clone)]
pub struct CallContext {
    method: &'static str,
    cancellation: CancellationToken,
}

impl CallContext {
    pub(crate) fn new(method: &'static str, cancellation: CancellationToken) -> Self {
        Self {
            method,
            cancellation,
        }
    }

    /// Name of the gateway RPC about to be invoked.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Token that is cancelled when the caller abandons the call. Long-running
    /// providers should observe it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Strategy producing authentication metadata for one outbound call.
///
/// Header names are normalized to lowercase on the wire; values reach the
/// gateway byte-for-byte.
///
/// # Example
///
/// ```ignore
/// struct TenantCredentials {
///     tenant: String,
/// }
///
/// #[async_trait]
/// impl CredentialsProvider for TenantCredentials {
///     async fn headers(&self, _ctx: &CallContext) -> Result<MetadataMap> {
///         let mut headers = MetadataMap::new();
///         headers.insert("x-tenant", self.tenant.parse().unwrap());
///         Ok(headers)
///     }
/// }
/// ```
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Produce the headers to merge into the call's metadata.
    ///
    /// Errors abort the call before it reaches the transport, surfaced to the
    /// caller as [`SkeinError::Authentication`].
    async fn headers(&self, ctx: &CallContext) -> Result<MetadataMap>;
}

/// No authentication; attaches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialsProvider for NoCredentials {
    async fn headers(&self, _ctx: &CallContext) -> Result<MetadataMap> {
        Ok(MetadataMap::new())
    }
}

/// Static access token, attached as `authorization: Bearer <token>`.
#[derive(Clone)]
pub struct TokenCredentials {
    value: AsciiMetadataValue,
}

impl TokenCredentials {
    /// Create a bearer-token strategy from a static token.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let value = format!("Bearer {}", token.as_ref()).parse().map_err(|_| {
            SkeinError::InvalidConfiguration(
                "access token is not a valid header value".to_string(),
            )
        })?;
        Ok(Self { value })
    }
}

impl std::fmt::Debug for TokenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCredentials")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CredentialsProvider for TokenCredentials {
    async fn headers(&self, _ctx: &CallContext) -> Result<MetadataMap> {
        let mut headers = MetadataMap::new();
        headers.insert("authorization", self.value.clone());
        debug!("Attached bearer token to gateway request");
        Ok(headers)
    }
}

/// Basic authentication, attached as `authorization: Basic <base64>`.
#[derive(Clone)]
pub struct BasicAuthCredentials {
    value: AsciiMetadataValue,
}

impl BasicAuthCredentials {
    /// Create a basic-auth strategy from a username and password.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let raw = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        let value = format!("Basic {}", encoded)
            .parse()
            .expect("base64 output is always a valid header value");
        Self { value }
    }
}

impl std::fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CredentialsProvider for BasicAuthCredentials {
    async fn headers(&self, _ctx: &CallContext) -> Result<MetadataMap> {
        let mut headers = MetadataMap::new();
        headers.insert("authorization", self.value.clone());
        Ok(headers)
    }
}

/// Arbitrary static headers, attached verbatim to every call.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    headers: MetadataMap,
}

impl StaticCredentials {
    /// Create an empty strategy; combine with [`with_header`].
    ///
    /// [`with_header`]: StaticCredentials::with_header
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one header. The name is validated here so a typo fails the build
    /// of the strategy, not some later send.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name: AsciiMetadataKey = name.parse().map_err(|_| {
            SkeinError::InvalidConfiguration(format!("invalid header name: {}", name))
        })?;
        let value: AsciiMetadataValue = value.parse().map_err(|_| {
            SkeinError::InvalidConfiguration(format!("invalid value for header {}", name))
        })?;
        self.headers.append(name, value);
        Ok(self)
    }
}

impl From<MetadataMap> for StaticCredentials {
    fn from(headers: MetadataMap) -> Self {
        Self { headers }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn headers(&self, _ctx: &CallContext) -> Result<MetadataMap> {
        Ok(self.headers.clone())
    }
}

/// Future returned by a [`TokenSupplier`] callback.
pub type TokenFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// Dynamic token strategy.
///
/// The supplier runs once per send, so a command issued after a token refresh
/// picks the new token up automatically. Invocations are counted so tests can
/// assert the once-per-request behavior.
#[derive(Clone)]
pub struct TokenSupplier {
    supplier: Arc<dyn Fn() -> TokenFuture + Send + Sync>,
    invocations: Arc<AtomicUsize>,
}

impl TokenSupplier {
    /// Create a strategy around an async token callback.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let supplier = TokenSupplier::new(|| async {
    ///     Ok(identity_provider.fresh_token().await?)
    /// });
    /// ```
    pub fn new<F, Fut>(supplier: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            supplier: Arc::new(move || Box::pin(supplier()) as TokenFuture),
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times the supplier callback has been invoked.
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for TokenSupplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSupplier")
            .field("invocations", &self.invocation_count())
            .finish()
    }
}

#[async_trait]
impl CredentialsProvider for TokenSupplier {
    async fn headers(&self, ctx: &CallContext) -> Result<MetadataMap> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let token = (self.supplier)().await?;
        let value: AsciiMetadataValue = format!("Bearer {}", token).parse().map_err(|_| {
            SkeinError::Authentication("supplied token is not a valid header value".to_string())
        })?;
        let mut headers = MetadataMap::new();
        headers.insert("authorization", value);
        debug!("Attached supplied token to {} request", ctx.method());
        Ok(headers)
    }
}
