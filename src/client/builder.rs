//! Fluent builder for [`SkeinClient`] connections
//!
//! The builder validates the connection configuration up front; the network
//! itself is only touched on the first send, so an unreachable gateway or a
//! rejected certificate surfaces as a transport error on that send, never
//! from [`build`].
//!
//! [`build`]: SkeinClientBuilder::build

use crate::client::credentials::{CredentialsProvider, NoCredentials, TokenCredentials};
use crate::client::skein_client::SkeinClient;
use crate::config::ClientConfig;
use crate::error::{Result, SkeinError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Certificate, ClientTlsConfig, Endpoint};
use tracing::debug;

/// Environment variable naming the gateway address (`host:port`).
pub const ENV_GATEWAY_ADDRESS: &str = "SKEIN_GATEWAY_ADDRESS";
/// Environment variable naming a trusted root certificate file.
pub const ENV_CA_CERTIFICATE_PATH: &str = "SKEIN_CA_CERTIFICATE_PATH";
/// Environment variable carrying a static access token.
pub const ENV_ACCESS_TOKEN: &str = "SKEIN_ACCESS_TOKEN";
/// Environment variable opting into an unencrypted connection (`true`).
pub const ENV_INSECURE_CONNECTION: &str = "SKEIN_INSECURE_CONNECTION";

/// Source of the trusted root certificate used to validate the gateway.
#[derive(Debug, Clone)]
pub enum CertificateSource {
    /// PEM bundle read from a file when the client is built
    File(PathBuf),
    /// PEM bytes provided directly
    Pem(Vec<u8>),
}

impl CertificateSource {
    fn load(&self) -> Result<Certificate> {
        let pem = match self {
            Self::File(path) => std::fs::read(path).map_err(|e| {
                SkeinError::InvalidConfiguration(format!(
                    "cannot read CA certificate {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Self::Pem(bytes) => bytes.clone(),
        };
        Ok(Certificate::from_pem(pem))
    }
}

/// Builder for [`SkeinClient`] instances.
///
/// Example:
/// ```ignore
/// let client = SkeinClient::builder()
///     .gateway_address("localhost:26500")
///     .with_root_certificate_file("/etc/skein/ca.pem")
///     .credentials(TokenCredentials::new(token)?)
///     .build()?;
/// ```
pub struct SkeinClientBuilder {
    gateway_address: Option<String>,
    plaintext: bool,
    root_certificate: Option<CertificateSource>,
    credentials: Arc<dyn CredentialsProvider>,
    config: ClientConfig,
}

impl Default for SkeinClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SkeinClientBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            gateway_address: None,
            plaintext: false,
            root_certificate: None,
            credentials: Arc::new(NoCredentials),
            config: ClientConfig::default(),
        }
    }

    /// Read builder settings from `SKEIN_*` environment variables.
    ///
    /// Recognized: [`ENV_GATEWAY_ADDRESS`], [`ENV_CA_CERTIFICATE_PATH`],
    /// [`ENV_ACCESS_TOKEN`], [`ENV_INSECURE_CONNECTION`]. Anything not set in
    /// the environment can still be configured through the fluent setters.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::new();
        if let Ok(address) = std::env::var(ENV_GATEWAY_ADDRESS) {
            builder.gateway_address = Some(address);
        }
        if let Ok(path) = std::env::var(ENV_CA_CERTIFICATE_PATH) {
            builder.root_certificate = Some(CertificateSource::File(path.into()));
        }
        if std::env::var(ENV_INSECURE_CONNECTION)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
        {
            builder.plaintext = true;
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            builder.credentials = Arc::new(TokenCredentials::new(token)?);
        }
        Ok(builder)
    }

    /// Set the gateway address as `host:port`. Required.
    pub fn gateway_address(mut self, address: impl Into<String>) -> Self {
        self.gateway_address = Some(address.into());
        self
    }

    /// Use an unencrypted connection.
    ///
    /// Mutually exclusive with [`with_transport_security`]; the builder never
    /// falls back to plaintext silently.
    ///
    /// [`with_transport_security`]: SkeinClientBuilder::with_transport_security
    pub fn with_plaintext(mut self) -> Self {
        self.plaintext = true;
        self
    }

    /// Encrypt the connection and validate the gateway against the given
    /// trusted root certificate.
    pub fn with_transport_security(mut self, certificate: CertificateSource) -> Self {
        self.root_certificate = Some(certificate);
        self
    }

    /// Shorthand for [`CertificateSource::File`].
    pub fn with_root_certificate_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_transport_security(CertificateSource::File(path.into()))
    }

    /// Shorthand for [`CertificateSource::Pem`].
    pub fn with_root_certificate_pem(self, pem: impl Into<Vec<u8>>) -> Self {
        self.with_transport_security(CertificateSource::Pem(pem.into()))
    }

    /// Set the credential strategy invoked before every call.
    ///
    /// Default: no credentials.
    pub fn credentials(mut self, provider: impl CredentialsProvider + 'static) -> Self {
        self.credentials = Arc::new(provider);
        self
    }

    /// Set the timeout applied to each RPC.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the timeout for establishing the underlying connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the HTTP/2 keep-alive ping interval.
    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.config.keep_alive_interval = interval;
        self
    }

    /// Replace the complete transport configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and create the client.
    ///
    /// The channel connects lazily: no network I/O happens here, and an
    /// unreachable or untrusted gateway only surfaces on the first send.
    pub async fn build(self) -> Result<SkeinClient> {
        let address = self.gateway_address.ok_or_else(|| {
            SkeinError::InvalidConfiguration("gateway address is required".to_string())
        })?;
        if self.plaintext && self.root_certificate.is_some() {
            return Err(SkeinError::InvalidConfiguration(
                "plaintext and transport security are mutually exclusive".to_string(),
            ));
        }
        if !self.plaintext && self.root_certificate.is_none() {
            return Err(SkeinError::InvalidConfiguration(
                "transport security is not configured; provide a root certificate or opt \
                 into plaintext explicitly"
                    .to_string(),
            ));
        }
        self.config.validate()?;

        let scheme = if self.plaintext { "http" } else { "https" };
        let endpoint = Endpoint::from_shared(format!("{}://{}", scheme, address))
            .map_err(|e| {
                SkeinError::InvalidConfiguration(format!(
                    "invalid gateway address '{}': {}",
                    address, e
                ))
            })?
            .timeout(self.config.request_timeout)
            .connect_timeout(self.config.connect_timeout)
            .http2_keep_alive_interval(self.config.keep_alive_interval)
            .keep_alive_timeout(self.config.keep_alive_timeout)
            .keep_alive_while_idle(true);

        let endpoint = match &self.root_certificate {
            Some(source) => {
                let tls = ClientTlsConfig::new().ca_certificate(source.load()?);
                endpoint.tls_config(tls).map_err(|e| {
                    SkeinError::InvalidConfiguration(format!("invalid TLS configuration: {}", e))
                })?
            }
            None => endpoint,
        };

        let channel = endpoint.connect_lazy();
        debug!("Built gateway client for {}", address);
        Ok(SkeinClient::from_parts(
            channel,
            self.credentials,
            self.config,
            address,
        ))
    }
}
