//! Connection configuration and credential strategies for the gateway client.
//!
//! [`SkeinClientBuilder`] assembles the channel, [`CredentialsProvider`]
//! implementations attach authentication metadata to every call, and
//! [`SkeinClient`] is the facade commands are issued from.

mod builder;
mod credentials;
#[cfg(feature = "oauth2")]
mod oauth2;
mod skein_client;

pub use builder::{
    CertificateSource, SkeinClientBuilder, ENV_ACCESS_TOKEN, ENV_CA_CERTIFICATE_PATH,
    ENV_GATEWAY_ADDRESS, ENV_INSECURE_CONNECTION,
};
pub use credentials::{
    BasicAuthCredentials, CallContext, CredentialsProvider, NoCredentials, StaticCredentials,
    TokenCredentials, TokenFuture, TokenSupplier,
};
#[cfg(feature = "oauth2")]
pub use oauth2::{OAuth2Credentials, OAuth2Provider, TokenResponse};
pub use skein_client::SkeinClient;

pub(crate) use skein_client::ClientInner;
