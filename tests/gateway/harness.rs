//! In-process gateway used by the integration tests.
//!
//! Serves the generated `skein.v1.Gateway` service on an ephemeral port,
//! records the metadata of every call, and optionally terminates TLS with
//! the fixture certificates under `tests/fixtures/`.

use skein_client::generated::skein_v1::gateway_server::{Gateway, GatewayServer};
use skein_client::generated::skein_v1::{
    BrokerInfo, Partition, PartitionBrokerRole, PartitionHealthStatus, PublishMessageRequest,
    PublishMessageResponse, TopologyRequest, TopologyResponse,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::metadata::{KeyAndValueRef, MetadataMap};
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic::{Request, Response, Status};

/// Root certificate the fixture server certificate is signed with.
pub const CA_CERTIFICATE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ca.pem");
/// A root certificate that did NOT sign the fixture server certificate.
pub const UNTRUSTED_CA_CERTIFICATE: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/untrusted-ca.pem");

const SERVER_CERTIFICATE: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/server.pem");
const SERVER_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/server.key");

/// Metadata of one call as the gateway observed it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub headers: BTreeMap<String, String>,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Gateway implementation that answers with a fixed single-broker cluster and
/// records every call it serves.
#[derive(Clone, Default)]
struct RecordingGateway {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    published_message_ids: Arc<Mutex<HashSet<String>>>,
    next_message_key: Arc<AtomicI64>,
    response_delay: Option<Duration>,
}

impl RecordingGateway {
    fn record(&self, method: &'static str, metadata: &MetadataMap) {
        let mut headers = BTreeMap::new();
        for entry in metadata.iter() {
            if let KeyAndValueRef::Ascii(key, value) = entry {
                if let Ok(value) = value.to_str() {
                    headers.insert(key.as_str().to_string(), value.to_string());
                }
            }
        }
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall { method, headers });
    }

    async fn delay(&self) {
        if let Some(delay) = self.response_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[tonic::async_trait]
impl Gateway for RecordingGateway {
    async fn topology(
        &self,
        request: Request<TopologyRequest>,
    ) -> Result<Response<TopologyResponse>, Status> {
        self.record("Topology", request.metadata());
        self.delay().await;
        Ok(Response::new(TopologyResponse {
            brokers: vec![BrokerInfo {
                node_id: 0,
                host: "localhost".to_string(),
                port: 26501,
                partitions: vec![Partition {
                    partition_id: 1,
                    role: PartitionBrokerRole::Leader as i32,
                    health: PartitionHealthStatus::Healthy as i32,
                }],
            }],
            cluster_size: 1,
            partitions_count: 1,
            replication_factor: 1,
            gateway_version: env!("CARGO_PKG_VERSION").to_string(),
        }))
    }

    async fn publish_message(
        &self,
        request: Request<PublishMessageRequest>,
    ) -> Result<Response<PublishMessageResponse>, Status> {
        self.record("PublishMessage", request.metadata());
        self.delay().await;
        let request = request.into_inner();
        if request.name.is_empty() {
            return Err(Status::invalid_argument("message name must not be empty"));
        }
        // A buffered message id may only be published once, like the real
        // gateway enforces
        if !request.message_id.is_empty() {
            let mut seen = self.published_message_ids.lock().unwrap();
            if !seen.insert(request.message_id.clone()) {
                return Err(Status::already_exists(format!(
                    "a message with id '{}' is already published",
                    request.message_id
                )));
            }
        }
        Ok(Response::new(PublishMessageResponse {
            key: self.next_message_key.fetch_add(1, Ordering::SeqCst) + 1,
        }))
    }
}

/// Test harness owning the in-process gateway.
pub struct GatewayHarness {
    address: String,
    gateway: RecordingGateway,
    server: JoinHandle<()>,
}

impl GatewayHarness {
    /// Serve the gateway over plaintext on an ephemeral port.
    pub async fn plaintext() -> Self {
        Self::start(false, None).await
    }

    /// Serve the gateway behind TLS using the fixture server certificate.
    pub async fn tls() -> Self {
        Self::start(true, None).await
    }

    /// Serve over plaintext, delaying every response.
    pub async fn plaintext_with_delay(delay: Duration) -> Self {
        Self::start(false, Some(delay)).await
    }

    async fn start(tls: bool, response_delay: Option<Duration>) -> Self {
        let gateway = RecordingGateway {
            response_delay,
            ..Default::default()
        };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        // The fixture certificate is issued for `localhost`
        let address = format!("localhost:{}", listener.local_addr().unwrap().port());
        let incoming = TcpListenerStream::new(listener);

        let mut builder = Server::builder();
        if tls {
            let certificate =
                std::fs::read(SERVER_CERTIFICATE).expect("read fixture server certificate");
            let key = std::fs::read(SERVER_KEY).expect("read fixture server key");
            builder = builder
                .tls_config(ServerTlsConfig::new().identity(Identity::from_pem(certificate, key)))
                .expect("configure server TLS");
        }
        let router = builder.add_service(GatewayServer::new(gateway.clone()));
        let server = tokio::spawn(async move {
            let _ = router.serve_with_incoming(incoming).await;
        });

        Self {
            address,
            gateway,
            server,
        }
    }

    /// Address the gateway listens on, as `host:port`.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Calls observed so far, in arrival order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.gateway.calls.lock().unwrap().clone()
    }
}

impl Drop for GatewayHarness {
    fn drop(&mut self) {
        self.server.abort();
    }
}
