//! Agent RPC contract and HTTP client.
//!
//! The scheduler and the health loop talk to agents exclusively through
//! [`AgentApi`], so tests can substitute a recording mock. The real client
//! speaks the agent's HTTP API: `POST /runContainer`, `POST /deleteContainer`
//! and `GET /isAgentActive`, all of which acknowledge with 201 Created.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cluster::ContainerSpec;

/// Agent RPC failures. Timeouts count as unreachable.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("agent on port {port} unreachable: {source}")]
    Unreachable { port: u16, source: reqwest::Error },

    #[error("agent on port {port} returned {status}: {detail}")]
    Rejected {
        port: u16,
        status: StatusCode,
        detail: String,
    },
}

/// The narrow contract an agent exposes to the control plane.
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// Ask the agent to create and start one replica container.
    async fn create_container(&self, port: u16, container: &ContainerSpec) -> Result<(), RpcError>;

    /// Ask the agent to tear down the container with the given derived name.
    async fn delete_container(&self, port: u16, container_name: &str) -> Result<(), RpcError>;

    /// Liveness probe.
    async fn probe(&self, port: u16) -> Result<(), RpcError>;
}

/// HTTP implementation of [`AgentApi`].
///
/// Every call carries the configured timeout. Mutating calls get a small
/// fixed retry budget with exponential backoff; probes are single-shot so a
/// slow agent is reported to the health loop instead of being papered over.
pub struct HttpAgentClient {
    client: reqwest::Client,
    host: String,
    retries: u32,
    backoff: Duration,
}

impl HttpAgentClient {
    pub fn new(host: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            host: host.into(),
            retries: 1,
            backoff: Duration::from_millis(200),
        }
    }

    fn url(&self, port: u16, path: &str) -> String {
        format!("http://{}:{}/{}", self.host, port, path)
    }

    async fn post_with_retry<T: serde::Serialize + Sync>(
        &self,
        port: u16,
        path: &str,
        body: &T,
    ) -> Result<(), RpcError> {
        let url = self.url(port, path);
        let mut attempt = 0;
        loop {
            match self.post_once(port, &url, body).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    let delay = self.backoff * 2u32.pow(attempt - 1);
                    warn!(port, %url, error = %e, attempt, "agent RPC failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once<T: serde::Serialize + Sync>(
        &self,
        port: u16,
        url: &str,
        body: &T,
    ) -> Result<(), RpcError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| RpcError::Unreachable { port, source })?;

        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(RpcError::Rejected {
            port,
            status,
            detail,
        })
    }
}

#[async_trait]
impl AgentApi for HttpAgentClient {
    async fn create_container(&self, port: u16, container: &ContainerSpec) -> Result<(), RpcError> {
        debug!(port, container = %container.derived_name(), "sending create-container RPC");
        self.post_with_retry(port, "runContainer", container).await
    }

    async fn delete_container(&self, port: u16, container_name: &str) -> Result<(), RpcError> {
        debug!(port, container = container_name, "sending delete-container RPC");
        self.post_with_retry(port, "deleteContainer", &container_name)
            .await
    }

    async fn probe(&self, port: u16) -> Result<(), RpcError> {
        let url = self.url(port, "isAgentActive");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| RpcError::Unreachable { port, source })?;

        let status = response.status();
        if status == StatusCode::CREATED {
            Ok(())
        } else {
            Err(RpcError::Rejected {
                port,
                status,
                detail: String::new(),
            })
        }
    }
}
