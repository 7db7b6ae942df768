//! HTTP client for the Control API.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::CliError;

/// Declarative workload specification, as the control plane reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    pub name: String,
    pub image: String,
    pub replica_count: i64,
}

/// One replica container.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub index: i64,
    pub configuration_name: String,
    pub image: String,
}

/// One worker agent with the containers it hosts.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentView {
    pub id: String,
    pub port: u16,
    pub active: bool,
    pub containers: BTreeMap<String, ContainerSpec>,
}

/// A workload together with its hosting agents.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentView {
    pub spec: WorkloadSpec,
    pub agents: Vec<AgentView>,
}

/// Client for the control plane.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::handle_response(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CliError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Every Control API success answers 201 Created; anything else carries
    /// a JSON string describing the failure.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CliError> {
        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<String>()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(CliError::api(status.as_u16(), message))
    }
}
