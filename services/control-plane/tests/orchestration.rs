//! Control API integration tests.
//!
//! Drives the full HTTP surface against an in-process server with wiremock
//! standing in for the worker agents, covering placement, scaling, image
//! replacement, teardown, and agent registration.

use std::sync::Arc;
use std::time::Duration;

use pallet_control_plane::{
    api,
    rpc::HttpAgentClient,
    snapshot::SnapshotWriter,
    state::AppState,
};
use serde_json::Value;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test harness: an in-process control plane plus wiremock agents.
struct Harness {
    base_url: String,
    client: reqwest::Client,
    agents: Vec<MockServer>,
    snapshot_dir: tempfile::TempDir,
}

impl Harness {
    /// Boot the control plane and register `agent_count` mock agents.
    async fn new(agent_count: usize) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info,pallet_control_plane=debug".into()),
            )
            .with_test_writer()
            .try_init();

        let snapshot_dir = tempfile::tempdir().expect("failed to create snapshot dir");
        let rpc = Arc::new(HttpAgentClient::new("127.0.0.1", Duration::from_secs(2)));
        let state = AppState::new(rpc, SnapshotWriter::new(snapshot_dir.path().to_path_buf()));

        let app = api::create_router(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("no local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server failed");
        });

        let harness = Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            agents: Vec::new(),
            snapshot_dir,
        };
        harness.with_agents(agent_count).await
    }

    async fn with_agents(mut self, count: usize) -> Self {
        for _ in 0..count {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/runContainer"))
                .respond_with(ResponseTemplate::new(201))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/deleteContainer"))
                .respond_with(ResponseTemplate::new(201))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/isAgentActive"))
                .respond_with(ResponseTemplate::new(201))
                .mount(&server)
                .await;

            let port = server.address().port();
            let resp = self
                .client
                .post(format!("{}/agentPort", self.base_url))
                .json(&port.to_string())
                .send()
                .await
                .expect("agentPort request failed");
            assert_eq!(resp.status(), 201);
            self.agents.push(server);
        }
        self
    }

    fn agent_port(&self, idx: usize) -> u16 {
        self.agents[idx].address().port()
    }

    async fn create(&self, name: &str, image: &str, replicas: i64) -> reqwest::Response {
        self.client
            .post(format!("{}/create", self.base_url))
            .json(&serde_json::json!({
                "name": name,
                "image": image,
                "replicaCount": replicas,
            }))
            .send()
            .await
            .expect("create request failed")
    }

    async fn update(&self, name: &str, image: &str, replicas: i64) -> reqwest::Response {
        self.client
            .post(format!("{}/update", self.base_url))
            .json(&serde_json::json!({
                "name": name,
                "image": image,
                "replicaCount": replicas,
            }))
            .send()
            .await
            .expect("update request failed")
    }

    async fn delete(&self, name: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/delete", self.base_url))
            .json(&name)
            .send()
            .await
            .expect("delete request failed")
    }

    async fn env_status(&self) -> Value {
        let resp = self
            .client
            .get(format!("{}/envStatus", self.base_url))
            .send()
            .await
            .expect("envStatus request failed");
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("envStatus body")
    }

    async fn env_name_status(&self, name: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/envNameStatus", self.base_url))
            .json(&name)
            .send()
            .await
            .expect("envNameStatus request failed")
    }

    async fn agents_status(&self) -> Value {
        let resp = self
            .client
            .get(format!("{}/agentsStatus", self.base_url))
            .send()
            .await
            .expect("agentsStatus request failed");
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("agentsStatus body")
    }

    /// Derived container names hosted on the agent listening on `port`.
    async fn containers_on(&self, port: u16) -> Vec<String> {
        let agents = self.agents_status().await;
        for agent in agents.as_array().expect("agents array") {
            if agent["port"] == port {
                let mut names: Vec<String> = agent["containers"]
                    .as_object()
                    .expect("containers map")
                    .keys()
                    .cloned()
                    .collect();
                names.sort();
                return names;
            }
        }
        panic!("no agent registered on port {port}");
    }
}

#[tokio::test]
async fn round_robin_placement_over_two_agents() {
    let h = Harness::new(2).await;

    let resp = h.create("web", "nginx", 3).await;
    assert_eq!(resp.status(), 201);
    let body: String = resp.json().await.unwrap();
    assert_eq!(body, "Containers created");

    // Both agents start empty, so the tie keeps registration order: the
    // first agent gets replicas 1 and 3, the second gets replica 2.
    assert_eq!(
        h.containers_on(h.agent_port(0)).await,
        vec!["web1".to_string(), "web3".to_string()]
    );
    assert_eq!(
        h.containers_on(h.agent_port(1)).await,
        vec!["web2".to_string()]
    );

    let specs = h.env_status().await;
    assert_eq!(specs.as_array().unwrap().len(), 1);
    assert_eq!(specs[0]["name"], "web");
    assert_eq!(specs[0]["replicaCount"], 3);

    let resp = h.env_name_status("web").await;
    assert_eq!(resp.status(), 201);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["spec"]["image"], "nginx");
    assert_eq!(view["agents"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn scale_up_prefers_least_loaded_agent() {
    let h = Harness::new(2).await;
    assert_eq!(h.create("web", "nginx", 3).await.status(), 201);

    let resp = h.update("web", "nginx", 5).await;
    assert_eq!(resp.status(), 201);
    let body: String = resp.json().await.unwrap();
    assert_eq!(body, "Update complete");

    // The second agent held one container to the first agent's two, so the
    // new batch starts there: web4 on the second, web5 on the first.
    assert_eq!(
        h.containers_on(h.agent_port(0)).await,
        vec!["web1".to_string(), "web3".to_string(), "web5".to_string()]
    );
    assert_eq!(
        h.containers_on(h.agent_port(1)).await,
        vec!["web2".to_string(), "web4".to_string()]
    );
}

#[tokio::test]
async fn scale_down_removes_highest_indices() {
    let h = Harness::new(2).await;
    assert_eq!(h.create("web", "nginx", 5).await.status(), 201);

    let resp = h.update("web", "nginx", 2).await;
    assert_eq!(resp.status(), 201);

    assert_eq!(
        h.containers_on(h.agent_port(0)).await,
        vec!["web1".to_string()]
    );
    assert_eq!(
        h.containers_on(h.agent_port(1)).await,
        vec!["web2".to_string()]
    );

    let specs = h.env_status().await;
    assert_eq!(specs[0]["replicaCount"], 2);
}

#[tokio::test]
async fn image_change_replaces_every_replica() {
    let h = Harness::new(2).await;
    assert_eq!(h.create("web", "nginx", 3).await.status(), 201);

    let resp = h.update("web", "httpd", 3).await;
    assert_eq!(resp.status(), 201);

    let agents = h.agents_status().await;
    let mut total = 0;
    for agent in agents.as_array().unwrap() {
        for (_, container) in agent["containers"].as_object().unwrap() {
            assert_eq!(container["image"], "httpd");
            total += 1;
        }
    }
    assert_eq!(total, 3);
}

#[tokio::test]
async fn same_spec_update_is_a_noop() {
    let h = Harness::new(1).await;
    assert_eq!(h.create("web", "nginx", 2).await.status(), 201);

    let resp = h.update("web", "nginx", 2).await;
    assert_eq!(resp.status(), 201);

    assert_eq!(
        h.containers_on(h.agent_port(0)).await,
        vec!["web1".to_string(), "web2".to_string()]
    );
}

#[tokio::test]
async fn delete_tears_down_the_workload() {
    let h = Harness::new(2).await;
    assert_eq!(h.create("web", "nginx", 3).await.status(), 201);

    let resp = h.delete("web").await;
    assert_eq!(resp.status(), 201);
    let body: String = resp.json().await.unwrap();
    assert_eq!(body, "configuration web deleted");

    assert!(h.env_status().await.as_array().unwrap().is_empty());
    assert!(h.containers_on(h.agent_port(0)).await.is_empty());
    assert!(h.containers_on(h.agent_port(1)).await.is_empty());
}

#[tokio::test]
async fn duplicate_create_is_a_conflict() {
    let h = Harness::new(1).await;
    assert_eq!(h.create("web", "nginx", 1).await.status(), 201);

    let resp = h.create("web", "nginx", 1).await;
    assert_eq!(resp.status(), 409);
    let body: String = resp.json().await.unwrap();
    assert!(body.contains("already exists"), "unexpected body: {body}");
}

#[tokio::test]
async fn create_with_no_agents_is_rejected() {
    let h = Harness::new(0).await;

    let resp = h.create("web", "nginx", 1).await;
    assert_eq!(resp.status(), 400);
    let body: String = resp.json().await.unwrap();
    assert!(body.contains("no agents available"), "unexpected body: {body}");

    // The rejected workload leaves no registry entry behind.
    assert!(h.env_status().await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_workload_status_is_not_found() {
    let h = Harness::new(1).await;

    let resp = h.env_name_status("ghost").await;
    assert_eq!(resp.status(), 404);
    let body: String = resp.json().await.unwrap();
    assert!(body.contains("no such configuration: ghost"));
}

#[tokio::test]
async fn update_of_unknown_workload_is_not_found() {
    let h = Harness::new(1).await;
    assert_eq!(h.update("ghost", "nginx", 2).await.status(), 404);
}

#[tokio::test]
async fn invalid_agent_port_is_rejected() {
    let h = Harness::new(0).await;

    let resp = h
        .client
        .post(format!("{}/agentPort", h.base_url))
        .json(&"not-a-port")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn re_registration_on_the_same_port_adds_no_record() {
    let h = Harness::new(1).await;
    let port = h.agent_port(0);

    let resp = h
        .client
        .post(format!("{}/agentPort", h.base_url))
        .json(&port.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    assert_eq!(h.agents_status().await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn snapshots_are_written_after_mutations() {
    let h = Harness::new(1).await;
    assert_eq!(h.create("web", "nginx", 1).await.status(), 201);

    let workloads = h.snapshot_dir.path().join("workloads.json");
    let agents = h.snapshot_dir.path().join("agents.json");
    let parsed: Value =
        serde_json::from_slice(&std::fs::read(&workloads).expect("workloads.json missing"))
            .expect("workloads.json is not JSON");
    assert_eq!(parsed[0]["spec"]["name"], "web");
    assert!(agents.exists(), "agents.json missing");
}
