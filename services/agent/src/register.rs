//! Self-registration with the control plane.

use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::StatusCode;
use tracing::{info, warn};

const ATTEMPTS: u32 = 5;
const BACKOFF: Duration = Duration::from_millis(500);

/// Announce the port this agent bound to the control plane.
///
/// The control plane may still be binding its own listener when a spawned
/// agent comes up, so registration retries with backoff before giving up.
pub async fn announce_port(control_host: &str, control_port: u16, agent_port: u16) -> Result<()> {
    let url = format!("http://{control_host}:{control_port}/agentPort");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    for attempt in 1..=ATTEMPTS {
        match client.post(&url).json(&agent_port.to_string()).send().await {
            Ok(resp) if resp.status() == StatusCode::CREATED => {
                info!(agent_port, %url, "registered with control plane");
                return Ok(());
            }
            Ok(resp) => {
                warn!(status = %resp.status(), attempt, "registration rejected");
            }
            Err(e) => {
                warn!(error = %e, attempt, "registration attempt failed");
            }
        }
        tokio::time::sleep(BACKOFF * attempt).await;
    }

    bail!("could not register with control plane at {url}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn announces_port_as_json_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agentPort"))
            .and(body_json(serde_json::json!("4567")))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        announce_port("127.0.0.1", server.address().port(), 4567)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn retries_until_the_control_plane_accepts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agentPort"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/agentPort"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        announce_port("127.0.0.1", server.address().port(), 4567)
            .await
            .unwrap();
    }
}
