//! Container runtime abstraction.
//!
//! The HTTP handlers drive containers through [`ContainerRuntime`], so the
//! agent can run against the local Docker daemon in production and an
//! in-memory runtime in development and tests.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("docker: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("failed to copy bootstrap script into container: {0}")]
    Bootstrap(#[source] std::io::Error),

    #[error("docker cp exited with {0}")]
    BootstrapFailed(std::process::ExitStatus),

    #[error("container {0} already exists")]
    AlreadyExists(String),
}

/// Lifecycle operations the agent needs from a runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Pull the image if needed, then create and start a container under
    /// the given name.
    async fn run(&self, image: &str, name: &str) -> Result<(), RuntimeError>;

    /// Stop and remove the named container. Removing a container that does
    /// not exist is not an error.
    async fn remove(&self, name: &str) -> Result<(), RuntimeError>;
}

/// Docker runtime backed by the local daemon.
pub struct DockerRuntime {
    docker: bollard::Docker,
    bootstrap_script: Option<PathBuf>,
}

impl DockerRuntime {
    pub fn new(bootstrap_script: Option<PathBuf>) -> Result<Self, RuntimeError> {
        let docker = bollard::Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            bootstrap_script,
        })
    }

    /// `docker cp` is the one operation bollard has no API for, so the
    /// bootstrap script goes in through the CLI.
    async fn copy_bootstrap(&self, container_id: &str, script: &PathBuf) -> Result<(), RuntimeError> {
        let status = tokio::process::Command::new("docker")
            .arg("cp")
            .arg(script)
            .arg(format!("{container_id}:/init.sh"))
            .status()
            .await
            .map_err(RuntimeError::Bootstrap)?;
        if !status.success() {
            return Err(RuntimeError::BootstrapFailed(status));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn run(&self, image: &str, name: &str) -> Result<(), RuntimeError> {
        use bollard::container::{Config, CreateContainerOptions};
        use bollard::image::CreateImageOptions;
        use futures_util::StreamExt;

        // Bare image names resolve against the default library namespace.
        let mut pull = self.docker.create_image(
            Some(CreateImageOptions {
                from_image: format!("docker.io/library/{image}"),
                ..Default::default()
            }),
            None,
            None,
        );
        while let Some(progress) = pull.next().await {
            let progress = progress?;
            debug!(image, status = ?progress.status, "pulling image");
        }

        let cmd = self
            .bootstrap_script
            .as_ref()
            .map(|_| vec!["/bin/sh".to_string(), "/init.sh".to_string()]);

        let created = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.to_string(),
                    platform: None,
                }),
                Config {
                    image: Some(image.to_string()),
                    cmd,
                    tty: Some(false),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(script) = &self.bootstrap_script {
            self.copy_bootstrap(&created.id, script).await?;
        }

        self.docker
            .start_container::<String>(&created.id, None)
            .await?;

        info!(container = name, id = %created.id, "container started");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        use bollard::container::{ListContainersOptions, RemoveContainerOptions, StopContainerOptions};
        use std::collections::HashMap;

        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![format!("^{name}$")]);

        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters,
                ..Default::default()
            }))
            .await?;

        for container in containers {
            let Some(id) = container.id else { continue };
            self.docker
                .stop_container(&id, Some(StopContainerOptions { t: 0 }))
                .await?;
            self.docker
                .remove_container(
                    &id,
                    Some(RemoveContainerOptions {
                        force: true,
                        ..Default::default()
                    }),
                )
                .await?;
            info!(container = name, %id, "container removed");
        }

        Ok(())
    }
}

/// In-memory runtime that only tracks container names.
#[derive(Default)]
pub struct MockRuntime {
    containers: Mutex<BTreeSet<String>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.containers.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn run(&self, image: &str, name: &str) -> Result<(), RuntimeError> {
        let mut containers = self.containers.lock().unwrap();
        if !containers.insert(name.to_string()) {
            return Err(RuntimeError::AlreadyExists(name.to_string()));
        }
        info!(container = name, image, "mock container started");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        self.containers.lock().unwrap().remove(name);
        info!(container = name, "mock container removed");
        Ok(())
    }
}
