//! Workload manifest loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// A workload manifest as written by operators.
///
/// ```yaml
/// name: web
/// image: nginx
/// replicas: 3
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub image: String,
    pub replicas: i64,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let manifest: Manifest = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid manifest {}", path.display()))?;
        Ok(manifest)
    }

    /// Request body for `/create` and `/update`.
    pub fn to_request(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "image": self.image,
            "replicaCount": self.replicas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_yaml_manifest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name: web\nimage: nginx\nreplicas: 3").unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.name, "web");
        assert_eq!(manifest.replicas, 3);
        assert_eq!(manifest.to_request()["replicaCount"], 3);
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name: web").unwrap();

        let err = Manifest::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid manifest"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Manifest::load(Path::new("/nonexistent/manifest.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read manifest"));
    }
}
