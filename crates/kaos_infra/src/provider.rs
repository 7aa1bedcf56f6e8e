//! Provider definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InfraError;

/// Supported deployment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local container runtime
    Docker,
    /// Local single-node cluster
    Minikube,
    Aws,
    Gcp,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Docker => "docker",
            Provider::Minikube => "minikube",
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Provider::Docker, Provider::Minikube, Provider::Aws, Provider::Gcp]
    }

    /// Cloud-hosted providers get an isolated working copy and Terraform
    /// workspace per environment; local ones run straight from their template.
    pub fn is_cloud(&self) -> bool {
        match self {
            Provider::Docker | Provider::Minikube => false,
            Provider::Aws | Provider::Gcp => true,
        }
    }

    /// Template directory, relative to the infrastructure root.
    pub fn template_dir(&self) -> &'static str {
        self.as_str()
    }

    /// Local-backend override file, relative to the template directory.
    pub fn local_backend_file(&self) -> Option<&'static str> {
        if self.is_cloud() {
            Some("local_backend.tf")
        } else {
            None
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "docker" => Ok(Provider::Docker),
            "minikube" => Ok(Provider::Minikube),
            "aws" => Ok(Provider::Aws),
            "gcp" => Ok(Provider::Gcp),
            other => Err(InfraError::configuration(format!(
                "unknown provider '{}' (expected one of: docker, minikube, aws, gcp)",
                other
            ))),
        }
    }
}
