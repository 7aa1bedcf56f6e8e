//! Backend endpoint extraction from the Terraform output artifact.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{InfraError, InfraResult};

#[derive(Debug, Deserialize)]
struct OutputArtifact {
    backend_domain: Vec<DomainValue>,
    backend_port: PortValue,
    backend_path: String,
    kubeconfig: Value,
}

#[derive(Debug, Default, Deserialize)]
struct DomainValue {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Float(f64),
    Text(String),
}

impl PortValue {
    fn to_port(&self) -> InfraResult<u16> {
        let port = match self {
            PortValue::Number(n) => u16::try_from(*n).ok(),
            PortValue::Float(f) if f.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(f) => {
                Some(*f as u16)
            }
            PortValue::Float(_) => None,
            PortValue::Text(s) => s.trim().parse::<u16>().ok(),
        };
        port.ok_or_else(|| InfraError::InvalidOutput(format!("backend_port is not a valid port: {:?}", self)))
    }
}

/// Where the provisioned backend is reachable.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEndpoint {
    /// Hostname, or IP when no hostname was published
    pub domain: String,
    pub port: u16,
    pub path: String,
    /// Cluster access credential, exactly as published
    pub kubeconfig: Value,
}

impl ResolvedEndpoint {
    /// `http://{domain}:{port}{path}`
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.domain, self.port, self.path)
    }

    /// Kubeconfig in its persisted form: strings verbatim, anything else as JSON.
    pub fn kubeconfig_string(&self) -> String {
        match &self.kubeconfig {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Read and resolve the output artifact at `path`.
pub fn resolve_endpoint(path: &Path) -> InfraResult<ResolvedEndpoint> {
    let raw = fs::read_to_string(path).map_err(|e| {
        InfraError::InvalidOutput(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_endpoint(&raw)
}

/// Resolve an output artifact from its JSON text.
pub fn parse_endpoint(raw: &str) -> InfraResult<ResolvedEndpoint> {
    let artifact: OutputArtifact =
        serde_json::from_str(raw).map_err(|e| InfraError::InvalidOutput(e.to_string()))?;

    let first = artifact
        .backend_domain
        .first()
        .ok_or_else(|| InfraError::Hostname("Hostname not present".to_string()))?;

    let domain = [&first.hostname, &first.ip]
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| InfraError::Hostname("Hostname not present".to_string()))?;

    let endpoint = ResolvedEndpoint {
        domain,
        port: artifact.backend_port.to_port()?,
        path: artifact.backend_path,
        kubeconfig: artifact.kubeconfig,
    };

    debug!("Resolved backend endpoint {}", endpoint.url());
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifact(domain: Value, port: Value) -> String {
        json!({
            "backend_domain": domain,
            "backend_port": port,
            "backend_path": "/api",
            "kubeconfig": "apiVersion: v1",
        })
        .to_string()
    }

    #[test]
    fn test_hostname_preferred_over_ip() {
        let raw = artifact(json!([{ "hostname": "h", "ip": "1.2.3.4" }]), json!(8080));
        let endpoint = parse_endpoint(&raw).unwrap();

        assert_eq!(endpoint.url(), "http://h:8080/api");
        assert_eq!(endpoint.kubeconfig, json!("apiVersion: v1"));
    }

    #[test]
    fn test_ip_fallback() {
        let raw = artifact(json!([{ "ip": "10.0.0.7" }]), json!("80"));
        assert_eq!(parse_endpoint(&raw).unwrap().url(), "http://10.0.0.7:80/api");
    }

    #[test]
    fn test_empty_hostname_falls_back_to_ip() {
        let raw = artifact(json!([{ "hostname": "", "ip": "10.0.0.7" }]), json!(80));
        assert_eq!(parse_endpoint(&raw).unwrap().domain, "10.0.0.7");
    }

    #[test]
    fn test_only_first_domain_entry_is_used() {
        let raw = artifact(json!([{}, { "hostname": "second" }]), json!(80));
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::Hostname(_))));
    }

    #[test]
    fn test_no_domain_is_hostname_error() {
        let raw = artifact(json!([{}]), json!(8080));
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::Hostname(_))));

        let raw = artifact(json!([]), json!(8080));
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::Hostname(_))));
    }

    #[test]
    fn test_port_string_is_coerced() {
        let raw = artifact(json!([{ "hostname": "h" }]), json!(" 8443 "));
        assert_eq!(parse_endpoint(&raw).unwrap().port, 8443);
    }

    #[test]
    fn test_whole_float_port_is_coerced() {
        let raw = artifact(json!([{ "hostname": "h" }]), json!(8080.0));
        assert_eq!(parse_endpoint(&raw).unwrap().url(), "http://h:8080/api");

        let raw = artifact(json!([{ "hostname": "h" }]), json!(8080.5));
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::InvalidOutput(_))));

        let raw = artifact(json!([{ "hostname": "h" }]), json!(-80));
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::InvalidOutput(_))));
    }

    #[test]
    fn test_invalid_port() {
        let raw = artifact(json!([{ "hostname": "h" }]), json!("http"));
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::InvalidOutput(_))));

        let raw = artifact(json!([{ "hostname": "h" }]), json!(70000));
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::InvalidOutput(_))));
    }

    #[test]
    fn test_missing_keys() {
        let raw = json!({ "backend_domain": [{ "hostname": "h" }] }).to_string();
        assert!(matches!(parse_endpoint(&raw), Err(InfraError::InvalidOutput(_))));
    }

    #[test]
    fn test_object_kubeconfig_is_kept() {
        let raw = json!({
            "backend_domain": [{ "hostname": "h" }],
            "backend_port": 80,
            "backend_path": "",
            "kubeconfig": { "clusters": [] },
        })
        .to_string();

        let endpoint = parse_endpoint(&raw).unwrap();
        assert_eq!(endpoint.url(), "http://h:80");
        assert_eq!(endpoint.kubeconfig, json!({ "clusters": [] }));
        assert_eq!(endpoint.kubeconfig_string(), r#"{"clusters":[]}"#);
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_endpoint(&dir.path().join("config.json"));
        assert!(matches!(result, Err(InfraError::InvalidOutput(_))));
    }
}
