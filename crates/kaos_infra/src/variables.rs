//! Terraform input variables derived from provider and credentials.

use std::fmt;
use std::path::Path;

use crate::config::ProviderCredentials;
use crate::provider::Provider;

/// Ordered set of `--var key=value` inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IacVariables {
    vars: Vec<(String, String)>,
}

impl IacVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Command line arguments, one `--var` flag per variable.
    pub fn to_args(&self) -> Vec<String> {
        self.vars
            .iter()
            .flat_map(|(k, v)| ["--var".to_string(), format!("{}={}", k, v)])
            .collect()
    }
}

impl fmt::Display for IacVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .vars
            .iter()
            .map(|(k, v)| format!("--var {}={}", k, v))
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// Build the input variables for `provider`.
///
/// `config_dir` is always set. Missing credentials become empty values;
/// [`ProviderCredentials::check`] is what rejects them.
pub fn build_variables(
    provider: Provider,
    config_dir: &Path,
    credentials: &ProviderCredentials,
) -> IacVariables {
    let mut vars = IacVariables::new();
    vars.push("config_dir", config_dir.display().to_string());

    let value = |v: &Option<String>| v.clone().unwrap_or_default();

    match provider {
        Provider::Aws => {
            vars.push("aws_access_key_id", value(&credentials.access_key_id));
            vars.push("aws_secret_access_key", value(&credentials.secret_access_key));
            vars.push("region", value(&credentials.region));
        }
        Provider::Gcp => {
            vars.push("credentials_path", value(&credentials.credentials_path));
        }
        Provider::Docker | Provider::Minikube => {}
    }

    vars
}
