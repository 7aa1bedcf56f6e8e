//! Credentials, project layout and the optional `kaos.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use kaos_state::StatePaths;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InfraError, InfraResult};
use crate::provider::Provider;

/// Project config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "kaos.toml";

/// Default infrastructure template root, relative to the project root.
pub const DEFAULT_INFRASTRUCTURE_DIR: &str = "infrastructure";

/// Cloud credentials passed explicitly to the lifecycle.
///
/// The CLI fills these from the usual provider environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// `AWS_ACCESS_KEY_ID`
    pub access_key_id: Option<String>,
    /// `AWS_SECRET_ACCESS_KEY`
    pub secret_access_key: Option<String>,
    /// `AWS_DEFAULT_REGION`
    pub region: Option<String>,
    /// `GOOGLE_APPLICATION_CREDENTIALS`
    pub credentials_path: Option<String>,
}

impl ProviderCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aws(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<String>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Verify that everything `provider` needs is present.
    pub fn check(&self, provider: Provider) -> InfraResult<()> {
        let required: Vec<(&str, &Option<String>)> = match provider {
            Provider::Docker | Provider::Minikube => Vec::new(),
            Provider::Aws => vec![
                ("AWS_ACCESS_KEY_ID", &self.access_key_id),
                ("AWS_SECRET_ACCESS_KEY", &self.secret_access_key),
                ("AWS_DEFAULT_REGION", &self.region),
            ],
            Provider::Gcp => vec![("GOOGLE_APPLICATION_CREDENTIALS", &self.credentials_path)],
        };

        let missing: Vec<&str> = required
            .into_iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(InfraError::configuration(format!(
                "missing environment variables for {}: {}",
                provider,
                missing.join(", ")
            )))
        }
    }
}

/// Environment names become directory and workspace names.
pub fn validate_environment(env: &str) -> InfraResult<()> {
    if env.is_empty() {
        return Err(InfraError::configuration("environment name must not be empty"));
    }
    if !env
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(InfraError::configuration(format!(
            "invalid environment name '{}' (use letters, digits, '-' or '_')",
            env
        )));
    }
    Ok(())
}

/// `[terraform]` table of `kaos.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformSettings {
    /// Executable to run instead of `terraform`
    pub binary: Option<String>,
}

/// `[paths]` table of `kaos.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Infrastructure template root
    pub infrastructure: Option<PathBuf>,
    /// Directory holding the state file
    pub state_dir: Option<PathBuf>,
}

/// Project configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KaosConfig {
    pub terraform: TerraformSettings,
    pub paths: PathSettings,
}

impl KaosConfig {
    /// Load `kaos.toml` from `root`; a missing file yields defaults.
    pub fn load(root: &Path) -> InfraResult<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            debug!("No {} in {:?}, using defaults", CONFIG_FILE, root);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        debug!("Loaded {:?}", path);
        Ok(config)
    }
}

/// Resolves every fixed project-relative path.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    infrastructure: PathBuf,
    state: StatePaths,
}

impl ProjectLayout {
    /// Default layout under `root` (made absolute).
    pub fn new(root: impl AsRef<Path>) -> InfraResult<Self> {
        let root = absolute(root.as_ref())?;
        Ok(Self {
            infrastructure: root.join(DEFAULT_INFRASTRUCTURE_DIR),
            state: StatePaths::under(&root),
            root,
        })
    }

    /// Layout under `root` with overrides from `kaos.toml`.
    pub fn from_config(root: impl AsRef<Path>, config: &KaosConfig) -> InfraResult<Self> {
        let mut layout = Self::new(root)?;
        if let Some(dir) = &config.paths.infrastructure {
            layout.infrastructure = layout.root.join(dir);
        }
        if let Some(dir) = &config.paths.state_dir {
            layout.state = layout.state.with_state_dir(layout.root.join(dir));
        }
        Ok(layout)
    }

    /// Project root; passed to the templates as `config_dir`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn infrastructure_dir(&self) -> &Path {
        &self.infrastructure
    }

    pub fn state_paths(&self) -> &StatePaths {
        &self.state
    }

    /// Template directory of a provider.
    pub fn provider_dir(&self, provider: Provider) -> PathBuf {
        self.infrastructure.join(provider.template_dir())
    }

    /// Environment-specific template of a cloud provider.
    pub fn environment_template_dir(&self, provider: Provider, env: &str) -> PathBuf {
        self.provider_dir(provider).join(env)
    }

    /// Working copy materialized from the environment template.
    pub fn working_dir(&self, provider: Provider, env: &str) -> PathBuf {
        self.provider_dir(provider).join(format!("__working_{}", env))
    }

    /// Local-backend override file, if the provider has one.
    pub fn local_backend_file(&self, provider: Provider) -> Option<PathBuf> {
        provider
            .local_backend_file()
            .map(|file| self.provider_dir(provider).join(file))
    }
}

fn absolute(path: &Path) -> InfraResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
