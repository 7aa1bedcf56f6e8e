//! Terraform working directory preparation.
//!
//! Cloud providers run from a per-environment working copy of their
//! environment template (`<provider>/__working_<env>`) with a matching
//! Terraform workspace. Local providers run straight from their template
//! directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs_extra::dir::CopyOptions;
use kaos_runner::IacEngine;
use tracing::{debug, info};

use crate::config::{validate_environment, ProjectLayout, ProviderCredentials};
use crate::error::{InfraError, InfraResult};
use crate::provider::Provider;

/// What `prepare` is preparing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Build,
    Destroy,
}

/// Owns creation and placement of working directories.
pub struct WorkspaceManager {
    layout: ProjectLayout,
    engine: Arc<dyn IacEngine>,
}

impl WorkspaceManager {
    pub fn new(layout: ProjectLayout, engine: Arc<dyn IacEngine>) -> Self {
        Self { layout, engine }
    }

    /// Directory all Terraform commands for `(provider, env)` run in.
    pub fn directory(&self, provider: Provider, env: &str) -> PathBuf {
        if provider.is_cloud() {
            self.layout.working_dir(provider, env)
        } else {
            self.layout.provider_dir(provider)
        }
    }

    /// Whether the working directory for `(provider, env)` is materialized.
    pub fn workspace_exists(&self, provider: Provider, env: &str) -> bool {
        self.directory(provider, env).is_dir()
    }

    /// Whether `prepare` copies the template for this purpose.
    ///
    /// Builds always refresh the working copy; destroys only create it when
    /// missing so an interrupted destroy keeps its state.
    pub fn needs_materialize(&self, provider: Provider, env: &str, purpose: Purpose) -> bool {
        provider.is_cloud()
            && (purpose == Purpose::Build || !self.workspace_exists(provider, env))
    }

    /// Copy the environment template into the working directory.
    pub fn materialize(&self, provider: Provider, env: &str) -> InfraResult<PathBuf> {
        let template = self.layout.environment_template_dir(provider, env);
        if !template.is_dir() {
            return Err(InfraError::configuration(format!(
                "no {} template for environment '{}' at {}",
                provider,
                env,
                template.display()
            )));
        }

        let target = self.layout.working_dir(provider, env);
        fs::create_dir_all(&target)?;

        let mut options = CopyOptions::new();
        options.overwrite = true;
        options.content_only = true;
        fs_extra::dir::copy(&template, &target, &options)
            .map_err(|e| InfraError::Copy(format!("{} -> {}: {}", template.display(), target.display(), e)))?;

        info!("Materialized {:?} from {:?}", target, template);
        Ok(target)
    }

    /// Copy the provider's local-backend file into `dir`, replacing any existing one.
    pub fn install_local_backend(&self, provider: Provider, dir: &Path) -> InfraResult<()> {
        let source = self.layout.local_backend_file(provider).ok_or_else(|| {
            InfraError::configuration(format!("{} has no local backend configuration", provider))
        })?;
        if !source.is_file() {
            return Err(InfraError::configuration(format!(
                "local backend file not found: {}",
                source.display()
            )));
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| InfraError::configuration("local backend path has no file name"))?;
        fs::copy(&source, dir.join(file_name))?;
        debug!("Installed local backend {:?} into {:?}", source, dir);
        Ok(())
    }

    /// Get a ready-to-use, initialized working directory.
    pub async fn prepare(
        &self,
        provider: Provider,
        env: &str,
        credentials: &ProviderCredentials,
        local_backend: bool,
        purpose: Purpose,
    ) -> InfraResult<PathBuf> {
        validate_environment(env)?;

        let provider_dir = self.layout.provider_dir(provider);
        if !provider_dir.is_dir() {
            return Err(InfraError::configuration(format!(
                "no templates for {} at {}",
                provider,
                provider_dir.display()
            )));
        }
        credentials.check(provider)?;

        if !provider.is_cloud() {
            if local_backend {
                debug!("{} keeps its state locally, ignoring local backend override", provider);
            }
            self.engine.init(&provider_dir).await?;
            return Ok(provider_dir);
        }

        let dir = self.directory(provider, env);
        if self.needs_materialize(provider, env, purpose) {
            self.materialize(provider, env)?;
        } else {
            debug!("Reusing existing working directory {:?}", dir);
        }

        if local_backend {
            self.install_local_backend(provider, &dir)?;
        }

        self.engine.init(&dir).await?;
        if !self.engine.workspace_exists(&dir, env).await? {
            self.engine.new_workspace(&dir, env).await?;
        }
        self.engine.select_workspace(&dir, env).await?;

        Ok(dir)
    }
}
