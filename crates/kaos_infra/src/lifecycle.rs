//! Provisioning lifecycle orchestration.
//!
//! `build` runs init → workspace → plan → apply, resolves the published
//! endpoint and only then records it. `destroy` runs init → workspace →
//! remote cleanup → destroy and clears every generated artifact afterwards,
//! both in the project root and in the directory Terraform ran in.
//!
//! Steps are awaited strictly one after another. Concurrent invocations
//! against the same project are not supported.

use std::path::PathBuf;
use std::sync::Arc;

use kaos_runner::IacEngine;
use kaos_state::{StateService, BACKEND, INFRASTRUCTURE};
use tracing::{info, warn};

use crate::cleanup::ResourceCleaner;
use crate::config::{ProjectLayout, ProviderCredentials};
use crate::endpoint::resolve_endpoint;
use crate::error::InfraResult;
use crate::provider::Provider;
use crate::variables::{build_variables, IacVariables};
use crate::workspace::{Purpose, WorkspaceManager};

/// Parameters of a `build`.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub provider: Provider,
    pub environment: String,
    /// Copy the provider's local-backend file into the working copy
    pub local_backend: bool,
    pub verbose: bool,
}

impl BuildRequest {
    pub fn new(provider: Provider, environment: impl Into<String>) -> Self {
        Self {
            provider,
            environment: environment.into(),
            local_backend: false,
            verbose: false,
        }
    }

    pub fn local_backend(mut self, enabled: bool) -> Self {
        self.local_backend = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }
}

/// Outcome of a successful `build`.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub url: String,
    pub token: String,
    pub directory: PathBuf,
}

/// What happened to the remote cleanup call during `destroy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// No backend recorded, nothing to notify
    Skipped,
    Completed,
    /// The call failed; teardown went ahead anyway
    Failed(String),
}

/// Outcome of a successful `destroy`.
#[derive(Debug, Clone)]
pub struct DestroyReport {
    pub directory: PathBuf,
    pub cleanup: CleanupOutcome,
    /// Artifacts that could not be removed
    pub leftovers: Vec<PathBuf>,
}

/// Provisions and tears down the infrastructure behind a backend.
pub struct Backend {
    layout: ProjectLayout,
    credentials: ProviderCredentials,
    engine: Arc<dyn IacEngine>,
    cleaner: Arc<dyn ResourceCleaner>,
    workspaces: WorkspaceManager,
    state: StateService,
}

impl Backend {
    /// Create an orchestrator, loading any existing state.
    pub fn new(
        layout: ProjectLayout,
        credentials: ProviderCredentials,
        engine: Arc<dyn IacEngine>,
        cleaner: Arc<dyn ResourceCleaner>,
    ) -> InfraResult<Self> {
        let state = StateService::load(layout.state_paths().clone())?;
        let workspaces = WorkspaceManager::new(layout.clone(), engine.clone());

        Ok(Self {
            layout,
            credentials,
            engine,
            cleaner,
            workspaces,
            state,
        })
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn url(&self) -> Option<&str> {
        self.state.get(BACKEND, "url")
    }

    pub fn user(&self) -> Option<&str> {
        self.state.get(BACKEND, "user")
    }

    pub fn token(&self) -> Option<&str> {
        self.state.get(BACKEND, "token")
    }

    pub fn kubeconfig(&self) -> Option<&str> {
        self.state.get(INFRASTRUCTURE, "kubeconfig")
    }

    pub fn is_created(&self) -> bool {
        self.state.is_created()
    }

    /// Fail with a state error unless a backend has been recorded.
    pub fn require_created(&self) -> InfraResult<()> {
        Ok(self.state.require_created()?)
    }

    /// Input variables for `provider`.
    pub fn variables(&self, provider: Provider) -> IacVariables {
        build_variables(provider, self.layout.root(), &self.credentials)
    }

    /// Attach to an already running backend.
    pub fn init(&mut self, url: &str, token: &str) -> InfraResult<()> {
        if !self.state.is_created() {
            self.state.create()?;
        }
        self.state.set(BACKEND, [("url", url), ("token", token)]);
        self.state.write()?;

        info!("Attached to backend at {}", url);
        Ok(())
    }

    /// Provision the backend infrastructure and record how to reach it.
    ///
    /// Any failure before the endpoint is resolved leaves the state untouched.
    pub async fn build(&mut self, request: &BuildRequest) -> InfraResult<BuildReport> {
        let provider = request.provider;
        let env = request.environment.as_str();
        info!("Building {} backend for environment {}", provider, env);

        let vars = self.variables(provider).to_args();

        self.engine.set_verbose(request.verbose);
        let directory = self
            .workspaces
            .prepare(provider, env, &self.credentials, request.local_backend, Purpose::Build)
            .await?;

        self.engine.plan(&directory, &vars).await?;
        self.engine.apply(&directory, &vars).await?;

        let endpoint = resolve_endpoint(&self.layout.state_paths().output_json)?;
        let url = endpoint.url();
        let token = uuid::Uuid::new_v4().to_string();

        if !self.state.is_created() {
            self.state.create()?;
        }
        self.state.set(BACKEND, [("url", url.as_str()), ("token", token.as_str())]);
        self.state.set(INFRASTRUCTURE, [("kubeconfig", endpoint.kubeconfig_string())]);
        self.state.write()?;

        info!("Backend available at {}", url);
        Ok(BuildReport {
            url,
            token,
            directory,
        })
    }

    /// Tear the backend infrastructure down and forget it.
    ///
    /// Once the working directory is ready, generated artifacts and state are
    /// removed whether or not the engine's destroy succeeds; its error is
    /// returned afterwards.
    pub async fn destroy(
        &mut self,
        provider: Provider,
        env: &str,
        verbose: bool,
    ) -> InfraResult<DestroyReport> {
        info!("Destroying {} backend for environment {}", provider, env);

        let vars = self.variables(provider).to_args();

        self.engine.set_verbose(verbose);
        let directory = self
            .workspaces
            .prepare(provider, env, &self.credentials, false, Purpose::Destroy)
            .await?;

        let cleanup = self.delete_resources().await;
        let destroyed = self.engine.destroy(&directory, &vars).await;

        let mut failures = self.state.remove_build_files();
        failures.extend(self.state.remove_engine_files(&directory));
        let leftovers = failures.into_iter().map(|(path, _)| path).collect();

        destroyed?;

        info!("Destroyed {} backend for environment {}", provider, env);
        Ok(DestroyReport {
            directory,
            cleanup,
            leftovers,
        })
    }

    async fn delete_resources(&self) -> CleanupOutcome {
        if !self.state.has_section(BACKEND) {
            return CleanupOutcome::Skipped;
        }
        let Some(url) = self.url() else {
            return CleanupOutcome::Skipped;
        };

        info!("Releasing backend resources at {}", url);
        match self.cleaner.delete_resources(url).await {
            Ok(()) => CleanupOutcome::Completed,
            Err(e) => {
                warn!("Resource cleanup failed, continuing with destroy: {}", e);
                CleanupOutcome::Failed(e.to_string())
            }
        }
    }
}
