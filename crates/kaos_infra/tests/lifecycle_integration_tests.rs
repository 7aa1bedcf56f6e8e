//! Integration tests for the provisioning lifecycle.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use kaos_infra::{
    Backend, BuildRequest, CleanupOutcome, InfraError, InfraResult, ProjectLayout, Provider,
    ProviderCredentials, ResourceCleaner,
};
use kaos_runner::{MockEngine, TerraformCli, TerraformOptions};
use parking_lot::Mutex;
use tempfile::tempdir;

const OUTPUT: &str = r#"{
    "backend_domain": [{"hostname": "kaos.example.com", "ip": "34.1.2.3"}],
    "backend_port": 80,
    "backend_path": "/api",
    "kubeconfig": "apiVersion: v1\nclusters: []\n"
}"#;

#[derive(Default)]
struct RecordingCleaner {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ResourceCleaner for RecordingCleaner {
    async fn delete_resources(&self, backend_url: &str) -> InfraResult<()> {
        self.calls.lock().push(backend_url.to_string());
        Ok(())
    }
}

fn aws_credentials() -> ProviderCredentials {
    ProviderCredentials::new().with_aws("AKIA123", "s3cr3t", "eu-west-1")
}

/// Lay out an AWS template with a `dev` environment.
fn write_templates(root: &Path) -> ProjectLayout {
    let layout = ProjectLayout::new(root).unwrap();
    let env_dir = layout.environment_template_dir(Provider::Aws, "dev");
    fs::create_dir_all(&env_dir).unwrap();
    fs::write(env_dir.join("main.tf"), "# aws dev").unwrap();
    fs::write(
        layout.provider_dir(Provider::Aws).join("local_backend.tf"),
        "terraform {\n  backend \"local\" {}\n}\n",
    )
    .unwrap();
    layout
}

fn new_backend(
    layout: &ProjectLayout,
    engine: &MockEngine,
    cleaner: Arc<RecordingCleaner>,
) -> Backend {
    Backend::new(
        layout.clone(),
        aws_credentials(),
        Arc::new(engine.clone()),
        cleaner,
    )
    .unwrap()
}

#[tokio::test]
async fn test_build_then_destroy_leaves_no_artifacts() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let paths = layout.state_paths().clone();
    let engine = MockEngine::new().with_apply_output(&paths.output_json, OUTPUT);
    let cleaner = Arc::new(RecordingCleaner::default());

    let mut backend = new_backend(&layout, &engine, cleaner.clone());
    let report = backend
        .build(&BuildRequest::new(Provider::Aws, "dev").local_backend(true))
        .await
        .unwrap();

    assert_eq!(report.url, "http://kaos.example.com:80/api");
    assert_eq!(report.directory, layout.working_dir(Provider::Aws, "dev"));
    assert!(report.directory.join("main.tf").is_file());
    assert!(report.directory.join("local_backend.tf").is_file());

    // Artifacts Terraform would leave behind.
    fs::write(&paths.tf_state, "{}").unwrap();
    fs::write(&paths.tf_state_backup, "{}").unwrap();
    fs::create_dir_all(paths.tf_dir.join("providers")).unwrap();

    let report = backend.destroy(Provider::Aws, "dev", false).await.unwrap();

    assert_eq!(report.cleanup, CleanupOutcome::Completed);
    assert!(report.leftovers.is_empty());
    assert_eq!(
        cleaner.calls.lock().as_slice(),
        ["http://kaos.example.com:80/api"]
    );

    assert!(!paths.state_file.exists());
    assert!(!paths.output_json.exists());
    assert!(!paths.tf_state.exists());
    assert!(!paths.tf_state_backup.exists());
    assert!(!paths.tf_dir.exists());
    assert!(!backend.is_created());
}

#[tokio::test]
async fn test_lifecycle_call_order() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let engine = MockEngine::new().with_apply_output(&layout.state_paths().output_json, OUTPUT);
    let mut backend = new_backend(&layout, &engine, Arc::default());

    backend
        .build(&BuildRequest::new(Provider::Aws, "dev"))
        .await
        .unwrap();
    assert_eq!(
        engine.call_sequence(),
        vec!["init", "workspace_exists", "new_workspace", "select_workspace", "plan", "apply"]
    );

    engine.clear_calls();
    backend.destroy(Provider::Aws, "dev", true).await.unwrap();
    assert_eq!(
        engine.call_sequence(),
        vec!["init", "workspace_exists", "select_workspace", "destroy"]
    );
    assert!(engine.is_verbose());
}

#[tokio::test]
async fn test_state_round_trip_across_invocations() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let engine = MockEngine::new().with_apply_output(&layout.state_paths().output_json, OUTPUT);

    let report = {
        let mut backend = new_backend(&layout, &engine, Arc::default());
        backend
            .build(&BuildRequest::new(Provider::Aws, "dev"))
            .await
            .unwrap()
    };

    let reopened = new_backend(&layout, &engine, Arc::default());
    assert!(reopened.is_created());
    assert_eq!(reopened.url(), Some(report.url.as_str()));
    assert_eq!(reopened.token(), Some(report.token.as_str()));
    assert_eq!(reopened.kubeconfig(), Some("apiVersion: v1\nclusters: []\n"));
}

#[tokio::test]
async fn test_variables_reach_engine() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let engine = MockEngine::new().with_apply_output(&layout.state_paths().output_json, OUTPUT);
    let mut backend = new_backend(&layout, &engine, Arc::default());

    backend
        .build(&BuildRequest::new(Provider::Aws, "dev"))
        .await
        .unwrap();

    let vars = engine.get_method_calls("apply")[0].vars.clone().unwrap();
    let joined = vars.join(" ");
    assert!(joined.contains(&format!("--var config_dir={}", dir.path().display())));
    assert!(joined.contains("--var aws_access_key_id=AKIA123"));
    assert!(joined.contains("--var aws_secret_access_key=s3cr3t"));
    assert!(joined.contains("--var region=eu-west-1"));
}

#[tokio::test]
async fn test_repeated_destroy_is_safe() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let engine = MockEngine::new();
    let cleaner = Arc::new(RecordingCleaner::default());
    let mut backend = new_backend(&layout, &engine, cleaner.clone());

    let working = layout.working_dir(Provider::Aws, "dev");

    backend.destroy(Provider::Aws, "dev", false).await.unwrap();
    assert!(working.join("main.tf").is_file());
    fs::write(working.join("in_progress.marker"), "kept").unwrap();

    let report = backend.destroy(Provider::Aws, "dev", false).await.unwrap();
    assert_eq!(report.cleanup, CleanupOutcome::Skipped);
    assert_eq!(fs::read_to_string(working.join("in_progress.marker")).unwrap(), "kept");
    assert!(cleaner.calls.lock().is_empty());
}

#[tokio::test]
async fn test_missing_credentials_abort_before_engine() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let engine = MockEngine::new();
    let mut backend = Backend::new(
        layout.clone(),
        ProviderCredentials::new(),
        Arc::new(engine.clone()),
        Arc::new(RecordingCleaner::default()),
    )
    .unwrap();
    backend.init("http://h:80", "t").unwrap();

    let result = backend.destroy(Provider::Aws, "dev", false).await;

    assert!(matches!(result, Err(InfraError::Configuration(_))));
    assert!(engine.get_calls().is_empty());
    assert!(backend.is_created());
}

#[tokio::test]
async fn test_failed_apply_keeps_previous_state() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let engine = MockEngine::new().fail_on("apply", "quota exceeded");
    let mut backend = new_backend(&layout, &engine, Arc::default());
    backend.init("http://previous:80", "old").unwrap();

    let result = backend.build(&BuildRequest::new(Provider::Aws, "dev")).await;

    assert!(matches!(result, Err(InfraError::Provisioning(_))));
    assert_eq!(backend.url(), Some("http://previous:80"));
    assert_eq!(backend.token(), Some("old"));
}

#[tokio::test]
async fn test_destroy_clears_engine_files_in_working_copy() {
    let dir = tempdir().unwrap();
    let layout = write_templates(dir.path());
    let engine = MockEngine::new()
        .with_engine_artifacts()
        .with_apply_output(&layout.state_paths().output_json, OUTPUT);
    let mut backend = new_backend(&layout, &engine, Arc::default());

    let working = backend
        .build(&BuildRequest::new(Provider::Aws, "dev").local_backend(true))
        .await
        .unwrap()
        .directory;
    assert!(working.join(".terraform").is_dir());
    assert!(working.join("terraform.tfstate.d").join("dev").is_dir());
    assert!(working.join("terraform.tfstate").is_file());

    let report = backend.destroy(Provider::Aws, "dev", false).await.unwrap();

    assert!(report.leftovers.is_empty());
    assert!(!working.join(".terraform").exists());
    assert!(!working.join("terraform.tfstate.d").exists());
    assert!(!working.join("terraform.tfstate").exists());
    assert!(!working.join("terraform.tfstate.backup").exists());
    // The working copy itself stays.
    assert!(working.join("main.tf").is_file());
    assert!(!layout.state_paths().state_file.exists());
}

/// Write an executable stand-in for `terraform` that leaves its files in
/// the directory it is run from, like the real binary.
#[cfg(unix)]
fn fake_terraform(bin_dir: &Path, output_json: &Path) -> String {
    use std::os::unix::fs::PermissionsExt;

    let output_source = bin_dir.join("output.json");
    fs::write(&output_source, OUTPUT).unwrap();

    let script = bin_dir.join("terraform");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\n\
             case \"$1\" in\n\
             init) mkdir -p .terraform/providers ;;\n\
             apply) echo '{{}}' > terraform.tfstate; echo '{{}}' > terraform.tfstate.backup; cp '{}' '{}' ;;\n\
             esac\n\
             exit 0\n",
            output_source.display(),
            output_json.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script.display().to_string()
}

#[cfg(unix)]
#[tokio::test]
async fn test_terraform_cli_build_then_destroy_leaves_no_engine_files() {
    let dir = tempdir().unwrap();
    let bin_dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path()).unwrap();
    let docker = layout.provider_dir(Provider::Docker);
    fs::create_dir_all(&docker).unwrap();
    fs::write(docker.join("main.tf"), "# docker").unwrap();

    let binary = fake_terraform(bin_dir.path(), &layout.state_paths().output_json);
    let engine = TerraformCli::new(TerraformOptions::default().binary(binary));
    let mut backend = Backend::new(
        layout.clone(),
        ProviderCredentials::new(),
        Arc::new(engine),
        Arc::new(RecordingCleaner::default()),
    )
    .unwrap();

    let report = backend
        .build(&BuildRequest::new(Provider::Docker, "dev"))
        .await
        .unwrap();
    assert_eq!(report.directory, docker);
    assert_eq!(report.url, "http://kaos.example.com:80/api");
    assert!(docker.join(".terraform").is_dir());
    assert!(docker.join("terraform.tfstate").is_file());

    let report = backend.destroy(Provider::Docker, "dev", false).await.unwrap();

    assert!(report.leftovers.is_empty());
    assert!(!docker.join(".terraform").exists());
    assert!(!docker.join("terraform.tfstate").exists());
    assert!(!docker.join("terraform.tfstate.backup").exists());
    assert!(docker.join("main.tf").is_file());
    assert!(!layout.state_paths().output_json.exists());
    assert!(!backend.is_created());
}
