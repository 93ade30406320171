use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hostpkg_client::{
    Backend, ClientConfig, ConfirmOptions, InstallOptions, PackageError, PackageManagerClient,
    RemoveOptions, SourceOptions, UpdateOptions,
};
use hostpkg_exec::error::ExecError;
use hostpkg_exec::result::ExecResult;
use hostpkg_exec::traits::Executor;

#[derive(Debug, Clone)]
struct RecordedCall {
    command: String,
    elevate: bool,
    env: Vec<(String, String)>,
    quiet: bool,
}

/// Records every call and replays scripted responses; answers with exit 0
/// and empty output once the script runs dry.
#[derive(Default)]
struct MockExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<VecDeque<ExecResult>>,
}

fn exec_result(status: i32, stdout: &str, stderr: &str) -> ExecResult {
    ExecResult {
        status,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        duration: Duration::from_millis(1),
    }
}

impl MockExecutor {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push_response(&self, status: i32, stdout: &str, stderr: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(exec_result(status, stdout, stderr));
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn run(
        &self,
        command: &str,
        elevate: bool,
        env: &[(String, String)],
        quiet: bool,
    ) -> Result<ExecResult, ExecError> {
        self.calls.lock().unwrap().push(RecordedCall {
            command: command.to_string(),
            elevate,
            env: env.to_vec(),
            quiet,
        });
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| exec_result(0, "", "")))
    }

    async fn run_with_timeout(
        &self,
        command: &str,
        elevate: bool,
        env: &[(String, String)],
        quiet: bool,
        _timeout: Duration,
    ) -> Result<ExecResult, ExecError> {
        self.run(command, elevate, env, quiet).await
    }

    fn executor_type(&self) -> &'static str {
        "mock"
    }
}

fn client(backend: Backend, executor: &Arc<MockExecutor>) -> PackageManagerClient {
    PackageManagerClient::new(backend, executor.clone())
}

#[tokio::test]
async fn test_apt_install_dispatches_exact_command() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    let outcome = apt
        .install(
            &["bpython", "git"],
            InstallOptions::default().with_no_install_recommends(true),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.command,
        "apt-get install --yes --no-install-recommends bpython git"
    );

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].command, outcome.command);
    assert!(calls[0].elevate);
    assert!(!calls[0].quiet);
    assert_eq!(
        calls[0].env,
        vec![("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())]
    );
}

#[tokio::test]
async fn test_failed_install_surfaces_exit_code_and_stderr() {
    let executor = MockExecutor::new();
    executor.push_response(100, "", "E: Unable to locate package nope");
    let apt = client(Backend::Apt, &executor);

    let err = apt
        .install(&["nope"], InstallOptions::default())
        .await
        .unwrap_err();

    match err {
        PackageError::CommandFailed {
            command,
            status,
            stderr,
        } => {
            assert_eq!(command, "apt-get install --yes nope");
            assert_eq!(status, 100);
            assert!(stderr.contains("Unable to locate package"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_backend_frontend_variable_is_passed() {
    let executor = MockExecutor::new();
    let yum = client(Backend::Yum, &executor);

    let outcome = yum.upgrade(ConfirmOptions::default()).await.unwrap();
    assert_eq!(outcome.command, "yum --assumeyes upgrade");

    let calls = executor.calls();
    assert_eq!(
        calls[0].env,
        vec![("REDHAT_FRONTEND".to_string(), "noninteractive".to_string())]
    );
}

#[tokio::test]
async fn test_scoped_update_through_client() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    let outcome = apt
        .update(UpdateOptions::default().with_source_name("trusty-backports"))
        .await
        .unwrap();

    assert_eq!(
        outcome.command,
        "apt-get update -o Dir::Etc::sourceparts='-' \
         -o Dir::Etc::sourcelist='sources.list.d/trusty-backports.list'"
    );
}

#[tokio::test]
async fn test_unsupported_operation_makes_no_executor_call() {
    let executor = MockExecutor::new();
    let zypper = client(Backend::Zypper, &executor);

    let err = zypper
        .build_dep("vim", ConfirmOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PackageError::UnsupportedOperation { .. }));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_option_makes_no_executor_call() {
    let executor = MockExecutor::new();
    let yum = client(Backend::Yum, &executor);

    let err = yum
        .remove(&["httpd"], RemoveOptions::default().with_purge(true))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PackageError::UnsupportedOption { option: "purge", .. }
    ));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_per_call_overrides_take_precedence() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    apt.install(
        &["htop"],
        InstallOptions::default().with_elevate(false).with_quiet(true),
    )
    .await
    .unwrap();

    let calls = executor.calls();
    assert!(!calls[0].elevate);
    assert!(calls[0].quiet);
}

#[tokio::test]
async fn test_config_defaults_flow_through() {
    let executor = MockExecutor::new();
    let apt = PackageManagerClient::with_config(
        Backend::Apt,
        executor.clone(),
        ClientConfig {
            elevate: false,
            quiet: true,
        },
    );

    apt.clean(Default::default()).await.unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].command, "apt-get clean");
    assert!(!calls[0].elevate);
    assert!(calls[0].quiet);
}

#[tokio::test]
async fn test_is_installed_apt_checks_status_line() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    executor.push_response(0, "Status: install ok installed", "");
    assert!(apt.is_installed("htop").await.unwrap());

    // removed but configuration left behind: dpkg -s still exits 0
    executor.push_response(0, "Status: deinstall ok config-files", "");
    assert!(!apt.is_installed("htop").await.unwrap());

    executor.push_response(1, "", "dpkg-query: package 'htop' is not installed");
    assert!(!apt.is_installed("htop").await.unwrap());

    let calls = executor.calls();
    assert_eq!(calls[0].command, "dpkg -s htop");
    assert!(calls[0].quiet);
}

#[tokio::test]
async fn test_is_installed_rpm_uses_exit_code() {
    let executor = MockExecutor::new();
    let yum = client(Backend::Yum, &executor);

    executor.push_response(0, "httpd-2.4.6-97.el7.x86_64", "");
    assert!(yum.is_installed("httpd").await.unwrap());

    executor.push_response(1, "package httpd is not installed", "");
    assert!(!yum.is_installed("httpd").await.unwrap());

    assert_eq!(executor.calls()[0].command, "rpm -q httpd");
}

#[tokio::test]
async fn test_is_reboot_required_probes_marker_file() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    executor.push_response(0, "", "");
    assert!(apt.is_reboot_required().await.unwrap());

    executor.push_response(1, "", "");
    assert!(!apt.is_reboot_required().await.unwrap());

    let calls = executor.calls();
    assert_eq!(calls[0].command, "test -e /var/run/reboot-required");
    assert!(!calls[0].elevate);
    assert!(calls[0].quiet);
}

#[tokio::test]
async fn test_is_reboot_required_unsupported_off_apt() {
    let executor = MockExecutor::new();
    let zypper = client(Backend::Zypper, &executor);

    let err = zypper.is_reboot_required().await.unwrap_err();
    assert!(matches!(err, PackageError::UnsupportedOperation { .. }));
    assert!(executor.calls().is_empty());
}

const MADISON_OUTPUT: &str = " apache2 | 2.4.7-1ubuntu4.5 | http://archive.ubuntu.com/ubuntu/ trusty-updates/main amd64 Packages
 apache2 | 2.4.7-1ubuntu4 | http://archive.ubuntu.com/ubuntu/ trusty/main amd64 Packages
not a madison row
 apache2 | 2.4.7-1ubuntu4 | http://archive.ubuntu.com/ubuntu/ trusty/main Sources";

#[tokio::test]
async fn test_is_version_available() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    executor.push_response(0, MADISON_OUTPUT, "");
    assert!(
        apt.is_version_available("apache2", "2.4.7-1ubuntu4")
            .await
            .unwrap()
    );

    executor.push_response(0, MADISON_OUTPUT, "");
    assert!(!apt.is_version_available("apache2", "1.0").await.unwrap());

    let calls = executor.calls();
    assert_eq!(calls[0].command, "apt-cache madison apache2");
    assert!(!calls[0].elevate);
    assert!(calls[0].quiet);
}

#[tokio::test]
async fn test_is_version_available_failed_query_reads_as_absent() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    executor.push_response(100, "", "E: No packages found");
    assert!(!apt.is_version_available("apache2", "1.0").await.unwrap());
}

#[tokio::test]
async fn test_is_version_available_rejects_bad_version_before_executing() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    let err = apt
        .is_version_available("apache2", "1.0; reboot")
        .await
        .unwrap_err();

    assert!(matches!(err, PackageError::InvalidArgument(_)));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_fetch_source_runs_unelevated_by_default() {
    let executor = MockExecutor::new();
    let apt = client(Backend::Apt, &executor);

    let outcome = apt
        .fetch_source(
            "python-libcloud",
            SourceOptions::default().with_download_only(true),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.command,
        "apt-get source --download-only python-libcloud"
    );
    assert!(!executor.calls()[0].elevate);
}

#[tokio::test]
async fn test_repeated_clean_renders_identical_commands() {
    let executor = MockExecutor::new();
    let yum = client(Backend::Yum, &executor);

    let first = yum.clean(Default::default()).await.unwrap();
    let second = yum.clean(Default::default()).await.unwrap();

    assert_eq!(first.command, "yum clean all");
    assert_eq!(first.command, second.command);
}
