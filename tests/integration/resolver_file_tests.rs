//! Integration tests for resolving process documents from disk into a
//! running manager.

use std::path::PathBuf;
use std::time::Duration;

use proman::models::ProcessStatus;
use proman::registry::KindRegistry;
use proman::resolver::ConfigResolver;
use proman::AppError;
use tempfile::TempDir;

fn write_document(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("processes.yaml");
    std::fs::write(&path, contents).expect("write document");
    (dir, path)
}

#[tokio::test]
async fn active_entries_start_and_inactive_entries_wait() {
    let (_dir, path) = write_document(
        r"
web: !ShellProcess 'exec sleep 30'
svc: !ShellProcess
  command: exec sleep 30
  active: false
",
    );
    let registry = KindRegistry::with_builtin_kinds().unwrap();
    let manager = ConfigResolver::new(&registry)
        .with_stop_timeout(Duration::from_secs(2))
        .init_process_manager(&path)
        .await
        .unwrap();

    let status = manager.status().await;
    assert_eq!(status["web"], ProcessStatus::Running);
    assert_eq!(status["svc"], ProcessStatus::NotStarted);

    manager.stop_all().await;
    assert_eq!(manager.status().await["web"], ProcessStatus::Stopped);
}

#[tokio::test]
async fn processes_register_under_their_configured_name() {
    let (_dir, path) = write_document(
        r"
entry: !ShellProcess
  name: worker
  command: exec sleep 30
  active: false
",
    );
    let registry = KindRegistry::with_builtin_kinds().unwrap();
    let manager = ConfigResolver::new(&registry)
        .init_process_manager(&path)
        .await
        .unwrap();

    assert_eq!(manager.list().await, vec!["worker"]);
}

#[tokio::test]
async fn unknown_kind_aborts_before_anything_starts() {
    let (_dir, path) = write_document(
        r"
web: !ShellProcess 'exec sleep 30'
bad: !RubyProcess 'app.rb'
",
    );
    let registry = KindRegistry::with_builtin_kinds().unwrap();
    let err = ConfigResolver::new(&registry)
        .init_process_manager(&path)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnknownKind(_)));
    assert!(err.is_resolution_error());
}

#[tokio::test]
async fn empty_document_yields_empty_manager() {
    let (_dir, path) = write_document("");
    let registry = KindRegistry::with_builtin_kinds().unwrap();
    let manager = ConfigResolver::new(&registry)
        .init_process_manager(&path)
        .await
        .unwrap();
    assert!(manager.list().await.is_empty());
}

#[test]
fn missing_document_is_a_config_error() {
    let registry = KindRegistry::with_builtin_kinds().unwrap();
    let err = ConfigResolver::new(&registry)
        .parse_file("/nonexistent/processes.yaml")
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[tokio::test]
async fn failing_active_process_does_not_abort_startup() {
    let (_dir, path) = write_document(
        r"
ok: !ShellProcess 'exec sleep 30'
broken: !ShellProcess
  command: exec sleep 30
  cwd: /nonexistent/proman-test-dir
",
    );
    let registry = KindRegistry::with_builtin_kinds().unwrap();
    let manager = ConfigResolver::new(&registry)
        .init_process_manager(&path)
        .await
        .unwrap();

    let status = manager.status().await;
    assert_eq!(status["ok"], ProcessStatus::Running);
    assert_eq!(status["broken"], ProcessStatus::Failed);

    manager.stop_all().await;
}
