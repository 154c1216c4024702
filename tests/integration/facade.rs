//! `upgrade_subnet` / `downgrade_subnet` against a real node checkout.

use std::sync::Arc;
use subnet_upgrade::config::UpgradeConfig;
use subnet_upgrade::deps::PipInstaller;
use subnet_upgrade::git::GitRepository;
use subnet_upgrade::process::SystemRunner;
use subnet_upgrade::test_utils::RecordingRunner;
use subnet_upgrade::version::{FailureKind, UpgradeOutcome, UpgradeState, VersionControl};

use crate::common::ReleaseFixture;

type Control = VersionControl<GitRepository<SystemRunner>, PipInstaller<RecordingRunner>>;

fn control(fixture: &ReleaseFixture, pip: RecordingRunner) -> (Arc<RecordingRunner>, Control) {
    let config = UpgradeConfig::default();
    let pip = Arc::new(pip);
    let control = VersionControl::new(
        GitRepository::new(Arc::new(SystemRunner::new()), fixture.node_path(), &config.git),
        PipInstaller::new(Arc::clone(&pip), fixture.node_path(), config.dependencies),
        Arc::new(UpgradeState::new()),
    );
    (pip, control)
}

#[tokio::test]
async fn test_upgrade_then_downgrade() {
    let fixture = ReleaseFixture::new().unwrap();
    let (pip, control) = control(&fixture, RecordingRunner::new());

    assert!(control.upgrade_subnet("1.3.0").await.is_success());
    assert_eq!(fixture.node.head_sha().unwrap(), fixture.node.tag_sha("v1.3.0").unwrap());

    assert!(control.downgrade_subnet("1.2.0").await.is_success());
    assert_eq!(fixture.node.head_sha().unwrap(), fixture.node.tag_sha("v1.2.0").unwrap());

    assert_eq!(
        pip.commands(),
        vec![
            "pip install -r requirements.txt",
            "pip install -e .",
            "pip install -r requirements.txt",
            "pip install -e .",
        ]
    );
}

#[tokio::test]
async fn test_unknown_version_fails_without_install() {
    let fixture = ReleaseFixture::new().unwrap();
    let (pip, control) = control(&fixture, RecordingRunner::new());

    match control.upgrade_subnet("9.9.9").await {
        UpgradeOutcome::Failed { kind, message } => {
            assert_eq!(kind, FailureKind::SourceControl);
            assert!(message.contains("v9.9.9"), "{message}");
        }
        UpgradeOutcome::Completed { .. } => panic!("v9.9.9 does not exist"),
    }
    assert!(pip.commands().is_empty());
}

#[tokio::test]
async fn test_install_failure_reported_after_checkout() {
    let fixture = ReleaseFixture::new().unwrap();
    let (_pip, control) = control(
        &fixture,
        RecordingRunner::new().fail_pip(&["install", "-r"], "ERROR: No matching distribution"),
    );

    let outcome = control.upgrade_subnet("1.3.0").await;
    assert!(matches!(
        outcome,
        UpgradeOutcome::Failed {
            kind: FailureKind::Dependencies,
            ..
        }
    ));
    // No rollback: the new source stays checked out
    assert_eq!(fixture.node.head_sha().unwrap(), fixture.node.tag_sha("v1.3.0").unwrap());
}

#[tokio::test]
async fn test_flag_shared_with_node_tasks() {
    let fixture = ReleaseFixture::new().unwrap();
    let (_pip, control) = control(&fixture, RecordingRunner::new());
    let control = Arc::new(control);

    assert!(control.state().try_begin());
    let watcher = {
        let state = Arc::clone(control.state());
        tokio::spawn(async move { state.is_upgrading() })
    };
    assert!(watcher.await.unwrap());

    let outcome = control.upgrade_subnet("1.3.0").await;
    control.state().set_must_restart(outcome.is_success());
    control.state().set_upgrading(false);

    assert!(control.state().must_restart());
    assert!(!control.state().is_upgrading());
}
