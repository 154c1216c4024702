//! The upgrade sequence against a real node checkout, with pip recorded.

use std::sync::Arc;
use subnet_upgrade::config::UpgradeConfig;
use subnet_upgrade::git::Position;
use subnet_upgrade::test_utils::RecordingRunner;
use subnet_upgrade::upgrade::{Target, UpgradeReport, Upgrader};

use crate::common::ReleaseFixture;

fn new_upgrader(fixture: &ReleaseFixture) -> (Arc<RecordingRunner>, Upgrader<RecordingRunner>) {
    let runner = Arc::new(RecordingRunner::git_passthrough());
    let upgrader = Upgrader::new(Arc::clone(&runner), fixture.node_path(), &UpgradeConfig::default());
    (runner, upgrader)
}

#[tokio::test]
async fn test_tag_upgrade_exact_sequence() {
    let fixture = ReleaseFixture::new().unwrap();
    let (runner, upgrader) = new_upgrader(&fixture);

    let report = upgrader.upgrade(&Target::Tag("v1.3.0".to_string())).await.unwrap();

    assert_eq!(
        report,
        UpgradeReport::Upgraded {
            from: Position::tag("v1.2.0"),
            to: Target::Tag("v1.3.0".to_string()),
            stashed: false,
        }
    );
    assert_eq!(
        runner.mutating_commands(),
        vec![
            "git fetch origin --tags --force",
            "git checkout tags/v1.3.0",
            "pip install -r requirements.txt",
            "pip install -e .",
        ]
    );
    assert_eq!(fixture.node.head_sha().unwrap(), fixture.node.tag_sha("v1.3.0").unwrap());
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let fixture = ReleaseFixture::new().unwrap();
    let target = Target::Tag("v1.3.0".to_string());

    new_upgrader(&fixture).1.upgrade(&target).await.unwrap();

    let (runner, upgrader) = new_upgrader(&fixture);
    let report = upgrader.upgrade(&target).await.unwrap();
    assert_eq!(report, UpgradeReport::AlreadyCurrent(Position::tag("v1.3.0")));
    assert!(runner.mutating_commands().is_empty());
}

#[tokio::test]
async fn test_release_published_after_clone_is_fetched() {
    let fixture = ReleaseFixture::new().unwrap();
    fixture.release("v1.4.0").unwrap();
    let (_runner, upgrader) = new_upgrader(&fixture);

    upgrader.upgrade(&Target::Tag("v1.4.0".to_string())).await.unwrap();

    assert_eq!(fixture.node.head_sha().unwrap(), fixture.author.tag_sha("v1.4.0").unwrap());
}

#[tokio::test]
async fn test_branch_upgrade_pulls_latest() {
    let fixture = ReleaseFixture::new().unwrap();
    fixture.node.checkout("main").unwrap();
    fixture.release("v1.4.0").unwrap();
    let (runner, upgrader) = new_upgrader(&fixture);

    // Already on main, but a branch upgrade is skipped only by name
    let report = upgrader.upgrade(&Target::Branch("main".to_string())).await.unwrap();
    assert!(matches!(report, UpgradeReport::AlreadyCurrent(_)));
    assert!(runner.mutating_commands().is_empty());

    fixture.node.checkout("v1.2.0").unwrap();
    let (runner, upgrader) = new_upgrader(&fixture);
    upgrader.upgrade(&Target::Branch("main".to_string())).await.unwrap();

    assert_eq!(
        runner.mutating_commands()[..3],
        [
            "git fetch origin --tags --force",
            "git checkout -B main --track origin/main",
            "git pull",
        ]
    );
    assert_eq!(fixture.node.current_branch().unwrap(), "main");
    assert_eq!(fixture.node.head_sha().unwrap(), fixture.author.head_sha().unwrap());
}

#[tokio::test]
async fn test_tag_sharing_head_with_other_tags_is_a_no_op() {
    let fixture = ReleaseFixture::new().unwrap();
    fixture.node.tag("release-1.2.0").unwrap();
    fixture.node.tag("v1.2.0-final").unwrap();
    let (runner, upgrader) = new_upgrader(&fixture);

    let report = upgrader.upgrade(&Target::Tag("v1.2.0".to_string())).await.unwrap();

    match report {
        UpgradeReport::AlreadyCurrent(position) => assert!(position.has_tag("v1.2.0")),
        other => panic!("expected no-op, got {other:?}"),
    }
    assert!(runner.mutating_commands().is_empty());
}

#[tokio::test]
async fn test_dirty_tree_stash_then_upgrade() {
    let fixture = ReleaseFixture::new().unwrap();
    std::fs::write(fixture.node_path().join("requirements.txt"), "numpy==0.0.1\n").unwrap();
    std::fs::write(fixture.node_path().join("wallet.json"), "{\"hotkey\": \"backup\"}").unwrap();
    let (runner, upgrader) = new_upgrader(&fixture);

    let report = upgrader.upgrade(&Target::Tag("v1.3.0".to_string())).await.unwrap();

    assert!(matches!(report, UpgradeReport::Upgraded { stashed: true, .. }));
    assert!(runner.mutating_commands()[0].starts_with("git stash push"));
    assert_eq!(fixture.node.stash_count().unwrap(), 1);
    assert_eq!(fixture.node.head_sha().unwrap(), fixture.node.tag_sha("v1.3.0").unwrap());
    // The tracked edit went into the stash, the untracked file stayed put
    assert_eq!(
        std::fs::read_to_string(fixture.node_path().join("requirements.txt")).unwrap(),
        "numpy==1.26.4\n"
    );
    assert!(fixture.node_path().join("wallet.json").exists());
}

#[tokio::test]
async fn test_untracked_files_alone_do_not_stash() {
    let fixture = ReleaseFixture::new().unwrap();
    std::fs::write(fixture.node_path().join("wallet.json"), "{}").unwrap();
    let (runner, upgrader) = new_upgrader(&fixture);

    let report = upgrader.upgrade(&Target::Tag("v1.3.0".to_string())).await.unwrap();

    assert!(matches!(report, UpgradeReport::Upgraded { stashed: false, .. }));
    assert!(!runner.commands().iter().any(|c| c.starts_with("git stash")));
    assert_eq!(fixture.node.stash_count().unwrap(), 0);
    assert!(fixture.node_path().join("wallet.json").exists());
}

#[tokio::test]
async fn test_missing_tag_stops_before_install() {
    let fixture = ReleaseFixture::new().unwrap();
    let before = fixture.node.head_sha().unwrap();
    let (runner, upgrader) = new_upgrader(&fixture);

    assert!(upgrader.upgrade(&Target::Tag("v9.9.9".to_string())).await.is_err());

    assert!(!runner.commands().iter().any(|c| c.starts_with("pip")));
    assert_eq!(fixture.node.head_sha().unwrap(), before);
}
