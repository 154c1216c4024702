//! The `subnet-upgrade` binary against a real node checkout.
//!
//! The fixture's config replaces pip with `true`, so these are unix-only.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::ReleaseFixture;

fn subnet_upgrade(fixture: &ReleaseFixture) -> Command {
    let mut cmd = Command::cargo_bin("subnet-upgrade").unwrap();
    cmd.env_remove("SUBNET_UPGRADE_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("-C")
        .arg(fixture.node_path())
        .arg("--config")
        .arg(fixture.config_path());
    cmd
}

#[test]
fn test_help_lists_flags() {
    Command::cargo_bin("subnet-upgrade")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--tag"))
        .stdout(predicate::str::contains("--branch"))
        .stdout(predicate::str::contains("--repo"));
}

#[test]
fn test_verbose_and_quiet_are_exclusive() {
    Command::cargo_bin("subnet-upgrade")
        .unwrap()
        .args(["--verbose", "--quiet"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_same_tag_is_a_no_op() {
    let fixture = ReleaseFixture::new().unwrap();
    let before = fixture.node.head_sha().unwrap();

    subnet_upgrade(&fixture)
        .args(["--tag", "v1.2.0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("already checked out"))
        .stderr(predicate::str::contains("Dependencies installed").not());

    assert_eq!(fixture.node.head_sha().unwrap(), before);
}

#[test]
fn test_upgrade_to_newer_tag() {
    let fixture = ReleaseFixture::new().unwrap();

    subnet_upgrade(&fixture)
        .args(["--tag", "v1.3.0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Upgrading from tag v1.2.0 to tag v1.3.0"));

    assert_eq!(
        fixture.node.head_sha().unwrap(),
        fixture.node.tag_sha("v1.3.0").unwrap()
    );
}

#[test]
fn test_upgrade_to_branch_tracks_remote_head() {
    let fixture = ReleaseFixture::new().unwrap();

    subnet_upgrade(&fixture).args(["--branch", "main"]).assert().success();

    assert_eq!(fixture.node.current_branch().unwrap(), "main");
    assert_eq!(fixture.node.head_sha().unwrap(), fixture.author.head_sha().unwrap());
}

#[test]
fn test_no_flags_tracks_main() {
    let fixture = ReleaseFixture::new().unwrap();

    subnet_upgrade(&fixture).assert().success();

    assert_eq!(fixture.node.current_branch().unwrap(), "main");
}

#[test]
fn test_dirty_tree_is_stashed() {
    let fixture = ReleaseFixture::new().unwrap();
    std::fs::write(fixture.node_path().join("requirements.txt"), "numpy==0.0.1\n").unwrap();

    subnet_upgrade(&fixture).args(["--tag", "v1.3.0"]).assert().success();

    assert_eq!(fixture.node.stash_count().unwrap(), 1);
    assert!(fixture.node.status_porcelain().unwrap().is_empty());
}

#[test]
fn test_unknown_tag_fails() {
    let fixture = ReleaseFixture::new().unwrap();
    let before = fixture.node.head_sha().unwrap();

    subnet_upgrade(&fixture)
        .args(["--tag", "v9.9.9"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("v9.9.9"));

    assert_eq!(fixture.node.head_sha().unwrap(), before);
}

#[test]
fn test_empty_target_logs_and_exits_zero() {
    let fixture = ReleaseFixture::new().unwrap();

    subnet_upgrade(&fixture)
        .args(["--tag", "", "--branch", ""])
        .assert()
        .success()
        .stderr(predicate::str::contains("provide a tag or a branch"));
}

#[test]
fn test_option_like_target_is_rejected() {
    let fixture = ReleaseFixture::new().unwrap();

    subnet_upgrade(&fixture)
        .arg("--tag=--orphan")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid upgrade target"));
}

#[test]
fn test_missing_package_manager_fails_before_git() {
    let fixture = ReleaseFixture::new().unwrap();
    let config = fixture.node_path().parent().unwrap().join("broken.toml");
    std::fs::write(&config, "[dependencies]\nprogram = \"no-such-pip-anywhere\"\n").unwrap();
    let before = fixture.node.head_sha().unwrap();

    Command::cargo_bin("subnet-upgrade")
        .unwrap()
        .env_remove("SUBNET_UPGRADE_CONFIG")
        .arg("-C")
        .arg(fixture.node_path())
        .arg("--config")
        .arg(&config)
        .args(["--tag", "v1.3.0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no-such-pip-anywhere"));

    assert_eq!(fixture.node.head_sha().unwrap(), before);
}

#[test]
fn test_config_from_environment() {
    let fixture = ReleaseFixture::new().unwrap();

    Command::cargo_bin("subnet-upgrade")
        .unwrap()
        .env("SUBNET_UPGRADE_CONFIG", fixture.config_path())
        .arg("-C")
        .arg(fixture.node_path())
        .args(["--tag", "v1.3.0"])
        .assert()
        .success();

    assert_eq!(
        fixture.node.head_sha().unwrap(),
        fixture.node.tag_sha("v1.3.0").unwrap()
    );
}
