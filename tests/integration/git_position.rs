//! Position detection against real repositories.

use std::sync::Arc;
use subnet_upgrade::config::GitConfig;
use subnet_upgrade::git::{GitRepository, Position};
use subnet_upgrade::process::SystemRunner;

use crate::common::ReleaseFixture;

fn open(path: &std::path::Path) -> GitRepository<SystemRunner> {
    GitRepository::new(Arc::new(SystemRunner::new()), path, &GitConfig::default())
}

#[tokio::test]
async fn test_tagged_head_reports_tag() {
    let fixture = ReleaseFixture::new().unwrap();

    let position = open(fixture.node_path()).current_position().await.unwrap();
    assert_eq!(position, Position::tag("v1.2.0"));
}

#[tokio::test]
async fn test_every_tag_on_head_is_reported() {
    let fixture = ReleaseFixture::new().unwrap();
    fixture.node.tag("release-1.2.0").unwrap();

    let position = open(fixture.node_path()).current_position().await.unwrap();
    assert_eq!(
        position,
        Position::Tags(vec!["release-1.2.0".to_string(), "v1.2.0".to_string()])
    );
}

#[tokio::test]
async fn test_tags_behind_head_are_ignored() {
    let fixture = ReleaseFixture::new().unwrap();

    // The author's main is one commit past v1.3.0
    let position = open(fixture.author.repo_path()).current_position().await.unwrap();
    assert_eq!(position, Position::Branch("main".to_string()));
}

#[tokio::test]
async fn test_detached_untagged_head() {
    let fixture = ReleaseFixture::new().unwrap();
    // Tip of main is past the last release
    fixture.node.checkout("main").unwrap();
    let head = fixture.node.head_sha().unwrap();
    fixture.node.checkout(&head).unwrap();

    let position = open(fixture.node_path()).current_position().await.unwrap();
    assert_eq!(position, Position::Branch("HEAD".to_string()));
}

#[tokio::test]
async fn test_not_a_repository_is_an_error() {
    let temp = tempfile::TempDir::new().unwrap();

    assert!(open(temp.path()).current_position().await.is_err());
}
