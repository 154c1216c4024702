//! Shared fixtures for the integration tests.

use anyhow::Result;
use std::path::{Path, PathBuf};
use subnet_upgrade::test_utils::{TestGit, init_test_logging};
use tempfile::TempDir;

/// A remote with two releases and a node checkout sitting on the older one.
///
/// History of the remote's `main`:
///
/// ```text
/// v1.2.0 ── v1.3.0 ── (unreleased)
/// ```
///
/// The node is a clone of the remote with `v1.2.0` checked out (detached).
pub struct ReleaseFixture {
    _temp: TempDir,
    pub author: TestGit,
    pub node: TestGit,
    config_path: PathBuf,
}

impl ReleaseFixture {
    pub fn new() -> Result<Self> {
        init_test_logging(None);
        let temp = TempDir::new()?;

        let author = TestGit::new(temp.path().join("author"));
        author.init()?;
        author.commit_file("requirements.txt", "numpy==1.26.0\n", "Release 1.2.0")?;
        author.tag("v1.2.0")?;
        author.commit_file("requirements.txt", "numpy==1.26.4\n", "Release 1.3.0")?;
        author.tag("v1.3.0")?;
        author.commit_file("CHANGELOG.md", "unreleased\n", "Work in progress")?;

        let remote = TestGit::new(temp.path().join("remote.git"));
        remote.init_bare()?;
        let remote_url = remote.repo_path().display().to_string();
        author.remote_add("origin", &remote_url)?;
        author.push_all("origin")?;

        let node = TestGit::clone_from(&remote_url, temp.path().join("node"))?;
        node.checkout("v1.2.0")?;

        // `true` accepts any arguments, standing in for pip
        let config_path = temp.path().join("subnet-upgrade.toml");
        std::fs::write(&config_path, "[dependencies]\nprogram = \"true\"\n")?;

        Ok(Self {
            _temp: temp,
            author,
            node,
            config_path,
        })
    }

    pub fn node_path(&self) -> &Path {
        self.node.repo_path()
    }

    /// Config file outside the node checkout, so it never dirties the tree.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Publish a new release on the remote.
    pub fn release(&self, tag: &str) -> Result<()> {
        self.author.commit_file("CHANGELOG.md", &format!("{tag}\n"), &format!("Release {tag}"))?;
        self.author.tag(tag)?;
        self.author.push_all("origin")
    }
}
