//! A [`CommandRunner`] that records invocations and replays scripted results.

use anyhow::Result;
use std::sync::Mutex;

use crate::process::{CommandOutput, CommandRunner, Invocation, SystemRunner, Tool};

enum Reply {
    Output(String),
    Failure(String),
}

struct Rule {
    tool: Tool,
    prefix: Vec<String>,
    reply: Reply,
}

impl Rule {
    fn matches(&self, invocation: &Invocation) -> bool {
        invocation.tool == self.tool
            && invocation.args.len() >= self.prefix.len()
            && invocation.args.iter().zip(&self.prefix).all(|(arg, want)| arg == want)
    }
}

/// Records every invocation and answers from a list of rules.
///
/// Rules match on tool and leading arguments; the first match wins. Unmatched
/// invocations succeed with empty output, unless git passthrough is enabled,
/// in which case unmatched git invocations run for real.
///
/// ```rust,no_run
/// use subnet_upgrade::test_utils::RecordingRunner;
///
/// let runner = RecordingRunner::new()
///     .on_branch("main")
///     .fail_pip(&["install", "-r"], "No matching distribution");
/// ```
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    rules: Vec<Rule>,
    git_passthrough: bool,
}

impl RecordingRunner {
    /// Runner where every command succeeds with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that executes unmatched git commands for real and records them.
    pub fn git_passthrough() -> Self {
        Self {
            git_passthrough: true,
            ..Self::default()
        }
    }

    fn rule(mut self, tool: Tool, prefix: &[&str], reply: Reply) -> Self {
        self.rules.push(Rule {
            tool,
            prefix: prefix.iter().map(ToString::to_string).collect(),
            reply,
        });
        self
    }

    /// git commands starting with `prefix` succeed with `stdout`.
    pub fn reply_git(self, prefix: &[&str], stdout: &str) -> Self {
        self.rule(Tool::Git, prefix, Reply::Output(stdout.to_string()))
    }

    /// git commands starting with `prefix` fail with `stderr`.
    pub fn fail_git(self, prefix: &[&str], stderr: &str) -> Self {
        self.rule(Tool::Git, prefix, Reply::Failure(stderr.to_string()))
    }

    /// Package-manager commands starting with `prefix` fail with `stderr`.
    pub fn fail_pip(self, prefix: &[&str], stderr: &str) -> Self {
        self.rule(Tool::PackageManager, prefix, Reply::Failure(stderr.to_string()))
    }

    /// HEAD is exactly at `tag` and no other.
    pub fn on_tag(self, tag: &str) -> Self {
        self.on_tags(&[tag])
    }

    /// HEAD carries every tag in `tags`.
    pub fn on_tags(self, tags: &[&str]) -> Self {
        self.reply_git(&["tag", "--points-at"], &tags.join("\n"))
    }

    /// HEAD is on `branch` and not at a tag.
    pub fn on_branch(self, branch: &str) -> Self {
        self.reply_git(&["tag", "--points-at"], "")
            .reply_git(&["rev-parse", "--abbrev-ref"], branch)
    }

    /// The working tree has local modifications.
    pub fn dirty(self) -> Self {
        self.reply_git(&["status", "--porcelain"], " M neurons/validator.py")
    }

    /// Every invocation so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Every invocation as `git ...` / `<program> ...` lines, in order.
    pub fn commands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|inv| {
                let program = match inv.tool {
                    Tool::Git => "git",
                    Tool::PackageManager => inv.program.as_str(),
                };
                format!("{} {}", program, inv.args.join(" "))
            })
            .collect()
    }

    /// Commands that change the working tree or environment (queries dropped).
    pub fn mutating_commands(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|line| {
                !(line.starts_with("git tag --points-at")
                    || line.starts_with("git rev-parse")
                    || line.starts_with("git status"))
            })
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(invocation.clone());

        match self.rules.iter().find(|rule| rule.matches(&invocation)).map(|rule| &rule.reply) {
            Some(Reply::Output(stdout)) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            Some(Reply::Failure(stderr)) => Err(invocation.failure(stderr, "").into()),
            None if self.git_passthrough && invocation.tool == Tool::Git => {
                SystemRunner::new().run(invocation).await
            }
            None => Ok(CommandOutput::default()),
        }
    }
}
