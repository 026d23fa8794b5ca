//! Repository operations used by the views.
//!
//! Reads and index updates go through `git2`. Anything that wants the
//! terminal (pagers, commit message editing, checkout with its progress
//! output) runs the `git` binary through a [`Spawn`] so the prompt can hand
//! the terminal over.

mod history;
mod patch;
mod refs;
mod status;
mod types;

pub use patch::reverse_patch;
pub use types::{
    short, Branch, Commit, DiffDelta, HeadSummary, RefKind, RefLabel, StatusEntry, StatusKind,
    Tag, UpstreamRef,
};

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::prompt::Spawn;

pub struct Repository {
    repo: git2::Repository,
    workdir: PathBuf,
}

impl Repository {
    /// Opens the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = git2::Repository::discover(path)?;
        let workdir = repo.workdir().ok_or(Error::Bare)?.to_path_buf();
        log::debug!("opened repository at {}", workdir.display());
        Ok(Self { repo, workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Runs `git <args>` in the working tree with the terminal attached.
    pub fn pop_external(&self, spawner: &mut dyn Spawn, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir).env("LESS", "-RCS");
        log::debug!("running git {}", args.join(" "));

        let status = spawner.spawn(&mut cmd).map_err(|source| Error::Spawn {
            program: "git".to_string(),
            args: args.join(" "),
            source,
        })?;
        if !status.success() {
            return Err(Error::Command {
                program: "git".to_string(),
                args: args.join(" "),
                status,
            });
        }
        Ok(())
    }

    /// `git checkout <name>`; fails, for instance, when local changes would
    /// be overwritten.
    pub fn checkout_branch(&self, spawner: &mut dyn Spawn, name: &str) -> Result<()> {
        self.pop_external(spawner, &["checkout", name])
    }

    /// Arguments for showing the diff of a status entry in a pager.
    pub fn entry_diff_args(entry: &StatusEntry) -> Vec<String> {
        let mut args = vec!["diff".to_string()];
        if entry.is_untracked() {
            args.extend(["--no-index", "/dev/null"].map(String::from));
            args.push(entry.path.clone());
            return args;
        }
        if entry.staged {
            args.push("--cached".to_string());
        }
        args.push("--".to_string());
        if let Some(old) = &entry.old_path {
            args.push(old.clone());
        }
        args.push(entry.path.clone());
        args
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(err) if is_unborn(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_unborn(err: &git2::Error) -> bool {
    matches!(
        err.code(),
        git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
    )
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::{Path, PathBuf};

    use git2::{Repository, Signature};

    /// Fresh repository with a configured user and one commit containing
    /// `README`.
    pub fn create_temp_repo() -> (tempfile::TempDir, PathBuf) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo_path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&repo_path).expect("Failed to init repo");
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        drop(repo);
        commit_files(&repo_path, &[("README", "hello\n")], "Initial commit");
        (temp_dir, repo_path)
    }

    /// Writes, stages and commits `files` on HEAD. Returns the new hash.
    pub fn commit_files(repo_path: &Path, files: &[(&str, &str)], message: &str) -> String {
        let repo = Repository::open(repo_path).unwrap();
        let mut index = repo.index().unwrap();
        for (rel, content) in files {
            let full = repo_path.join(rel);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&full, content).unwrap();
            index.add_path(Path::new(rel)).unwrap();
        }
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parents: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    pub fn write(repo_path: &Path, rel: &str, content: &str) {
        std::fs::write(repo_path.join(rel), content).unwrap();
    }
}
