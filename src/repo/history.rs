//! Commit history and per-commit diffs.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use chrono::{DateTime, Utc};
use git2::{Delta, Oid, Sort};

use super::types::{Commit, DiffDelta, StatusKind};
use super::{is_unborn, Repository};
use crate::error::{Error, Result};

impl Repository {
    /// Commits reachable from HEAD, newest first.
    pub fn commits(&self) -> Result<Vec<Commit>> {
        let mut out = Vec::new();
        walk(&self.repo, |c| {
            out.push(c);
            true
        })?;
        Ok(out)
    }

    /// Like [`Repository::commits`] but walks on a background thread and
    /// sends each commit, passed through `wrap`, as it is found. The channel
    /// closes at the end of history or when the receiver is dropped.
    pub fn stream_commits<T, F>(&self, wrap: F) -> Result<Receiver<T>>
    where
        T: Send + 'static,
        F: Fn(Commit) -> T + Send + 'static,
    {
        let path: PathBuf = self.repo.path().to_path_buf();
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("commit-walk".to_string())
            .spawn(move || {
                let result = git2::Repository::open(&path)
                    .map_err(Error::from)
                    .and_then(|repo| walk(&repo, |c| tx.send(wrap(c)).is_ok()));
                if let Err(err) = result {
                    log::warn!("commit walk failed: {err}");
                }
            })?;
        Ok(rx)
    }

    pub fn find_commit(&self, hash: &str) -> Result<Commit> {
        let commit = self.repo.find_commit(Oid::from_str(hash)?)?;
        Ok(to_commit(&commit))
    }

    /// Files changed by `commit` against its first parent, or against the
    /// empty tree for a root commit. Renames are detected.
    pub fn diff_of(&self, commit: &Commit) -> Result<Vec<DiffDelta>> {
        let c = self.repo.find_commit(Oid::from_str(&commit.hash)?)?;
        let tree = c.tree()?;
        let parent_tree = match c.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let mut diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        diff.find_similar(None)?;

        let deltas = diff
            .deltas()
            .filter_map(|d| {
                let kind = match d.status() {
                    Delta::Added | Delta::Copied => StatusKind::Added,
                    Delta::Deleted => StatusKind::Deleted,
                    Delta::Renamed => StatusKind::Renamed,
                    Delta::Typechange => StatusKind::TypeChange,
                    Delta::Conflicted => StatusKind::Conflicted,
                    Delta::Modified => StatusKind::Modified,
                    _ => return None,
                };
                let new = d.new_file().path().or_else(|| d.old_file().path())?;
                let old_path = match kind {
                    StatusKind::Renamed => d.old_file().path().map(|p| p.to_string_lossy().into_owned()),
                    _ => None,
                };
                Some(DiffDelta {
                    commit: commit.hash.clone(),
                    path: new.to_string_lossy().into_owned(),
                    old_path,
                    kind,
                })
            })
            .collect();
        Ok(deltas)
    }
}

/// Walks HEAD's history in topological, then time order. `each` returns
/// false to stop early. An unborn HEAD has no history.
fn walk(repo: &git2::Repository, mut each: impl FnMut(Commit) -> bool) -> Result<()> {
    match repo.head() {
        Ok(_) => {}
        Err(err) if is_unborn(&err) => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push_head()?;
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        if !each(to_commit(&commit)) {
            break;
        }
    }
    Ok(())
}

fn to_commit(c: &git2::Commit<'_>) -> Commit {
    let author = c.author();
    Commit {
        hash: c.id().to_string(),
        parent: c.parent_id(0).ok().map(|id| id.to_string()),
        author: author.name().unwrap_or("").to_string(),
        email: author.email().unwrap_or("").to_string(),
        when: DateTime::<Utc>::from_timestamp(c.time().seconds(), 0).unwrap_or_default(),
        summary: c.summary().unwrap_or("").to_string(),
    }
}
