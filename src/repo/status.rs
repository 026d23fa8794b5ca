//! Working-tree status and index updates.

use std::path::Path;

use git2::{build::CheckoutBuilder, IndexAddOption, ResetType, Status, StatusOptions};

use super::types::{short, HeadSummary, StatusEntry, StatusKind};
use super::{is_unborn, Repository};
use crate::error::Result;

impl Repository {
    /// Every path with changes, one entry per path, sorted by path.
    pub fn status(&self) -> Result<Vec<StatusEntry>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.recurse_untracked_dirs(true);
        opts.include_ignored(false);
        opts.include_unmodified(false);
        opts.exclude_submodules(true);
        opts.renames_head_to_index(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut entries: Vec<StatusEntry> = statuses
            .iter()
            .filter_map(|e| {
                let (path, old_path) = match e.head_to_index() {
                    Some(delta) if e.status().is_index_renamed() => (
                        delta.new_file().path().map(path_string),
                        delta.old_file().path().map(path_string),
                    ),
                    _ => (e.path().map(str::to_string), None),
                };
                classify(path?, old_path, e.status())
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Branch, target and upstream distance of HEAD.
    pub fn head_summary(&self) -> Result<HeadSummary> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(err) if is_unborn(&err) => {
                let reference = self.repo.find_reference("HEAD")?;
                let branch = reference
                    .symbolic_target()
                    .map(|t| t.trim_start_matches("refs/heads/").to_string());
                return Ok(HeadSummary {
                    branch,
                    ..HeadSummary::default()
                });
            }
            Err(err) => return Err(err.into()),
        };

        let mut summary = HeadSummary {
            target: head.target().map(|oid| short(&oid.to_string()).to_string()),
            ..HeadSummary::default()
        };
        if !head.is_branch() {
            return Ok(summary);
        }
        let name = head.shorthand().unwrap_or("HEAD").to_string();
        summary.branch = Some(name.clone());

        if let Ok(upstream) = self
            .repo
            .find_branch(&name, git2::BranchType::Local)
            .and_then(|b| b.upstream())
        {
            summary.upstream = upstream.name().ok().flatten().map(str::to_string);
            if let (Some(local), Some(remote)) = (head.target(), upstream.get().target()) {
                let (ahead, behind) = self.repo.graph_ahead_behind(local, remote)?;
                summary.ahead = ahead;
                summary.behind = behind;
            }
        }
        Ok(summary)
    }

    /// Stages the working-tree state of `path`, including its deletion.
    pub fn add_path(&self, path: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        if self.workdir.join(path).exists() {
            index.add_path(Path::new(path))?;
        } else {
            index.remove_path(Path::new(path))?;
        }
        index.write()?;
        Ok(())
    }

    /// Resets the index entry of `path` to HEAD.
    pub fn reset_path(&self, path: &str) -> Result<()> {
        match self.head_commit()? {
            Some(head) => self.repo.reset_default(Some(head.as_object()), [path])?,
            None => {
                let mut index = self.repo.index()?;
                index.remove_path(Path::new(path))?;
                index.write()?;
            }
        }
        Ok(())
    }

    /// Unstages a whole entry, both sides of a rename included.
    pub fn reset_entry(&self, entry: &StatusEntry) -> Result<()> {
        if let Some(old) = &entry.old_path {
            self.reset_path(old)?;
        }
        self.reset_path(&entry.path)
    }

    /// `git add --all`.
    pub fn add_all(&self) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        Ok(())
    }

    /// `git reset` (mixed, no paths).
    pub fn reset_all(&self) -> Result<()> {
        match self.head_commit()? {
            Some(head) => self.repo.reset(head.as_object(), ResetType::Mixed, None)?,
            None => {
                let mut index = self.repo.index()?;
                index.clear()?;
                index.write()?;
            }
        }
        Ok(())
    }

    /// Throws away every change to `entry`, staged or not. Paths unknown to
    /// HEAD are removed from the index and deleted.
    pub fn discard_path(&self, entry: &StatusEntry) -> Result<()> {
        let path = entry.path.as_str();
        let in_head = match self.head_commit()? {
            Some(head) => head.tree()?.get_path(Path::new(path)).is_ok(),
            None => false,
        };

        self.reset_entry(entry)?;
        if !in_head {
            let mut index = self.repo.index()?;
            if index.get_path(Path::new(path), 0).is_some() {
                index.remove_path(Path::new(path))?;
                index.write()?;
            }
            let full = self.workdir.join(path);
            if full.is_dir() {
                std::fs::remove_dir_all(&full)?;
            } else if full.exists() {
                std::fs::remove_file(&full)?;
            }
        } else {
            let mut checkout = CheckoutBuilder::new();
            checkout.force().path(path);
            self.repo.checkout_head(Some(&mut checkout))?;
        }
        if let Some(old) = &entry.old_path {
            let mut checkout = CheckoutBuilder::new();
            checkout.force().path(old.as_str());
            self.repo.checkout_head(Some(&mut checkout))?;
        }
        log::debug!("discarded changes to {path}");
        Ok(())
    }
}

fn path_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn classify(path: String, old_path: Option<String>, s: Status) -> Option<StatusEntry> {
    if s.is_conflicted() {
        return Some(StatusEntry {
            path,
            old_path: None,
            kind: StatusKind::Conflicted,
            staged: false,
            partial: false,
        });
    }

    let index = if s.is_index_new() {
        Some(StatusKind::Added)
    } else if s.is_index_renamed() {
        Some(StatusKind::Renamed)
    } else if s.is_index_deleted() {
        Some(StatusKind::Deleted)
    } else if s.is_index_typechange() {
        Some(StatusKind::TypeChange)
    } else if s.is_index_modified() {
        Some(StatusKind::Modified)
    } else {
        None
    };
    let worktree = if s.is_wt_new() {
        Some(StatusKind::Untracked)
    } else if s.is_wt_deleted() {
        Some(StatusKind::Deleted)
    } else if s.is_wt_typechange() {
        Some(StatusKind::TypeChange)
    } else if s.is_wt_renamed() {
        Some(StatusKind::Renamed)
    } else if s.is_wt_modified() {
        Some(StatusKind::Modified)
    } else {
        None
    };

    let (kind, staged, partial) = match (index, worktree) {
        (Some(kind), None) => (kind, true, false),
        (Some(kind), Some(_)) => (kind, false, true),
        (None, Some(kind)) => (kind, false, false),
        (None, None) => return None,
    };
    Some(StatusEntry {
        path,
        old_path,
        kind,
        staged,
        partial,
    })
}
