//! Branches, tags and the refs pointing at each commit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use git2::BranchType;

use super::types::{Branch, RefKind, RefLabel, Tag, UpstreamRef};
use super::Repository;
use crate::error::{Error, Result};

impl Repository {
    /// Local then remote-tracking branches; the checked-out branch first.
    pub fn branches(&self) -> Result<Vec<Branch>> {
        let mut out = Vec::new();
        for item in self.repo.branches(None)? {
            let (branch, kind) = item?;
            let name = match branch.name()? {
                Some(name) if !name.ends_with("/HEAD") => name.to_string(),
                _ => continue,
            };
            let reference = branch.get();
            let Some(target) = reference.target() else {
                continue;
            };

            let upstream = match kind {
                BranchType::Local => branch.upstream().ok().and_then(|up| {
                    let up_name = up.name().ok().flatten()?.to_string();
                    let up_target = up.get().target()?;
                    let (ahead, behind) = self.repo.graph_ahead_behind(target, up_target).ok()?;
                    Some(UpstreamRef {
                        name: up_name,
                        hash: up_target.to_string(),
                        ahead,
                        behind,
                    })
                }),
                BranchType::Remote => None,
            };

            out.push(Branch {
                name,
                full_name: reference.name().unwrap_or("").to_string(),
                target: target.to_string(),
                is_remote: matches!(kind, BranchType::Remote),
                is_head: branch.is_head(),
                upstream,
                updated: self.commit_time(target),
            });
        }
        out.sort_by(|a, b| {
            b.is_head
                .cmp(&a.is_head)
                .then(a.is_remote.cmp(&b.is_remote))
                .then(a.name.cmp(&b.name))
        });
        Ok(out)
    }

    /// Tags that peel to a commit, by name.
    pub fn tags(&self) -> Result<Vec<Tag>> {
        let names = self.repo.tag_names(None)?;
        let mut out = Vec::new();
        for name in names.iter().flatten() {
            let object = self.repo.revparse_single(&format!("refs/tags/{name}"))?;
            let Ok(commit) = object.peel_to_commit() else {
                continue;
            };
            out.push(Tag {
                name: name.to_string(),
                target: commit.id().to_string(),
                updated: self.commit_time(commit.id()),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Commit hash to the refs pointing at it, each list sorted with HEAD
    /// first, then local branches, remote branches and tags.
    pub fn refs_by_commit_hash(&self) -> Result<HashMap<String, Vec<RefLabel>>> {
        let mut map: HashMap<String, Vec<RefLabel>> = HashMap::new();
        if let Ok(head) = self.repo.head() {
            if let Some(oid) = head.target() {
                map.entry(oid.to_string()).or_default().push(RefLabel {
                    kind: RefKind::Head,
                    name: "HEAD".to_string(),
                });
            }
        }

        for reference in self.repo.references()? {
            let reference = reference?;
            let kind = if reference.is_branch() {
                RefKind::Local
            } else if reference.is_remote() {
                RefKind::Remote
            } else if reference.is_tag() {
                RefKind::Tag
            } else {
                continue;
            };
            let Some(name) = reference.shorthand() else {
                continue;
            };
            if name.ends_with("/HEAD") {
                continue;
            }
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };
            map.entry(commit.id().to_string()).or_default().push(RefLabel {
                kind,
                name: name.to_string(),
            });
        }
        for labels in map.values_mut() {
            labels.sort();
        }
        Ok(map)
    }

    /// Deletes the local branch `name`.
    ///
    /// The checked-out branch is never deleted. Without `force` the branch
    /// must be merged into HEAD.
    pub fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        let mut branch = self.repo.find_branch(name, BranchType::Local)?;
        if branch.is_head() {
            return Err(Error::CurrentBranch(name.to_string()));
        }
        if !force {
            let tip = branch.get().target();
            let head = self.repo.head().ok().and_then(|h| h.target());
            let merged = match (tip, head) {
                (Some(tip), Some(head)) => {
                    tip == head || self.repo.graph_descendant_of(head, tip)?
                }
                _ => false,
            };
            if !merged {
                return Err(Error::Unmerged(name.to_string()));
            }
        }
        branch.delete()?;
        log::info!("deleted branch {name}");
        Ok(())
    }

    fn commit_time(&self, oid: git2::Oid) -> Option<DateTime<Utc>> {
        let commit = self.repo.find_commit(oid).ok()?;
        DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use super::*;

    fn branch_at_head(path: &std::path::Path, name: &str) {
        let repo = git2::Repository::open(path).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch(name, &head, false).unwrap();
    }

    fn checkout(path: &std::path::Path, name: &str) {
        let repo = git2::Repository::open(path).unwrap();
        repo.set_head(&format!("refs/heads/{name}")).unwrap();
        repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
            .unwrap();
    }

    #[test]
    fn test_branches_head_first() {
        let (_tmp, path) = create_temp_repo();
        branch_at_head(&path, "alpha");
        branch_at_head(&path, "zeta");
        let repo = Repository::discover(&path).unwrap();

        let branches = repo.branches().unwrap();
        assert_eq!(branches.len(), 3);
        assert!(branches[0].is_head);
        assert_eq!(branches[1].name, "alpha");
        assert_eq!(branches[2].name, "zeta");
        assert!(branches.iter().all(|b| !b.is_remote && b.upstream.is_none()));
        assert!(branches[1].full_name.starts_with("refs/heads/"));
        assert!(branches[1].updated.is_some());
    }

    #[test]
    fn test_upstream_ahead_behind() {
        let (_tmp, path) = create_temp_repo();
        branch_at_head(&path, "base");
        commit_files(&path, &[("a", "1")], "ahead one");
        {
            let repo = git2::Repository::open(&path).unwrap();
            let head = repo.head().unwrap();
            let current = head.shorthand().unwrap().to_string();
            let mut branch = repo.find_branch(&current, BranchType::Local).unwrap();
            branch.set_upstream(Some("base")).unwrap();
        }
        let repo = Repository::discover(&path).unwrap();
        let head = repo
            .branches()
            .unwrap()
            .into_iter()
            .find(|b| b.is_head)
            .unwrap();
        let up = head.upstream.unwrap();
        assert_eq!(up.name, "base");
        assert_eq!((up.ahead, up.behind), (1, 0));

        let summary = repo.head_summary().unwrap();
        assert_eq!(summary.upstream.as_deref(), Some("base"));
        assert_eq!((summary.ahead, summary.behind), (1, 0));
    }

    #[test]
    fn test_tags_and_refs_by_commit() {
        let (_tmp, path) = create_temp_repo();
        let first = {
            let repo = git2::Repository::open(&path).unwrap();
            let head = repo.head().unwrap().peel(git2::ObjectType::Commit).unwrap();
            repo.tag_lightweight("v0.1", &head, false).unwrap();
            head.id().to_string()
        };
        let second = commit_files(&path, &[("a", "1")], "second");
        let repo = Repository::discover(&path).unwrap();

        let tags = repo.tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].target, first);

        let refs = repo.refs_by_commit_hash().unwrap();
        let on_first: Vec<RefKind> = refs[&first].iter().map(|r| r.kind).collect();
        assert_eq!(on_first, [RefKind::Tag]);
        let on_second: Vec<RefKind> = refs[&second].iter().map(|r| r.kind).collect();
        assert_eq!(on_second, [RefKind::Head, RefKind::Local]);
    }

    #[test]
    fn test_delete_merged_branch() {
        let (_tmp, path) = create_temp_repo();
        branch_at_head(&path, "done");
        let repo = Repository::discover(&path).unwrap();
        repo.delete_branch("done", false).unwrap();
        assert_eq!(repo.branches().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_unmerged_branch_needs_force() {
        let (_tmp, path) = create_temp_repo();
        let main = {
            let repo = git2::Repository::open(&path).unwrap();
            let name = repo.head().unwrap().shorthand().unwrap().to_string();
            name
        };
        branch_at_head(&path, "feature");
        checkout(&path, "feature");
        commit_files(&path, &[("f", "work")], "feature work");
        checkout(&path, &main);

        let repo = Repository::discover(&path).unwrap();
        assert!(matches!(
            repo.delete_branch("feature", false),
            Err(Error::Unmerged(_))
        ));
        repo.delete_branch("feature", true).unwrap();
    }

    #[test]
    fn test_delete_current_branch_is_refused() {
        let (_tmp, path) = create_temp_repo();
        let repo = Repository::discover(&path).unwrap();
        let current = repo.head_summary().unwrap().branch.unwrap();
        assert!(matches!(
            repo.delete_branch(&current, true),
            Err(Error::CurrentBranch(_))
        ));
    }
}
