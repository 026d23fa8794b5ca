//! Plain data records handed from the repository to the views.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChange,
    Untracked,
    Conflicted,
}

impl StatusKind {
    /// Single-letter code as used by `git status --short`.
    pub fn code(self) -> char {
        match self {
            StatusKind::Added => 'A',
            StatusKind::Modified => 'M',
            StatusKind::Deleted => 'D',
            StatusKind::Renamed => 'R',
            StatusKind::TypeChange => 'T',
            StatusKind::Untracked => '?',
            StatusKind::Conflicted => 'U',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Added => "new file",
            StatusKind::Modified => "modified",
            StatusKind::Deleted => "deleted",
            StatusKind::Renamed => "renamed",
            StatusKind::TypeChange => "typechange",
            StatusKind::Untracked => "untracked",
            StatusKind::Conflicted => "conflicted",
        }
    }
}

/// One path in the working-tree status.
///
/// A path with changes in both the index and the working tree is reported
/// once, with `staged == false` and `partial == true`; `kind` then
/// describes the index side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    /// Source path of a rename.
    pub old_path: Option<String>,
    pub kind: StatusKind,
    pub staged: bool,
    pub partial: bool,
}

impl StatusEntry {
    pub fn is_untracked(&self) -> bool {
        self.kind == StatusKind::Untracked
    }
}

/// Where HEAD is and how it relates to its upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadSummary {
    /// Short branch name; `None` for a detached HEAD.
    pub branch: Option<String>,
    /// Short hash HEAD points at, if it points anywhere yet.
    pub target: Option<String>,
    pub upstream: Option<String>,
    pub ahead: usize,
    pub behind: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub parent: Option<String>,
    pub author: String,
    pub email: String,
    pub when: DateTime<Utc>,
    pub summary: String,
}

impl Commit {
    pub fn short_hash(&self) -> &str {
        short(&self.hash)
    }
}

/// A file changed by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffDelta {
    /// The commit the change belongs to.
    pub commit: String,
    pub path: String,
    pub old_path: Option<String>,
    pub kind: StatusKind,
}

/// Flat record of a local branch's upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRef {
    pub name: String,
    pub hash: String,
    pub ahead: usize,
    pub behind: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub full_name: String,
    pub target: String,
    pub is_remote: bool,
    pub is_head: bool,
    pub upstream: Option<UpstreamRef>,
    /// Commit time of the branch tip.
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// Commit the tag peels to.
    pub target: String,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
    Head,
    Local,
    Remote,
    Tag,
}

/// A ref label attached to a commit in the log view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefLabel {
    pub kind: RefKind,
    pub name: String,
}

pub fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
