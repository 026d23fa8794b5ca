//! The three screens: working-tree status, commit log and branches.
//!
//! Every view lists [`Entry`] values, so a view can drill into a derived
//! list of a different record kind (commits into their changed files,
//! branches into tags) without changing the prompt's item type. Rows are
//! drawn by an [`EntryDelegate`] built from the [`Theme`].

mod branch;
mod history;
mod status;

pub use branch::BranchView;
pub use history::LogView;
pub use status::{HunkEditor, PatchFileEditor, StatusView};

use chrono::{DateTime, Utc};

use crate::config::{Config, ViewKind};
use crate::error::Result;
use crate::list::Item;
use crate::prompt::Prompt;
use crate::repo::{Branch, Commit, DiffDelta, Repository, StatusEntry, StatusKind, Tag};
use crate::style::{highlight, Theme};

/// Anything a view can list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Status(StatusEntry),
    Commit(Commit),
    Delta(DiffDelta),
    Branch(Branch),
    Tag(Tag),
}

impl Item for Entry {
    fn filter_value(&self) -> String {
        match self {
            Entry::Status(e) => e.path.clone(),
            Entry::Commit(c) => c.summary.clone(),
            Entry::Delta(d) => d.path.clone(),
            Entry::Branch(b) => b.name.clone(),
            Entry::Tag(t) => t.name.clone(),
        }
    }

    fn fingerprint(&self) -> String {
        match self {
            Entry::Status(e) => e.path.clone(),
            Entry::Commit(c) => c.hash.clone(),
            Entry::Delta(d) => format!("{}:{}", d.commit, d.path),
            Entry::Branch(b) => b.full_name.clone(),
            Entry::Tag(t) => format!("refs/tags/{}", t.name),
        }
    }
}

/// Draws one row per entry kind. Match positions index into the entry's
/// `filter_value`, which is always the part drawn with `highlight`.
#[derive(Debug, Clone, Default)]
pub struct EntryDelegate {
    pub theme: Theme,
}

impl EntryDelegate {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn render(&self, entry: &Entry, positions: &[usize], selected: bool) -> String {
        let t = &self.theme;
        let text = if selected { &t.selected } else { &t.normal };
        match entry {
            Entry::Status(e) => {
                let path = highlight(&e.path, positions, text, &t.matched);
                format!("{} {path}{}", self.status_columns(e), self.renamed_from(&e.old_path))
            }
            Entry::Commit(c) => {
                let summary = highlight(&c.summary, positions, text, &t.matched);
                format!("{} {summary}", t.hash.render(c.short_hash()))
            }
            Entry::Delta(d) => {
                let code = self.kind_style(d.kind).render(&d.kind.code().to_string());
                let path = highlight(&d.path, positions, text, &t.matched);
                format!("{code} {path}{}", self.renamed_from(&d.old_path))
            }
            Entry::Branch(b) => {
                let marker = if b.is_head { t.head_ref.render("*") } else { " ".to_string() };
                let base = if b.is_remote { &t.remote_ref } else { &t.local_ref };
                format!("{marker} {}", highlight(&b.name, positions, base, &t.matched))
            }
            Entry::Tag(tag) => highlight(&tag.name, positions, &t.tag_ref, &t.matched),
        }
    }

    /// Two columns like `git status --short`: index side, then worktree.
    fn status_columns(&self, e: &StatusEntry) -> String {
        let t = &self.theme;
        let code = e.kind.code().to_string();
        match e.kind {
            StatusKind::Conflicted => t.conflicted.render("UU"),
            StatusKind::Untracked => t.untracked.render("??"),
            _ if e.staged => format!("{} ", t.staged.render(&code)),
            _ if e.partial => format!("{}{}", t.staged.render(&code), t.unstaged.render("M")),
            _ => format!(" {}", t.unstaged.render(&code)),
        }
    }

    fn kind_style(&self, kind: StatusKind) -> &lipgloss_extras::prelude::Style {
        match kind {
            StatusKind::Added => &self.theme.staged,
            StatusKind::Deleted => &self.theme.unstaged,
            StatusKind::Conflicted => &self.theme.conflicted,
            _ => &self.theme.hash,
        }
    }

    fn renamed_from(&self, old: &Option<String>) -> String {
        match old {
            Some(old) => self.theme.faint.render(&format!(" ← {old}")),
            None => String::new(),
        }
    }

    /// `key value` line for the info pane.
    pub fn info(&self, key: &str, value: &str) -> String {
        format!("{} {}", self.theme.info_key.render(key), value)
    }

    /// `↑a ↓b`, each side only when non-zero.
    pub fn distance(&self, ahead: usize, behind: usize) -> String {
        let mut parts = Vec::new();
        if ahead > 0 {
            parts.push(self.theme.ahead.render(&format!("↑{ahead}")));
        }
        if behind > 0 {
            parts.push(self.theme.behind.render(&format!("↓{behind}")));
        }
        parts.join(" ")
    }
}

/// Human distance between `when` and `now`, e.g. `3 days ago`.
pub fn relative_time(when: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - when).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let (n, unit) = match secs {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 7 * 86_400 => (s / 86_400, "day"),
        s if s < 30 * 86_400 => (s / (7 * 86_400), "week"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Opens the configured view on `repo` and runs it until the user quits.
pub fn run(repo: Repository, config: &Config) -> Result<()> {
    let theme = Theme::default();
    let size = config.height;
    log::info!("starting {:?} view in {}", config.view, repo.workdir().display());
    match config.view {
        ViewKind::Status => {
            let view = StatusView::new(repo, theme.clone())?;
            let list = view.initial_list(size)?;
            Prompt::new(view, list, config).with_theme(theme).run()
        }
        ViewKind::Log => {
            let view = LogView::new(repo, theme.clone())?;
            let list = view.initial_list(size)?;
            Prompt::new(view, list, config).with_theme(theme).run()
        }
        ViewKind::Branch => {
            let view = BranchView::new(repo, theme.clone());
            let list = view.initial_list(size)?;
            Prompt::new(view, list, config).with_theme(theme).run()
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    pub fn chr(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    pub fn plain(s: &str) -> String {
        strip_ansi_escapes::strip_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::plain;
    use super::*;
    use chrono::Duration;

    fn status(path: &str, kind: StatusKind, staged: bool, partial: bool) -> Entry {
        Entry::Status(StatusEntry {
            path: path.to_string(),
            old_path: None,
            kind,
            staged,
            partial,
        })
    }

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(relative_time(now - Duration::days(3), now), "3 days ago");
        assert_eq!(relative_time(now - Duration::days(15), now), "2 weeks ago");
        assert_eq!(relative_time(now - Duration::days(95), now), "3 months ago");
        assert_eq!(relative_time(now - Duration::days(800), now), "2 years ago");
        assert_eq!(relative_time(now + Duration::hours(1), now), "just now");
    }

    #[test]
    fn test_status_fingerprint_ignores_stage_state() {
        let before = status("a.txt", StatusKind::Modified, false, false);
        let after = status("a.txt", StatusKind::Modified, true, false);
        assert_ne!(before, after);
        assert_eq!(before.fingerprint(), after.fingerprint());
        assert_eq!(before.filter_value(), "a.txt");
    }

    #[test]
    fn test_status_columns() {
        let d = EntryDelegate::default();
        let row = |e: &Entry| plain(&d.render(e, &[], false));
        assert_eq!(row(&status("a", StatusKind::Modified, false, false)), " M a");
        assert_eq!(row(&status("a", StatusKind::Modified, true, false)), "M  a");
        assert_eq!(row(&status("a", StatusKind::Added, false, true)), "AM a");
        assert_eq!(row(&status("a", StatusKind::Untracked, false, false)), "?? a");
        assert_eq!(row(&status("a", StatusKind::Conflicted, false, false)), "UU a");
    }

    #[test]
    fn test_commit_row_highlights_summary() {
        let d = EntryDelegate::default();
        let commit = Entry::Commit(Commit {
            hash: "0123456789abcdef".to_string(),
            parent: None,
            author: "A".to_string(),
            email: "a@example.com".to_string(),
            when: Utc::now(),
            summary: "fix leak".to_string(),
        });
        assert_eq!(commit.filter_value(), "fix leak");
        assert_eq!(plain(&d.render(&commit, &[0, 4], true)), "0123456 fix leak");
    }

    #[test]
    fn test_branch_row_marks_head() {
        let d = EntryDelegate::default();
        let branch = Entry::Branch(Branch {
            name: "main".to_string(),
            full_name: "refs/heads/main".to_string(),
            target: "abc".to_string(),
            is_remote: false,
            is_head: true,
            upstream: None,
            updated: None,
        });
        assert_eq!(plain(&d.render(&branch, &[], false)), "* main");
        assert_eq!(branch.fingerprint(), "refs/heads/main");
    }

    #[test]
    fn test_distance() {
        let d = EntryDelegate::default();
        assert_eq!(plain(&d.distance(2, 0)), "↑2");
        assert_eq!(plain(&d.distance(1, 3)), "↑1 ↓3");
        assert_eq!(d.distance(0, 0), "");
    }
}
