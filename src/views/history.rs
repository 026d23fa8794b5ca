//! Commit log, with a drill-down into the files each commit touched.

use std::collections::HashMap;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};

use super::{relative_time, Entry, EntryDelegate};
use crate::error::Result;
use crate::key::Binding;
use crate::list::List;
use crate::prompt::{Context, Outcome, View};
use crate::repo::{short, Commit, DiffDelta, RefKind, RefLabel, Repository};
use crate::style::Theme;

pub struct LogView {
    repo: Repository,
    delegate: EntryDelegate,
    refs: HashMap<String, Vec<RefLabel>>,
    /// The commit whose files are listed, while drilled in.
    opened: Option<Commit>,
    show: Binding,
    stat: Binding,
}

impl LogView {
    pub fn new(repo: Repository, theme: Theme) -> Result<Self> {
        let refs = repo.refs_by_commit_hash()?;
        Ok(Self {
            repo,
            delegate: EntryDelegate::new(theme),
            refs,
            opened: None,
            show: Binding::new(vec![KeyCode::Char('d').into()]).with_help("d", "show"),
            stat: Binding::new(vec![KeyCode::Char('s').into()]).with_help("s", "stat"),
        })
    }

    /// Commits stream in from a background walk.
    pub fn initial_list(&self, size: usize) -> Result<List<Entry>> {
        Ok(List::streaming(self.repo.stream_commits(Entry::Commit)?, size))
    }

    /// `(HEAD, main, origin/main, tag: v1)` with each ref in its colour.
    fn ref_labels(&self, hash: &str) -> Option<String> {
        let labels = self.refs.get(hash)?;
        let t = &self.delegate.theme;
        let names: Vec<String> = labels
            .iter()
            .map(|label| match label.kind {
                RefKind::Head => t.head_ref.render(&label.name),
                RefKind::Local => t.local_ref.render(&label.name),
                RefKind::Remote => t.remote_ref.render(&label.name),
                RefKind::Tag => t.tag_ref.render(&format!("tag: {}", label.name)),
            })
            .collect();
        Some(format!("({})", names.join(", ")))
    }

    fn commit_info(&self, c: &Commit) -> Vec<String> {
        let mut first = self.delegate.theme.hash.render(c.short_hash());
        if let Some(refs) = self.ref_labels(&c.hash) {
            first.push(' ');
            first.push_str(&refs);
        }
        let date = self
            .delegate
            .theme
            .date
            .render(&relative_time(c.when, Utc::now()));
        vec![
            first,
            self.delegate.info("author", &format!("{} <{}>", c.author, c.email)),
            self.delegate.info("date", &date),
        ]
    }

    fn delta_info(&self, d: &DiffDelta) -> Vec<String> {
        let mut lines = vec![self.delegate.info(d.kind.label(), &d.path)];
        if let Some(old) = &d.old_path {
            lines.push(self.delegate.info("from", old));
        }
        lines.push(self.delegate.info("commit", short(&d.commit)));
        lines
    }

    fn selected_hash(list: &List<Entry>) -> Option<String> {
        match list.selected()? {
            Entry::Commit(c) => Some(c.hash),
            Entry::Delta(d) => Some(d.commit),
            _ => None,
        }
    }
}

impl View for LogView {
    type Item = Entry;

    fn search_label(&self) -> String {
        match &self.opened {
            Some(commit) => format!("Files in {}:", commit.short_hash()),
            None => "Commits:".to_string(),
        }
    }

    fn controls(&self) -> Vec<Binding> {
        vec![self.show.clone(), self.stat.clone()]
    }

    fn render_item(&self, item: &Entry, positions: &[usize], selected: bool) -> String {
        self.delegate.render(item, positions, selected)
    }

    fn render_info(&self, item: Option<&Entry>) -> Vec<String> {
        match item {
            Some(Entry::Commit(c)) => self.commit_info(c),
            Some(Entry::Delta(d)) => self.delta_info(d),
            _ => Vec::new(),
        }
    }

    fn render_empty(&self) -> Vec<String> {
        match self.opened {
            Some(_) => vec!["No file changes".to_string()],
            None => vec!["No commits yet".to_string()],
        }
    }

    fn on_key(&mut self, key: &KeyEvent, cx: &mut Context<'_, Entry>) -> Outcome<Entry> {
        let Some(hash) = Self::selected_hash(cx.list) else {
            return Outcome::Continue;
        };
        let result = if self.show.matches(key) {
            self.repo.pop_external(cx.spawner, &["show", hash.as_str()])
        } else if self.stat.matches(key) {
            self.repo.pop_external(cx.spawner, &["show", "--stat", hash.as_str()])
        } else {
            return Outcome::Continue;
        };
        if let Err(err) = result {
            log::warn!("{err}");
        }
        Outcome::Continue
    }

    fn on_select(&mut self, item: Entry, cx: &mut Context<'_, Entry>) -> Outcome<Entry> {
        match item {
            Entry::Commit(commit) => match self.repo.diff_of(&commit) {
                Ok(deltas) => {
                    log::debug!("{} touches {} files", commit.short_hash(), deltas.len());
                    let files = deltas.into_iter().map(Entry::Delta).collect();
                    self.opened = Some(commit);
                    Outcome::Replace(List::new(files, cx.list.size()))
                }
                Err(err) => {
                    log::warn!("could not diff {}: {err}", commit.short_hash());
                    Outcome::Continue
                }
            },
            Entry::Delta(delta) => {
                let mut args = vec!["show", delta.commit.as_str(), "--"];
                if let Some(old) = &delta.old_path {
                    args.push(old);
                }
                args.push(&delta.path);
                if let Err(err) = self.repo.pop_external(cx.spawner, &args) {
                    log::warn!("{err}");
                }
                Outcome::Continue
            }
            _ => Outcome::Continue,
        }
    }

    fn on_back(&mut self) {
        self.opened = None;
    }
}
