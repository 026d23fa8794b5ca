//! Branches and tags: checkout, delete, and switching between the two.

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};

use super::{relative_time, Entry, EntryDelegate};
use crate::error::Result;
use crate::key::Binding;
use crate::list::List;
use crate::prompt::{Context, Outcome, View};
use crate::repo::{short, Branch, Repository, Tag};
use crate::style::Theme;

pub struct BranchView {
    repo: Repository,
    delegate: EntryDelegate,
    showing_tags: bool,
    delete: Binding,
    force_delete: Binding,
    toggle_tags: Binding,
}

impl BranchView {
    pub fn new(repo: Repository, theme: Theme) -> Self {
        Self {
            repo,
            delegate: EntryDelegate::new(theme),
            showing_tags: false,
            delete: Binding::new(vec![KeyCode::Char('d').into()]).with_help("d", "delete"),
            force_delete: Binding::new(vec![KeyCode::Char('D').into()]).with_help("D", "force delete"),
            toggle_tags: Binding::new(vec![KeyCode::Char('t').into()]).with_help("t", "tags"),
        }
    }

    pub fn initial_list(&self, size: usize) -> Result<List<Entry>> {
        Ok(List::new(self.entries()?, size))
    }

    fn entries(&self) -> Result<Vec<Entry>> {
        if self.showing_tags {
            Ok(self.repo.tags()?.into_iter().map(Entry::Tag).collect())
        } else {
            Ok(self.repo.branches()?.into_iter().map(Entry::Branch).collect())
        }
    }

    fn reload(&self, list: &mut List<Entry>) {
        match self.entries() {
            Ok(entries) => list.replace_items(entries),
            Err(err) => log::warn!("could not reload refs: {err}"),
        }
    }

    fn delete_selected(&self, list: &mut List<Entry>, force: bool) {
        let Some(Entry::Branch(branch)) = list.selected() else {
            return;
        };
        if branch.is_remote {
            log::info!("not deleting remote-tracking branch {}", branch.name);
            return;
        }
        match self.repo.delete_branch(&branch.name, force) {
            Ok(()) => self.reload(list),
            Err(err) => log::warn!("{err}"),
        }
    }

    /// Name handed to `git checkout`. A remote-tracking branch is checked
    /// out by its short name so git creates the local tracking branch.
    fn checkout_name(branch: &Branch) -> &str {
        if branch.is_remote {
            if let Some((_, name)) = branch.name.split_once('/') {
                return name;
            }
        }
        &branch.name
    }

    fn updated(&self, when: Option<chrono::DateTime<Utc>>) -> String {
        let t = &self.delegate.theme;
        match when {
            Some(when) => t.date.render(&relative_time(when, Utc::now())),
            None => t.faint.render("unknown"),
        }
    }

    fn branch_info(&self, b: &Branch) -> Vec<String> {
        let mut lines = vec![self.delegate.info("updated", &self.updated(b.updated))];
        if b.is_remote {
            lines.push(self.delegate.info("remote", &b.full_name));
        } else if let Some(up) = &b.upstream {
            let distance = match self.delegate.distance(up.ahead, up.behind) {
                d if d.is_empty() => self.delegate.theme.faint.render("up to date"),
                d => d,
            };
            lines.push(self.delegate.info("upstream", &format!("{} {distance}", up.name)));
        }
        lines
    }

    fn tag_info(&self, tag: &Tag) -> Vec<String> {
        vec![
            self.delegate.info("updated", &self.updated(tag.updated)),
            self.delegate.info("commit", &self.delegate.theme.hash.render(short(&tag.target))),
        ]
    }
}

impl View for BranchView {
    type Item = Entry;

    fn search_label(&self) -> String {
        if self.showing_tags {
            "Tags:".to_string()
        } else {
            "Branches:".to_string()
        }
    }

    fn controls(&self) -> Vec<Binding> {
        vec![
            self.delete.clone(),
            self.force_delete.clone(),
            self.toggle_tags.clone(),
        ]
    }

    fn render_item(&self, item: &Entry, positions: &[usize], selected: bool) -> String {
        self.delegate.render(item, positions, selected)
    }

    fn render_info(&self, item: Option<&Entry>) -> Vec<String> {
        match item {
            Some(Entry::Branch(b)) => self.branch_info(b),
            Some(Entry::Tag(t)) => self.tag_info(t),
            _ => Vec::new(),
        }
    }

    fn render_empty(&self) -> Vec<String> {
        if self.showing_tags {
            vec!["No tags".to_string()]
        } else {
            vec!["No branches yet".to_string()]
        }
    }

    fn on_key(&mut self, key: &KeyEvent, cx: &mut Context<'_, Entry>) -> Outcome<Entry> {
        if self.delete.matches(key) {
            self.delete_selected(cx.list, false);
        } else if self.force_delete.matches(key) {
            self.delete_selected(cx.list, true);
        } else if self.toggle_tags.matches(key) {
            self.showing_tags = !self.showing_tags;
            self.reload(cx.list);
            cx.list.home();
        }
        Outcome::Continue
    }

    /// Checks out the selection; the prompt closes on success and stays put
    /// when git refuses, e.g. because local changes would be overwritten.
    fn on_select(&mut self, item: Entry, cx: &mut Context<'_, Entry>) -> Outcome<Entry> {
        let name = match &item {
            Entry::Branch(b) => Self::checkout_name(b),
            Entry::Tag(t) => t.name.as_str(),
            _ => return Outcome::Continue,
        };
        match self.repo.checkout_branch(cx.spawner, name) {
            Ok(()) => Outcome::Stop,
            Err(err) => {
                log::warn!("checkout of {name} failed: {err}");
                Outcome::Continue
            }
        }
    }
}
