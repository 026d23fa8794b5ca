//! Working-tree status: stage, unstage, patch, commit and discard.

use std::env;
use std::fs;
use std::process::Command;

use crossterm::event::{KeyCode, KeyEvent};

use super::{Entry, EntryDelegate};
use crate::error::{Error, Result};
use crate::key::Binding;
use crate::list::List;
use crate::prompt::{Context, Outcome, Spawn, View};
use crate::repo::{HeadSummary, Repository, StatusEntry, StatusKind};
use crate::style::Theme;

/// Interactive editing of an entry's patch before it is applied to the
/// index.
pub trait HunkEditor {
    /// Returns the edited patch, or `None` when there is nothing to apply.
    fn edit(
        &mut self,
        repo: &Repository,
        spawner: &mut dyn Spawn,
        entry: &StatusEntry,
    ) -> Result<Option<String>>;
}

/// Writes the patch to `.git/ADD_EDIT.patch` and opens it in the user's
/// editor (`$VISUAL`, `$EDITOR`, then `vi`).
#[derive(Debug, Default)]
pub struct PatchFileEditor {
    command: Option<String>,
}

impl PatchFileEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `command` instead of the environment; it may carry arguments.
    pub fn with_command(command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
        }
    }

    fn command(&self) -> String {
        self.command
            .clone()
            .or_else(|| {
                ["VISUAL", "EDITOR"]
                    .iter()
                    .find_map(|var| env::var(var).ok().filter(|v| !v.trim().is_empty()))
            })
            .unwrap_or_else(|| "vi".to_string())
    }
}

impl HunkEditor for PatchFileEditor {
    fn edit(
        &mut self,
        repo: &Repository,
        spawner: &mut dyn Spawn,
        entry: &StatusEntry,
    ) -> Result<Option<String>> {
        let patch = repo.file_patch(entry)?;
        if patch.is_empty() {
            return Ok(None);
        }
        let file = repo.git_dir().join("ADD_EDIT.patch");
        fs::write(&file, &patch)?;

        let command = self.command();
        let mut words = command.split_whitespace();
        let program = words.next().unwrap_or("vi");
        let mut cmd = Command::new(program);
        cmd.args(words).arg(&file).current_dir(repo.workdir());
        log::debug!("editing patch of {} with {command}", entry.path);

        let edited = match spawner.spawn(&mut cmd) {
            Ok(status) if status.success() => fs::read_to_string(&file).map_err(Error::from),
            Ok(status) => Err(Error::Command {
                program: program.to_string(),
                args: file.display().to_string(),
                status,
            }),
            Err(source) => Err(Error::Spawn {
                program: program.to_string(),
                args: file.display().to_string(),
                source,
            }),
        };
        if let Err(err) = fs::remove_file(&file) {
            log::debug!("could not remove {}: {err}", file.display());
        }
        edited.map(Some)
    }
}

#[derive(Debug, Clone)]
struct StatusKeyMap {
    toggle: Binding,
    stage_all: Binding,
    reset_all: Binding,
    patch: Binding,
    commit: Binding,
    amend: Binding,
    discard: Binding,
}

impl Default for StatusKeyMap {
    fn default() -> Self {
        Self {
            toggle: Binding::new(vec![KeyCode::Char(' ').into()]).with_help("space", "stage"),
            stage_all: Binding::new(vec![KeyCode::Char('a').into()]).with_help("a", "stage all"),
            reset_all: Binding::new(vec![KeyCode::Char('r').into()]).with_help("r", "reset all"),
            patch: Binding::new(vec![KeyCode::Char('p').into()]).with_help("p", "patch"),
            commit: Binding::new(vec![KeyCode::Char('c').into()]).with_help("c", "commit"),
            amend: Binding::new(vec![KeyCode::Char('m').into()]).with_help("m", "amend"),
            discard: Binding::new(vec![KeyCode::Char('!').into()]).with_help("!", "discard"),
        }
    }
}

pub struct StatusView {
    repo: Repository,
    delegate: EntryDelegate,
    head: HeadSummary,
    editor: Box<dyn HunkEditor>,
    keys: StatusKeyMap,
}

impl StatusView {
    pub fn new(repo: Repository, theme: Theme) -> Result<Self> {
        let head = repo.head_summary()?;
        Ok(Self {
            repo,
            delegate: EntryDelegate::new(theme),
            head,
            editor: Box::new(PatchFileEditor::new()),
            keys: StatusKeyMap::default(),
        })
    }

    pub fn with_editor(mut self, editor: Box<dyn HunkEditor>) -> Self {
        self.editor = editor;
        self
    }

    pub fn initial_list(&self, size: usize) -> Result<List<Entry>> {
        Ok(List::new(self.entries()?, size))
    }

    fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self.repo.status()?.into_iter().map(Entry::Status).collect())
    }

    /// Re-reads status and HEAD after the index or HEAD changed.
    fn reload(&mut self, list: &mut List<Entry>) {
        match self.entries() {
            Ok(entries) => list.replace_items(entries),
            Err(err) => log::warn!("could not reload status: {err}"),
        }
        match self.repo.head_summary() {
            Ok(head) => self.head = head,
            Err(err) => log::warn!("could not read HEAD: {err}"),
        }
    }

    fn toggle(&self, entry: &StatusEntry) -> Result<()> {
        if entry.staged {
            return self.repo.reset_entry(entry);
        }
        if let Some(old) = &entry.old_path {
            self.repo.add_path(old)?;
        }
        self.repo.add_path(&entry.path)
    }

    fn edit_patch(&mut self, spawner: &mut dyn Spawn, entry: &StatusEntry) -> Result<()> {
        if entry.kind == StatusKind::Conflicted {
            log::info!("{} has conflicts, resolve them first", entry.path);
            return Ok(());
        }
        match self.editor.edit(&self.repo, spawner, entry)? {
            Some(text) => self.repo.apply_patch(entry, &text, entry.staged),
            None => Ok(()),
        }
    }

    fn commit(&self, spawner: &mut dyn Spawn, amend: bool) -> Result<()> {
        let args: &[&str] = if amend {
            &["commit", "--amend"]
        } else {
            &["commit"]
        };
        self.repo.pop_external(spawner, args)?;
        self.repo.pop_external(spawner, &["show", "--stat", "HEAD"])
    }

    fn upstream_line(&self) -> Option<String> {
        let upstream = self.head.upstream.as_ref()?;
        let commits = |n: usize| if n == 1 { "1 commit".to_string() } else { format!("{n} commits") };
        Some(match (self.head.ahead, self.head.behind) {
            (0, 0) => format!("Your branch is up to date with '{upstream}'."),
            (ahead, 0) => format!("Your branch is ahead of '{upstream}' by {}.", commits(ahead)),
            (0, behind) => format!("Your branch is behind '{upstream}' by {}.", commits(behind)),
            _ => format!("Your branch and '{upstream}' have diverged."),
        })
    }
}

impl View for StatusView {
    type Item = Entry;

    fn search_label(&self) -> String {
        match (&self.head.branch, &self.head.target) {
            (Some(branch), _) => {
                let mut label = format!("On {branch}");
                if self.head.ahead > 0 {
                    label.push_str(&format!(" ↑{}", self.head.ahead));
                }
                if self.head.behind > 0 {
                    label.push_str(&format!(" ↓{}", self.head.behind));
                }
                label.push(':');
                label
            }
            (None, Some(target)) => format!("HEAD detached at {target}:"),
            (None, None) => "Status:".to_string(),
        }
    }

    fn controls(&self) -> Vec<Binding> {
        let k = &self.keys;
        vec![
            k.toggle.clone(),
            k.patch.clone(),
            k.commit.clone(),
            k.discard.clone(),
            k.stage_all.clone(),
            k.reset_all.clone(),
            k.amend.clone(),
        ]
    }

    fn render_item(&self, item: &Entry, positions: &[usize], selected: bool) -> String {
        self.delegate.render(item, positions, selected)
    }

    fn render_info(&self, item: Option<&Entry>) -> Vec<String> {
        let Some(Entry::Status(entry)) = item else {
            return Vec::new();
        };
        let state = if entry.is_untracked() {
            "not tracked"
        } else if entry.staged {
            "staged"
        } else if entry.partial {
            "partially staged"
        } else {
            "not staged"
        };
        let mut lines = vec![self
            .delegate
            .info(entry.kind.label(), &format!("{} ({state})", entry.path))];
        if let Some(old) = &entry.old_path {
            lines.push(self.delegate.info("from", old));
        }
        lines
    }

    fn render_empty(&self) -> Vec<String> {
        let mut lines = vec![match (&self.head.branch, &self.head.target) {
            (Some(branch), _) => format!("On branch {branch}"),
            (None, Some(target)) => format!("HEAD detached at {target}"),
            (None, None) => "No commits yet".to_string(),
        }];
        lines.push("nothing to commit, working tree clean".to_string());
        lines.extend(self.upstream_line());
        lines
    }

    fn on_key(&mut self, key: &KeyEvent, cx: &mut Context<'_, Entry>) -> Outcome<Entry> {
        let selected = match cx.list.selected() {
            Some(Entry::Status(entry)) => Some(entry),
            _ => None,
        };
        let k = self.keys.clone();
        let result = if k.stage_all.matches(key) {
            self.repo.add_all()
        } else if k.reset_all.matches(key) {
            self.repo.reset_all()
        } else if k.commit.matches(key) {
            self.commit(cx.spawner, false)
        } else if k.amend.matches(key) {
            self.commit(cx.spawner, true)
        } else if let Some(entry) = selected {
            if k.toggle.matches(key) {
                self.toggle(&entry)
            } else if k.patch.matches(key) {
                self.edit_patch(cx.spawner, &entry)
            } else if k.discard.matches(key) {
                self.repo.discard_path(&entry)
            } else {
                return Outcome::Continue;
            }
        } else {
            return Outcome::Continue;
        };

        if let Err(err) = result {
            log::warn!("{err}");
        }
        self.reload(cx.list);
        Outcome::Continue
    }

    fn on_select(&mut self, item: Entry, cx: &mut Context<'_, Entry>) -> Outcome<Entry> {
        let Entry::Status(entry) = item else {
            return Outcome::Continue;
        };
        let args = Repository::entry_diff_args(&entry);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match self.repo.pop_external(cx.spawner, &args) {
            Ok(()) => {}
            // `diff --no-index` exits 1 whenever the files differ
            Err(Error::Command { .. }) if entry.is_untracked() => {}
            Err(err) => log::warn!("{err}"),
        }
        Outcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::Config;
    use crate::prompt::fake::Recorder;
    use crate::prompt::Prompt;
    use crate::repo::testutil::*;
    use crate::views::testutil::chr;
    use crossterm::event::KeyModifiers;

    fn open(path: &std::path::Path) -> (Prompt<StatusView>, Rc<RefCell<Recorder>>) {
        open_with(path, Recorder::default())
    }

    fn open_with(path: &std::path::Path, rec: Recorder) -> (Prompt<StatusView>, Rc<RefCell<Recorder>>) {
        let repo = Repository::discover(path).unwrap();
        let view = StatusView::new(repo, Theme::default()).unwrap();
        let list = view.initial_list(10).unwrap();
        let rec = Rc::new(RefCell::new(rec));
        let prompt = Prompt::new(view, list, &Config::default()).with_spawner(Box::new(Rc::clone(&rec)));
        (prompt, rec)
    }

    fn selected(p: &Prompt<StatusView>) -> StatusEntry {
        match p.list().selected() {
            Some(Entry::Status(entry)) => entry,
            other => panic!("unexpected selection {other:?}"),
        }
    }

    fn calls(rec: &Rc<RefCell<Recorder>>) -> Vec<Vec<String>> {
        rec.borrow().calls.clone()
    }

    #[test]
    fn test_space_toggles_stage_and_keeps_cursor() {
        let (_tmp, path) = create_temp_repo();
        commit_files(&path, &[("a.txt", "one\n")], "add a");
        write(&path, "a.txt", "two\n");
        write(&path, "0.txt", "zero\n");
        let (mut p, _rec) = open(&path);

        p.handle_key(chr('j'));
        let before = selected(&p);
        assert_eq!(before.path, "a.txt");
        assert_eq!((before.kind, before.staged), (StatusKind::Modified, false));

        p.handle_key(chr(' '));
        let after = selected(&p);
        assert_eq!(after.path, "a.txt");
        assert_eq!((after.kind, after.staged), (StatusKind::Modified, true));
        assert_eq!(p.list().cursor(), 1);

        p.handle_key(chr(' '));
        assert!(!selected(&p).staged);
    }

    #[test]
    fn test_stage_all_and_reset_all() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        write(&path, "b.txt", "b\n");
        let (mut p, _rec) = open(&path);

        p.handle_key(chr('a'));
        let staged = p.list().items();
        assert_eq!(staged.len(), 2);
        assert!(staged
            .iter()
            .all(|e| matches!(e, Entry::Status(s) if s.staged)));

        p.handle_key(chr('r'));
        assert!(p
            .list()
            .items()
            .iter()
            .all(|e| matches!(e, Entry::Status(s) if !s.staged)));
    }

    #[test]
    fn test_discard_empties_the_list() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        let (mut p, _rec) = open(&path);
        p.handle_key(chr('!'));
        assert!(p.list().is_empty());
        assert_eq!(std::fs::read_to_string(path.join("README")).unwrap(), "hello\n");
    }

    #[test]
    fn test_enter_pops_the_matching_diff() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        write(&path, "new.txt", "new\n");
        let (mut p, rec) = open_with(&path, Recorder::failing(1));

        p.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        p.handle_key(chr('j'));
        p.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(
            calls(&rec),
            [
                vec!["git", "diff", "--", "README"],
                vec!["git", "diff", "--no-index", "/dev/null", "new.txt"],
            ]
        );
        assert!(!p.should_stop());
    }

    #[test]
    fn test_commit_then_show_stat() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        let (mut p, rec) = open(&path);
        p.handle_key(chr('c'));
        p.handle_key(chr('m'));
        assert_eq!(
            calls(&rec),
            [
                vec!["git", "commit"],
                vec!["git", "show", "--stat", "HEAD"],
                vec!["git", "commit", "--amend"],
                vec!["git", "show", "--stat", "HEAD"],
            ]
        );
    }

    #[test]
    fn test_aborted_commit_skips_show() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        let (mut p, rec) = open_with(&path, Recorder::failing(1));
        p.handle_key(chr('c'));
        assert_eq!(calls(&rec), [vec!["git", "commit"]]);
    }

    #[test]
    fn test_patch_editor_applies_the_saved_file() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "hello\nworld\n");
        let repo = Repository::discover(&path).unwrap();
        let patch_file = repo.git_dir().join("ADD_EDIT.patch");
        let view = StatusView::new(repo, Theme::default())
            .unwrap()
            .with_editor(Box::new(PatchFileEditor::with_command("myedit --wait")));
        let list = view.initial_list(10).unwrap();
        let rec = Rc::new(RefCell::new(Recorder::default()));
        let mut p = Prompt::new(view, list, &Config::default()).with_spawner(Box::new(Rc::clone(&rec)));

        p.handle_key(chr('p'));
        let argv = calls(&rec).remove(0);
        assert_eq!(argv[..2], ["myedit", "--wait"]);
        assert_eq!(argv[2], patch_file.display().to_string());
        assert!(!patch_file.exists());
        assert!(selected(&p).staged);

        // a staged entry is un-applied with the reversed patch
        p.handle_key(chr('p'));
        let entry = selected(&p);
        assert!(!entry.staged && !entry.partial);
    }

    struct Declining;

    impl HunkEditor for Declining {
        fn edit(&mut self, _: &Repository, _: &mut dyn Spawn, _: &StatusEntry) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn test_declined_patch_changes_nothing() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        let repo = Repository::discover(&path).unwrap();
        let view = StatusView::new(repo, Theme::default())
            .unwrap()
            .with_editor(Box::new(Declining));
        let list = view.initial_list(10).unwrap();
        let mut p = Prompt::new(view, list, &Config::default()).with_spawner(Box::new(Recorder::default()));
        p.handle_key(chr('p'));
        assert!(!selected(&p).staged);
    }

    #[test]
    fn test_clean_tree_placeholder() {
        let (_tmp, path) = create_temp_repo();
        let repo = Repository::discover(&path).unwrap();
        let branch = repo.head_summary().unwrap().branch.unwrap();
        let view = StatusView::new(repo, Theme::default()).unwrap();

        assert_eq!(view.search_label(), format!("On {branch}:"));
        assert_eq!(
            view.render_empty(),
            [
                format!("On branch {branch}"),
                "nothing to commit, working tree clean".to_string(),
            ]
        );
        assert!(view.initial_list(10).unwrap().is_empty());
    }

    #[test]
    fn test_info_describes_selection() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        let (p, _rec) = open(&path);
        let entry = p.list().selected();
        let info: Vec<String> = p
            .view()
            .render_info(entry.as_ref())
            .iter()
            .map(|l| strip_ansi_escapes::strip_str(l))
            .collect();
        assert_eq!(info, ["modified README (not staged)"]);
    }

    #[test]
    fn test_control_characters_in_paths_render_as_one_row() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "a\rb.txt", "cr\n");
        write(&path, "c\nd.txt", "lf\n");
        let (mut p, _rec) = open(&path);
        p.handle_key(chr('j'));

        let mut w = crate::term::Writer::new(Vec::new());
        p.render(&mut w, 80).unwrap();
        // search line, ten rows, one info line, controls
        assert_eq!(w.height(), 13);
        let text = strip_ansi_escapes::strip_str(String::from_utf8(w.into_inner()).unwrap());
        assert!(text.contains("?? a?b.txt"));
        assert!(text.contains("?? c?d.txt"));
        assert!(text.contains("untracked c?d.txt"));
    }
}
