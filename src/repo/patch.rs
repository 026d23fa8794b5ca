//! Patches of single status entries, and applying edited ones to the index.

use git2::{ApplyLocation, Diff, DiffFormat, DiffOptions};

use super::types::StatusEntry;
use super::Repository;
use crate::error::Result;

impl Repository {
    /// Unified diff of `entry`: HEAD against the index when it is staged,
    /// the index against the working tree otherwise.
    pub fn file_patch(&self, entry: &StatusEntry) -> Result<String> {
        let mut opts = DiffOptions::new();
        opts.pathspec(entry.path.as_str());
        if let Some(old) = &entry.old_path {
            opts.pathspec(old.as_str());
        }

        let diff = if entry.staged {
            let head_tree = match self.head_commit()? {
                Some(head) => Some(head.tree()?),
                None => None,
            };
            let mut diff = self
                .repo
                .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?;
            diff.find_similar(None)?;
            diff
        } else {
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .show_untracked_content(true);
            self.repo.diff_index_to_workdir(None, Some(&mut opts))?
        };

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                text.push(line.origin());
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(text)
    }

    /// Applies `text` to the index, inverted first when `reverse` is set.
    /// Blank text is a no-op.
    pub fn apply_patch(&self, entry: &StatusEntry, text: &str, reverse: bool) -> Result<()> {
        if text.trim().is_empty() {
            log::debug!("empty patch for {}, nothing to apply", entry.path);
            return Ok(());
        }
        let text = if reverse {
            reverse_patch(text)
        } else {
            text.to_string()
        };
        let diff = Diff::from_buffer(text.as_bytes())?;
        self.repo.apply(&diff, ApplyLocation::Index, None)?;
        log::debug!(
            "applied {}patch to {}",
            if reverse { "reversed " } else { "" },
            entry.path
        );
        Ok(())
    }
}

/// Inverts a unified git diff so that applying it undoes the original.
pub fn reverse_patch(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut old_path: Option<String> = None;
    // Lines left in the current hunk, old side and new side.
    let mut remaining = (0usize, 0usize);

    for raw in text.split_inclusive('\n') {
        let (line, eol) = match raw.strip_suffix('\n') {
            Some(line) => (line, "\n"),
            None => (raw, ""),
        };

        if remaining != (0, 0) {
            let flipped = match line.as_bytes().first() {
                Some(b'+') => {
                    remaining.1 = remaining.1.saturating_sub(1);
                    format!("-{}", &line[1..])
                }
                Some(b'-') => {
                    remaining.0 = remaining.0.saturating_sub(1);
                    format!("+{}", &line[1..])
                }
                Some(b'\\') => line.to_string(),
                _ => {
                    remaining.0 = remaining.0.saturating_sub(1);
                    remaining.1 = remaining.1.saturating_sub(1);
                    line.to_string()
                }
            };
            out.push_str(&flipped);
            out.push_str(eol);
            continue;
        }

        let replaced = if let Some(rest) = line.strip_prefix("diff --git ") {
            match split_git_paths(rest) {
                Some((a, b)) => format!("diff --git a/{b} b/{a}"),
                None => line.to_string(),
            }
        } else if let Some(rest) = line.strip_prefix("index ") {
            reverse_index_line(rest).unwrap_or_else(|| line.to_string())
        } else if let Some(mode) = line.strip_prefix("new file mode ") {
            format!("deleted file mode {mode}")
        } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
            format!("new file mode {mode}")
        } else if let Some(mode) = line.strip_prefix("old mode ") {
            format!("new mode {mode}")
        } else if let Some(mode) = line.strip_prefix("new mode ") {
            format!("old mode {mode}")
        } else if let Some(path) = line.strip_prefix("rename from ") {
            format!("rename to {path}")
        } else if let Some(path) = line.strip_prefix("rename to ") {
            format!("rename from {path}")
        } else if let Some(path) = line.strip_prefix("--- ") {
            old_path = Some(path.to_string());
            continue;
        } else if let Some(new) = line.strip_prefix("+++ ") {
            let old = old_path.take().unwrap_or_else(|| "/dev/null".to_string());
            format!("--- {}\n+++ {}", swap_prefix(new, "a/"), swap_prefix(&old, "b/"))
        } else if let Some(rest) = line.strip_prefix("@@ ") {
            match reverse_hunk_header(rest) {
                Some((header, old_len, new_len)) => {
                    remaining = (old_len, new_len);
                    header
                }
                None => line.to_string(),
            }
        } else {
            line.to_string()
        };
        out.push_str(&replaced);
        out.push_str(eol);
    }
    out
}

/// `a/x b/y` to (`x`, `y`).
fn split_git_paths(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.strip_prefix("a/")?;
    let (a, b) = rest.split_once(" b/")?;
    Some((a, b))
}

fn reverse_index_line(rest: &str) -> Option<String> {
    let (range, mode) = match rest.split_once(' ') {
        Some((range, mode)) => (range, Some(mode)),
        None => (rest, None),
    };
    let (from, to) = range.split_once("..")?;
    Some(match mode {
        Some(mode) => format!("index {to}..{from} {mode}"),
        None => format!("index {to}..{from}"),
    })
}

/// Moves a path from one side of the diff to the other.
fn swap_prefix(path: &str, prefix: &str) -> String {
    if path == "/dev/null" {
        return path.to_string();
    }
    let bare = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    format!("{prefix}{bare}")
}

/// `-a,b +c,d @@ tail` to `@@ -c,d +a,b @@ tail` plus both lengths.
fn reverse_hunk_header(rest: &str) -> Option<(String, usize, usize)> {
    let (ranges, tail) = rest.split_once(" @@")?;
    let (old, new) = ranges.split_once(' ')?;
    let old = old.strip_prefix('-')?;
    let new = new.strip_prefix('+')?;
    let old_len = range_len(old)?;
    let new_len = range_len(new)?;
    Some((format!("@@ -{new} +{old} @@{tail}"), old_len, new_len))
}

fn range_len(range: &str) -> Option<usize> {
    match range.split_once(',') {
        Some((_, len)) => len.parse().ok(),
        None => range.parse::<usize>().ok().map(|_| 1),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use super::*;

    const MODIFY: &str = "\
diff --git a/a.txt b/a.txt
index 5626abf..f719efd 100644
--- a/a.txt
+++ b/a.txt
@@ -1,2 +1,2 @@
 one
-two
+three
";

    #[test]
    fn test_reverse_modification() {
        let expected = "\
diff --git a/a.txt b/a.txt
index f719efd..5626abf 100644
--- a/a.txt
+++ b/a.txt
@@ -1,2 +1,2 @@
 one
+two
-three
";
        assert_eq!(reverse_patch(MODIFY), expected);
        assert_eq!(reverse_patch(&reverse_patch(MODIFY)), MODIFY);
    }

    #[test]
    fn test_reverse_new_file() {
        let patch = "\
diff --git a/n.txt b/n.txt
new file mode 100644
index 0000000..3b18e51
--- /dev/null
+++ b/n.txt
@@ -0,0 +1 @@
+hello world
";
        let reversed = reverse_patch(patch);
        assert!(reversed.contains("deleted file mode 100644\n"));
        assert!(reversed.contains("index 3b18e51..0000000\n"));
        assert!(reversed.contains("--- a/n.txt\n+++ /dev/null\n"));
        assert!(reversed.contains("@@ -1 +0,0 @@\n-hello world\n"));
    }

    #[test]
    fn test_reverse_keeps_deleted_lines_that_look_like_headers() {
        let patch = "\
diff --git a/m.md b/m.md
index 1111111..2222222 100644
--- a/m.md
+++ b/m.md
@@ -1,2 +1,1 @@
 keep
--- a/rule
";
        let reversed = reverse_patch(patch);
        assert!(reversed.ends_with("@@ -1,1 +1,2 @@\n keep\n+-- a/rule\n"));
    }

    #[test]
    fn test_reverse_rename_and_hunk_tail() {
        let patch = "\
diff --git a/old.rs b/new.rs
similarity index 90%
rename from old.rs
rename to new.rs
--- a/old.rs
+++ b/new.rs
@@ -3,4 +3,5 @@ fn main() {
";
        let reversed = reverse_patch(patch);
        assert!(reversed.starts_with("diff --git a/new.rs b/old.rs\n"));
        assert!(reversed.contains("rename to old.rs\n"));
        assert!(reversed.contains("rename from new.rs\n"));
        assert!(reversed.contains("--- a/new.rs\n+++ b/old.rs\n"));
        assert!(reversed.contains("@@ -3,5 +3,4 @@ fn main() {\n"));
    }

    fn only_entry(repo: &Repository) -> StatusEntry {
        let mut entries = repo.status().unwrap();
        assert_eq!(entries.len(), 1);
        entries.remove(0)
    }

    #[test]
    fn test_apply_unstaged_patch_stages_it() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "hello\nworld\n");
        let repo = Repository::discover(&path).unwrap();

        let entry = only_entry(&repo);
        let patch = repo.file_patch(&entry).unwrap();
        assert!(patch.contains("+world\n"));
        repo.apply_patch(&entry, &patch, false).unwrap();
        assert!(only_entry(&repo).staged);
    }

    #[test]
    fn test_apply_reversed_staged_patch_unstages_it() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "hello\nagain\n");
        let repo = Repository::discover(&path).unwrap();
        repo.add_path("README").unwrap();

        let entry = only_entry(&repo);
        assert!(entry.staged);
        let patch = repo.file_patch(&entry).unwrap();
        assert!(patch.starts_with("diff --git a/README b/README\n"));
        repo.apply_patch(&entry, &patch, true).unwrap();

        let after = only_entry(&repo);
        assert!(!after.staged);
        assert!(!after.partial);
    }

    #[test]
    fn test_blank_patch_is_a_no_op() {
        let (_tmp, path) = create_temp_repo();
        write(&path, "README", "changed\n");
        let repo = Repository::discover(&path).unwrap();
        let entry = only_entry(&repo);
        repo.apply_patch(&entry, "  \n", false).unwrap();
        assert!(!only_entry(&repo).staged);
    }
}
