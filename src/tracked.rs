use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::format::line::ID_MARKER;

static TASK_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*[-*+] \[.\] .*{ID_MARKER} ([A-Za-z0-9_-]+)\s*$"))
        .expect("invalid task id regex")
});

/// Source of the IDs already present as tasks, queried fresh on every formatting run.
pub trait TrackedIds {
    fn tracked_ids(&self) -> Result<HashSet<String>>;
}

impl TrackedIds for HashSet<String> {
    fn tracked_ids(&self) -> Result<HashSet<String>> {
        Ok(self.clone())
    }
}

/// Collects task IDs from every Markdown file below a directory.
pub struct VaultScanner {
    root: PathBuf,
}

impl VaultScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

impl TrackedIds for VaultScanner {
    fn tracked_ids(&self) -> Result<HashSet<String>> {
        let mut ids = HashSet::new();
        let walker = WalkDir::new(&self.root).into_iter().filter_entry(|e| !is_hidden(e));
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to scan {}", self.root.display()))?;
            let is_markdown = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "md");
            if !is_markdown {
                continue;
            }
            // Notes are not always UTF-8; invalid bytes never sit inside an ID.
            let bytes = std::fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            let contents = String::from_utf8_lossy(&bytes);
            ids.extend(task_ids(&contents).map(String::from));
        }
        debug!(root = %self.root.display(), count = ids.len(), "collected tracked task ids");
        Ok(ids)
    }
}

/// IDs of the task lines in a Markdown text.
pub fn task_ids(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .filter_map(|line| TASK_ID.captures(line))
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_task_lines_count() {
        let text = "\
# Notes
- [ ] Fix bug 🆔 ABC-1
- [x] Done thing ➕ 2024-01-01 🆔 ABC-2
  * [d] nested 🆔 ABC-3
Plain paragraph 🆔 ABC-4
- list item 🆔 ABC-5
";
        let ids: Vec<_> = task_ids(text).collect();
        assert_eq!(ids, vec!["ABC-1", "ABC-2", "ABC-3"]);
    }

    #[test]
    fn scanner_walks_markdown_and_skips_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("projects/deep")).unwrap();
        std::fs::create_dir_all(root.join(".trash")).unwrap();
        std::fs::write(root.join("inbox.md"), "- [ ] one 🆔 ABC-1\n").unwrap();
        std::fs::write(root.join("projects/deep/plan.md"), "- [x] two 🆔 ABC-2\n").unwrap();
        std::fs::write(root.join("projects/notes.txt"), "- [ ] txt 🆔 ABC-3\n").unwrap();
        std::fs::write(root.join(".trash/old.md"), "- [ ] gone 🆔 ABC-4\n").unwrap();

        let ids = VaultScanner::new(root).tracked_ids().unwrap();
        let expected: HashSet<String> = ["ABC-1", "ABC-2"].map(String::from).into();
        assert_eq!(ids, expected);
    }

    #[test]
    fn non_utf8_note_does_not_hide_other_ids() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("ok.md"), "- [ ] one 🆔 ABC-1\n").unwrap();
        std::fs::write(root.join("latin1.md"), b"caf\xe9\n- [ ] two \xf0\x9f\x86\x94 ABC-2\n").unwrap();

        let ids = VaultScanner::new(root).tracked_ids().unwrap();
        let expected: HashSet<String> = ["ABC-1", "ABC-2"].map(String::from).into();
        assert_eq!(ids, expected);
    }

    #[test]
    fn set_provider_returns_itself() {
        let set: HashSet<String> = ["ABC-9".to_string()].into();
        assert_eq!(set.tracked_ids().unwrap(), set);
    }
}
