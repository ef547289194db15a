use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// A Markdown file edited line by line.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    lines: Vec<String>,
    line_ending: &'static str,
    trailing_newline: bool,
}

/// Zero-based line and character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: usize,
    pub ch: usize,
}

impl Document {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_text(path, &contents))
    }

    fn from_text(path: PathBuf, contents: &str) -> Self {
        let line_ending = if contents.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = contents.ends_with('\n');
        let mut lines: Vec<String> = contents.lines().map(String::from).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            path,
            lines,
            line_ending,
            trailing_newline,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Replace line `index` with `text`, which may span several lines.
    pub fn set_line(&mut self, index: usize, text: &str) -> Result<()> {
        if index >= self.lines.len() {
            bail!(
                "Line {} is past the end of {} ({} lines)",
                index + 1,
                self.path.display(),
                self.lines.len()
            );
        }
        self.lines
            .splice(index..=index, text.split('\n').map(String::from));
        Ok(())
    }

    /// Flip the checkbox of line `index` the way a click does: `[ ]` becomes `[x]`,
    /// any other symbol becomes `[ ]`. Returns the new line text.
    pub fn toggle_checkbox(&mut self, index: usize) -> Result<String> {
        let Some(line) = self.lines.get_mut(index) else {
            bail!("Line {} does not exist in {}", index + 1, self.path.display());
        };
        let Some(toggled) = toggled_checkbox(line) else {
            bail!("Line {} is not a task: {line}", index + 1);
        };
        *line = toggled;
        Ok(line.clone())
    }

    pub fn text(&self) -> String {
        let mut text = self.lines.join(self.line_ending);
        if self.trailing_newline {
            text.push_str(self.line_ending);
        }
        text
    }

    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.text())
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

fn toggled_checkbox(line: &str) -> Option<String> {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    let mut chars = rest.char_indices();
    let bullet = chars.next().map(|(_, c)| c)?;
    if !matches!(bullet, '-' | '*' | '+') || !rest[1..].starts_with(" [") {
        return None;
    }
    // "- [" is three bytes, the symbol follows.
    let symbol = rest[3..].chars().next()?;
    let after = 3 + symbol.len_utf8();
    if !rest[after..].starts_with(']') {
        return None;
    }
    let next = if symbol == ' ' { 'x' } else { ' ' };
    Some(format!("{}{bullet} [{next}{}", &line[..indent], &rest[after..]))
}

/// Cursor position after inserting `text` at `start`: on the `move_to` line of the
/// inserted block at column `move_to.ch`, clamped to that line's length.
pub fn new_cursor_position(start: CursorPosition, text: &str, move_to: CursorPosition) -> CursorPosition {
    let destination_len = text
        .split('\n')
        .nth(move_to.line)
        .map(|l| l.chars().count())
        .unwrap_or(0);
    CursorPosition {
        line: start.line + move_to.line,
        ch: move_to.ch.min(destination_len),
    }
}
