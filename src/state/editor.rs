//! Line buffer for the file editor overlay.

use rp_base::types::{FileContent, RemoteEntry};

pub struct Editor {
    pub repository: String,
    pub entry: RemoteEntry,
    /// None for binary files, which open read-only
    lines: Option<Vec<String>>,
    pub row: usize,
    pub col: usize,
    pub scroll: usize,
    pub modified: bool,
}

impl Editor {
    pub fn open(repository: String, entry: RemoteEntry, content: FileContent) -> Self {
        let lines = match content {
            FileContent::Text(text) => Some(text.split('\n').map(str::to_string).collect()),
            FileContent::Binary => None,
        };
        Self { repository, entry, lines, row: 0, col: 0, scroll: 0, modified: false }
    }

    pub fn is_read_only(&self) -> bool {
        self.lines.is_none()
    }

    pub fn lines(&self) -> &[String] {
        self.lines.as_deref().unwrap_or(&[])
    }

    /// Buffer as file content; joining the split lines restores the original
    /// text byte for byte, trailing newline included.
    pub fn content(&self) -> FileContent {
        match &self.lines {
            Some(lines) => FileContent::Text(lines.join("\n")),
            None => FileContent::Binary,
        }
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines().get(row).map(|l| l.chars().count()).unwrap_or(0)
    }

    fn byte_index(line: &str, col: usize) -> usize {
        line.char_indices().nth(col).map(|(i, _)| i).unwrap_or(line.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let (row, col) = (self.row, self.col);
        let Some(lines) = self.lines.as_mut() else { return };
        if let Some(line) = lines.get_mut(row) {
            let at = Self::byte_index(line, col);
            line.insert(at, c);
            self.col += 1;
            self.modified = true;
        }
    }

    pub fn newline(&mut self) {
        let (row, col) = (self.row, self.col);
        let Some(lines) = self.lines.as_mut() else { return };
        if let Some(line) = lines.get_mut(row) {
            let at = Self::byte_index(line, col);
            let rest = line.split_off(at);
            lines.insert(row + 1, rest);
            self.row += 1;
            self.col = 0;
            self.modified = true;
        }
    }

    pub fn backspace(&mut self) {
        let (row, col) = (self.row, self.col);
        let Some(lines) = self.lines.as_mut() else { return };
        if col > 0 {
            if let Some(line) = lines.get_mut(row) {
                let at = Self::byte_index(line, col - 1);
                line.remove(at);
                self.col -= 1;
                self.modified = true;
            }
        } else if row > 0 {
            let current = lines.remove(row);
            let prev = &mut lines[row - 1];
            self.col = prev.chars().count();
            prev.push_str(&current);
            self.row -= 1;
            self.modified = true;
        }
    }

    pub fn move_up(&mut self) {
        self.row = self.row.saturating_sub(1);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines().len() {
            self.row += 1;
        }
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines().len() {
            self.row += 1;
            self.col = 0;
        }
    }

    /// Keep the cursor row inside a viewport of `height` rows.
    pub fn scroll_into_view(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + height {
            self.scroll = self.row + 1 - height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(text: &str) -> Editor {
        Editor::open("u/r".into(), RemoteEntry::file("f.txt", text.len() as u64, "s"), FileContent::Text(text.into()))
    }

    #[test]
    fn untouched_buffer_round_trips() {
        for text in ["", "one", "one\ntwo\n", "\n\n"] {
            assert_eq!(editor(text).content(), FileContent::Text(text.to_string()));
        }
    }

    #[test]
    fn typing_splitting_and_joining_lines() {
        let mut ed = editor("héllo\n");
        ed.col = 2;
        ed.newline();
        assert_eq!(ed.lines(), &["hé", "llo", ""]);
        ed.insert_char('!');
        assert_eq!(ed.lines()[1], "!llo");
        ed.col = 0;
        ed.backspace();
        assert_eq!(ed.lines(), &["hé!llo", ""]);
        assert_eq!((ed.row, ed.col), (0, 2));
        assert!(ed.modified);
    }

    #[test]
    fn binary_is_read_only() {
        let mut ed = Editor::open("u/r".into(), RemoteEntry::file("b", 2, "s"), FileContent::Binary);
        ed.insert_char('x');
        assert!(ed.is_read_only());
        assert!(!ed.modified);
        assert_eq!(ed.content(), FileContent::Binary);
    }
}
