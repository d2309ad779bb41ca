//! Plain-text source buffer behind the editing mode
//!
//! Lines are stored separately; the cursor column counts characters, not
//! bytes, and is clamped whenever it moves onto a shorter line.

/// Spaces inserted by the Tab key
pub const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone)]
pub struct Editor {
    lines: Vec<String>,
    row: usize,
    col: usize,
    modified: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new("")
    }
}

impl Editor {
    pub fn new(text: &str) -> Self {
        let mut editor = Editor {
            lines: Vec::new(),
            row: 0,
            col: 0,
            modified: false,
        };
        editor.set_text(text);
        editor
    }

    /// Replace the whole buffer and move the cursor to the top
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.lines().map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.row = 0;
        self.col = 0;
        self.modified = false;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Cursor as (row, column), both zero-based
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Whether the buffer changed since it was last loaded
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |line| line.chars().count())
    }

    fn byte_index(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map_or(line.len(), |(index, _)| index)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.lines[self.row].insert(at, c);
        self.col += 1;
        self.modified = true;
    }

    pub fn insert_tab(&mut self) {
        for _ in 0..TAB_WIDTH {
            self.insert_char(' ');
        }
    }

    /// Split the line at the cursor, carrying its indentation over
    pub fn newline(&mut self) {
        let at = self.byte_index();
        let rest = self.lines[self.row].split_off(at);
        let indent: String = self.lines[self.row]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        self.col = indent.chars().count();
        self.row += 1;
        self.lines.insert(self.row, indent + &rest);
        self.modified = true;
    }

    /// Delete the character before the cursor, joining lines at column 0
    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let at = self.byte_index();
            self.lines[self.row].remove(at);
            self.modified = true;
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
            self.modified = true;
        }
    }

    /// Delete the character under the cursor, joining lines at the end
    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let at = self.byte_index();
            self.lines[self.row].remove(at);
            self.modified = true;
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            self.modified = true;
        }
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
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_len(self.row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_text() {
        let editor = Editor::new("a\nb\n");
        assert_eq!(editor.lines().len(), 2);
        assert_eq!(editor.text(), "a\nb");
        assert_eq!(Editor::new("").lines().len(), 1);
    }

    #[test]
    fn test_typing_and_tab() {
        let mut editor = Editor::new("");
        editor.insert_tab();
        for c in "x = 1;".chars() {
            editor.insert_char(c);
        }
        assert_eq!(editor.text(), "    x = 1;");
        assert_eq!(editor.cursor(), (0, 10));
        assert!(editor.is_modified());
    }

    #[test]
    fn test_newline_keeps_indent() {
        let mut editor = Editor::new("  if (a) {}");
        editor.move_end();
        editor.move_left();
        editor.newline();
        assert_eq!(editor.text(), "  if (a) {\n  }");
        assert_eq!(editor.cursor(), (1, 2));
    }

    #[test]
    fn test_backspace_and_delete_join_lines() {
        let mut editor = Editor::new("ab\ncd");
        editor.move_down();
        editor.backspace();
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.cursor(), (0, 2));

        editor.move_end();
        editor.delete();
        assert_eq!(editor.text(), "abcd");
        editor.move_home();
        editor.delete();
        assert_eq!(editor.text(), "bcd");
    }

    #[test]
    fn test_cursor_clamps_on_short_lines() {
        let mut editor = Editor::new("long line\nx\nanother");
        editor.move_end();
        editor.move_down();
        assert_eq!(editor.cursor(), (1, 1));
        editor.move_right();
        assert_eq!(editor.cursor(), (2, 0));
        editor.move_left();
        assert_eq!(editor.cursor(), (1, 1));
    }

    #[test]
    fn test_multibyte_characters() {
        let mut editor = Editor::new("é");
        editor.move_end();
        editor.insert_char('ß');
        editor.move_left();
        editor.backspace();
        assert_eq!(editor.text(), "ß");
    }
}
