use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Submit,
    Cancel,
    /// Tab / Shift-Tab: move focus between fields.
    NextField,
    PrevField,
}

/// Single-line text field with readline-style editing.
pub struct LineInput {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
    /// Render every char as `•` (secrets).
    pub masked: bool,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
            masked: false,
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    /// Returns (before_cursor, cursor_char, after_cursor) as displayed,
    /// with masking applied. `cursor_char` is None at end of text.
    pub fn display_parts(&self) -> (String, Option<char>, String) {
        let shown: Vec<char> = if self.masked {
            self.text.chars().map(|_| '•').collect()
        } else {
            self.text.chars().collect()
        };
        let cursor = self.cursor.min(shown.len());
        let before: String = shown[..cursor].iter().collect();
        let at = shown.get(cursor).copied();
        let after: String = shown.get(cursor + 1..).unwrap_or_default().iter().collect();
        (before, at, after)
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,
            KeyCode::Tab => return InputResult::NextField,
            KeyCode::BackTab => return InputResult::PrevField,
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    self.remove_at(self.cursor);
                }
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.len(),
            KeyCode::Char('u') if ctrl => {
                self.text.clear();
                self.cursor = 0;
            }
            KeyCode::Char('w') if ctrl => self.delete_word_back(),
            KeyCode::Char(ch) if !ctrl => {
                let byte_offset = self.char_to_byte(self.cursor);
                self.text.insert(byte_offset, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn remove_at(&mut self, char_idx: usize) {
        let start = self.char_to_byte(char_idx);
        let end = self.char_to_byte(char_idx + 1);
        self.text.replace_range(start..end, "");
    }

    /// Convert char index to byte offset.
    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    /// Unix word rubout: skip whitespace, then non-whitespace.
    fn delete_word_back(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        let start = self.char_to_byte(pos);
        let end = self.char_to_byte(self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor = pos;
    }
}
