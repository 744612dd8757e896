//! Word reader (tokenizer) for header text
//!
//! Splits raw text into delimiter-bounded words. A delimiter that is not
//! whitespace is itself returned as a one-character word, so `std::map<int>`
//! reads as `std`, `:`, `:`, `map`, `<`, `int`, `>`. Whitespace around a word
//! is always skipped and newlines advance the 1-based line counter.
//!
//! End of input is never an error here: every read returns `None` and the
//! parser decides whether that is acceptable.

/// Default delimiter set: whitespace plus the grammar's structural punctuation.
pub const DEFAULT_DELIMITERS: &[char] = &[
    ' ', '\t', '\r', '\n', ':', ';', '{', '}', ',', '<', '>', '(', ')', '=', '#', '~', '*', '&',
    '[', ']',
];

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub struct WordReader {
    input: Vec<char>,
    position: usize,
    line: usize,
}

impl WordReader {
    pub fn new(input: &str) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    pub fn current_line(&self) -> usize {
        self.line
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Next word using [`DEFAULT_DELIMITERS`].
    pub fn next_word(&mut self) -> Option<String> {
        self.next_word_with(DEFAULT_DELIMITERS, false)
    }

    /// Next word bounded by `delimiters`.
    ///
    /// With `allow_empty`, a word that trims down to nothing is returned as
    /// `""` instead of being skipped.
    pub fn next_word_with(&mut self, delimiters: &[char], allow_empty: bool) -> Option<String> {
        loop {
            let first = self.peek_char(0)?;

            if delimiters.contains(&first) && !is_whitespace(first) {
                self.advance_to(self.position + 1);
                self.skip_whitespace();
                return Some(first.to_string());
            }

            // The first character is always consumed.
            let mut end = self.position + 1;
            while end < self.input.len() && !delimiters.contains(&self.input[end]) {
                end += 1;
            }

            let word: String = self.input[self.position..end].iter().collect();
            let word = word.trim().to_string();
            self.advance_to(end);

            if allow_empty || !word.is_empty() {
                self.skip_whitespace();
                return Some(word);
            }
        }
    }

    pub fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    /// Skips `count` characters without line accounting, clamped to the end.
    pub fn skip_char(&mut self, count: usize) {
        self.position = (self.position + count).min(self.input.len());
    }

    /// Skips `count` characters, counting newlines, then any whitespace.
    pub fn skip(&mut self, count: usize) {
        self.advance_to(self.position + count);
        self.skip_whitespace();
    }

    /// Skips to the end of the current line, then any whitespace.
    pub fn skip_line(&mut self) {
        while let Some(c) = self.peek_char(0) {
            if c == '\n' {
                break;
            }
            self.position += 1;
        }
        self.skip_whitespace();
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char(0) {
            if !is_whitespace(c) {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.position += 1;
        }
    }

    /// First character from `chars` at or after the cursor, without moving.
    /// `None` when no such character occurs before the end of input.
    pub fn find_next_of(&self, chars: &[char]) -> Option<char> {
        self.input[self.position..]
            .iter()
            .copied()
            .find(|c| chars.contains(c))
    }

    /// Rest of the current line, honouring `\` continuations. The cursor ends
    /// at the start of the following line.
    pub fn read_line(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek_char(0) {
            if c == '\\' && matches!(self.peek_char(1), Some('\n') | Some('\r')) {
                self.skip_char(1);
                if self.peek_char(0) == Some('\r') {
                    self.skip_char(1);
                }
                self.advance_to(self.position + 1);
                continue;
            }
            if c == '\n' {
                break;
            }
            text.push(c);
            self.position += 1;
        }
        self.skip_whitespace();
        text.trim().to_string()
    }

    /// Consumes a `"..."` or `'...'` literal at the cursor, quotes included.
    pub fn read_quoted(&mut self) -> Option<String> {
        let quote = self.peek_char(0).filter(|c| *c == '"' || *c == '\'')?;
        let mut end = self.position + 1;
        while end < self.input.len() {
            match self.input[end] {
                '\\' => end += 2,
                c if c == quote => {
                    end += 1;
                    break;
                }
                '\n' => break,
                _ => end += 1,
            }
        }
        let end = end.min(self.input.len());
        let literal: String = self.input[self.position..end].iter().collect();
        self.advance_to(end);
        self.skip_whitespace();
        Some(literal)
    }

    /// At `/*`: consumes the comment and returns its body.
    pub fn read_block_comment(&mut self) -> String {
        let start = self.position + 2;
        let mut end = start;
        while end < self.input.len()
            && !(self.input[end] == '*' && self.input.get(end + 1) == Some(&'/'))
        {
            end += 1;
        }
        let body: String = self.input[start.min(end)..end].iter().collect();
        self.advance_to(end + 2);
        self.skip_whitespace();
        body
    }

    /// Raw text up to, not including, the first of `stops` that sits outside
    /// any bracket pair or literal. Comments are dropped from the result.
    ///
    /// `<` only opens a pair directly after an identifier character, so
    /// `a < b` in a default value does not swallow the rest of the line.
    pub fn take_balanced_until(&mut self, stops: &[char]) -> String {
        let mut text = String::new();
        let mut closers: Vec<char> = Vec::new();

        while let Some(c) = self.peek_char(0) {
            if closers.is_empty() && stops.contains(&c) {
                break;
            }
            match c {
                '"' | '\'' => {
                    let start = self.position;
                    self.read_quoted_raw();
                    text.extend(&self.input[start..self.position]);
                    continue;
                }
                '/' if self.peek_char(1) == Some('/') => {
                    while let Some(c) = self.peek_char(0) {
                        if c == '\n' {
                            break;
                        }
                        self.position += 1;
                    }
                    continue;
                }
                '/' if self.peek_char(1) == Some('*') => {
                    self.read_block_comment();
                    text.push(' ');
                    continue;
                }
                '(' => closers.push(')'),
                '[' => closers.push(']'),
                '{' => closers.push('}'),
                '<' if text.chars().last().is_some_and(is_identifier_char) => closers.push('>'),
                _ => {
                    if closers.last() == Some(&c) {
                        closers.pop();
                    } else if matches!(c, ')' | ']' | '}') && !closers.is_empty() {
                        // Mismatched closer: unwind to it.
                        while let Some(open) = closers.pop() {
                            if open == c {
                                break;
                            }
                        }
                    }
                }
            }
            text.push(c);
            self.advance_to(self.position + 1);
        }

        text.trim().to_string()
    }

    /// Like [`read_quoted`](Self::read_quoted) but leaves trailing whitespace.
    fn read_quoted_raw(&mut self) {
        let Some(quote) = self.peek_char(0) else {
            return;
        };
        let mut end = self.position + 1;
        while end < self.input.len() {
            match self.input[end] {
                '\\' => end += 2,
                c if c == quote => {
                    end += 1;
                    break;
                }
                _ => end += 1,
            }
        }
        self.advance_to(end.min(self.input.len()));
    }

    /// Unread input, for the parser's lookahead scans.
    pub(crate) fn remaining(&self) -> &[char] {
        &self.input[self.position..]
    }

    fn advance_to(&mut self, target: usize) {
        let target = target.min(self.input.len());
        while self.position < target {
            if self.input[self.position] == '\n' {
                self.line += 1;
            }
            self.position += 1;
        }
    }
}
