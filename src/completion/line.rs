//! Line state for completion requests
//!
//! Splits the text before the cursor into words. Whitespace separates words
//! unless it sits inside a matching pair of `"` or `'` quotes; the quotes
//! themselves are removed from the word text. Word spans are byte offsets
//! into the original line so hosts can replace text in place.

/// One word of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Word text with quotes removed
    pub text: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

/// Words before the cursor and whether the cursor follows whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineState {
    words: Vec<Word>,
    trailing_space: bool,
    cursor: usize,
    raw: String,
}

struct Tokenizer {
    chars: Vec<(usize, char)>,
    len: usize,
    pos: usize,
    open_quote: bool,
}

impl Tokenizer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.char_indices().collect(),
            len: input.len(),
            pos: 0,
            open_quote: false,
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn current_char(&self) -> char {
        self.chars[self.pos].1
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |&(offset, _)| offset)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.pos += 1;
        }
    }

    fn next_word(&mut self) -> Option<Word> {
        self.skip_whitespace();
        if self.is_at_end() {
            return None;
        }

        let start = self.offset();
        let mut text = String::new();
        let mut quote: Option<char> = None;

        while !self.is_at_end() {
            let ch = self.current_char();
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => text.push(ch),
                None if ch.is_whitespace() => break,
                None if ch == '"' || ch == '\'' => quote = Some(ch),
                None => text.push(ch),
            }
            self.pos += 1;
        }

        self.open_quote = quote.is_some();
        Some(Word {
            text,
            start,
            end: self.offset(),
        })
    }

    fn words(mut self) -> (Vec<Word>, bool) {
        let mut words = Vec::new();
        while let Some(word) = self.next_word() {
            words.push(word);
        }
        (words, self.open_quote)
    }
}

/// Split `text` into words using the line quoting rules.
pub fn split_words(text: &str) -> Vec<String> {
    Tokenizer::new(text)
        .words()
        .0
        .into_iter()
        .map(|word| word.text)
        .collect()
}

impl LineState {
    /// Parse `line` up to byte offset `cursor`.
    ///
    /// A cursor past the end of the line, or inside a multi-byte character,
    /// is moved back to the nearest character boundary.
    ///
    /// # Arguments
    /// * `line` - Full input line
    /// * `cursor` - Cursor position as a byte offset
    ///
    /// # Returns
    /// * `LineState` - Words before the cursor
    pub fn parse(line: &str, cursor: usize) -> Self {
        let mut cursor = cursor.min(line.len());
        while !line.is_char_boundary(cursor) {
            cursor -= 1;
        }

        let before = &line[..cursor];
        let (words, open_quote) = Tokenizer::new(before).words();
        let trailing_space = !open_quote && before.ends_with(char::is_whitespace);

        Self {
            words,
            trailing_space,
            cursor,
            raw: before.to_string(),
        }
    }

    /// All words before the cursor.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Whether the cursor follows whitespace, i.e. a new word is starting.
    pub fn trailing_space(&self) -> bool {
        self.trailing_space
    }

    /// Cursor byte offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The first word, naming the command.
    pub fn command_word(&self) -> Option<&Word> {
        self.words.first()
    }

    /// Words after the command word.
    pub fn arguments(&self) -> &[Word] {
        self.words.get(1..).unwrap_or(&[])
    }

    /// True once there is an argument position to complete: a second word,
    /// or a single word followed by whitespace.
    pub fn has_completable_argument(&self) -> bool {
        self.words.len() >= 2 || (self.words.len() == 1 && self.trailing_space)
    }

    /// The partially typed word under the cursor, `None` after whitespace.
    pub fn current_word(&self) -> Option<&Word> {
        if self.trailing_space {
            None
        } else {
            self.words.last()
        }
    }

    /// Text of the word under the cursor, empty after whitespace.
    pub fn current_text(&self) -> &str {
        self.current_word().map_or("", |word| word.text.as_str())
    }

    /// Whether an `=`-joined option value is being completed.
    pub fn completing_option_value(&self) -> bool {
        self.current_text().contains('=')
    }

    /// Byte offset where the word under the cursor begins.
    pub fn completion_start(&self) -> usize {
        self.current_word().map_or(self.cursor, |word| word.start)
    }

    /// Byte offset where inserted match text should begin.
    ///
    /// Matches replace only the part of the current word after its last
    /// `=`, `,` or `;`, mirroring how match text is derived.
    pub fn replacement_start(&self) -> usize {
        match self.current_word() {
            Some(word) => {
                let raw = &self.raw[word.start..word.end];
                raw.rfind(['=', ',', ';'])
                    .map_or(word.start, |index| word.start + index + 1)
            }
            None => self.cursor,
        }
    }
}
