use std::fmt;

use once_cell::sync::Lazy;

use crate::token::{LexError, Position};
use crate::util::fast_map::{FastHashMap, fast_hash_map_with_capacity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    LeftBrace,    // {
    RightBrace,   // }
    Colon,        // :
    Dot,          // .
    DotDot,       // ..
    DotDotDot,    // ...
    Comma,        // ,
    Star,         // *
    Slash,        // /
    Percent,      // %
    Hash,         // #
    Plus,         // +
    Minus,        // -
    LtLt,         // <<
    GtGt,         // >>
    Pipe,         // |
    PipePipe,     // ||
    Amp,          // &
    AmpAmp,       // &&
    Caret,        // ^
    Bang,         // !
    Tilde,        // ~
    Question,     // ?
    Eq,           // =
    Lt,           // <
    Gt,           // >
    LtEq,         // <=
    GtEq,         // >=
    EqEq,         // ==
    BangEq,       // !=
    // Keywords
    As,
    Break,
    Class,
    Construct,
    Continue,
    Else,
    False,
    For,
    Foreign,
    If,
    Import,
    In,
    Is,
    Null,
    Return,
    Static,
    Super,
    This,
    True,
    Var,
    While,
    // Literals and names
    Name,
    Number,
    String,
    /// A newline. Wren statements are newline-terminated.
    Line,
    Eof,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::As
                | TokenKind::Break
                | TokenKind::Class
                | TokenKind::Construct
                | TokenKind::Continue
                | TokenKind::Else
                | TokenKind::False
                | TokenKind::For
                | TokenKind::Foreign
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Null
                | TokenKind::Return
                | TokenKind::Static
                | TokenKind::Super
                | TokenKind::This
                | TokenKind::True
                | TokenKind::Var
                | TokenKind::While
        )
    }
}

static KEYWORDS: Lazy<FastHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let entries = [
        ("as", TokenKind::As),
        ("break", TokenKind::Break),
        ("class", TokenKind::Class),
        ("construct", TokenKind::Construct),
        ("continue", TokenKind::Continue),
        ("else", TokenKind::Else),
        ("false", TokenKind::False),
        ("for", TokenKind::For),
        ("foreign", TokenKind::Foreign),
        ("if", TokenKind::If),
        ("import", TokenKind::Import),
        ("in", TokenKind::In),
        ("is", TokenKind::Is),
        ("null", TokenKind::Null),
        ("return", TokenKind::Return),
        ("static", TokenKind::Static),
        ("super", TokenKind::Super),
        ("this", TokenKind::This),
        ("true", TokenKind::True),
        ("var", TokenKind::Var),
        ("while", TokenKind::While),
    ];
    let mut map = fast_hash_map_with_capacity(entries.len());
    for (text, kind) in entries {
        map.insert(text, kind);
    }
    map
});

/// How an identifier reads lexically: a local/parameter name, an instance
/// field (`_name`) or a static field (`__name`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameClass {
    Local,
    Field,
    StaticField,
}

impl NameClass {
    pub fn of(text: &str) -> Self {
        if text.starts_with("__") {
            NameClass::StaticField
        } else if text.starts_with('_') {
            NameClass::Field
        } else {
            NameClass::Local
        }
    }
}

/// Uppercase first character: the lexical proxy for "this names a class".
pub fn is_class_shaped(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line of the first character.
    pub line: u32,
    /// 0-based column of the first character.
    pub column: u32,
    /// Length in characters.
    pub length: u32,
    pub offset: usize,
}

impl Token {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    pub fn is_class_shaped(&self) -> bool {
        self.kind == TokenKind::Name && is_class_shaped(&self.text)
    }

    pub fn name_class(&self) -> NameClass {
        NameClass::of(&self.text)
    }

    /// Rendering used in parse errors.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Line => "newline".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} @{}:{}", self.kind, self.text, self.line, self.column)
    }
}

/// Lazy token stream over one source unit.
///
/// Yields exactly one [`TokenKind::Eof`] token, positioned one past the last
/// character, and then ends. A lexical error ends the stream as well. Cloning
/// a fresh lexer restarts the scan.
#[derive(Debug, Clone)]
pub struct Lexer {
    chars: Vec<char>,
    idx: usize,
    line: u32,
    column: u32,
    done: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            idx: 0,
            line: 1,
            column: 0,
            done: false,
        }
    }

    pub fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.idx)
    }

    fn eof(&self) -> bool {
        self.idx >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).copied()
    }

    fn advance_char(&mut self) {
        if !self.eof() && self.chars[self.idx] == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        self.idx += 1;
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance_char();
        }
    }

    fn make_token(&self, kind: TokenKind, start: Position) -> Token {
        let text: String = self.chars[start.offset..self.idx].iter().collect();
        Token {
            kind,
            length: (self.idx - start.offset) as u32,
            text,
            line: start.line,
            column: start.column,
            offset: start.offset,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        // Stop before the newline so it still yields a Line token.
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.current_position();
        self.advance_by(2);
        let mut depth = 1usize;

        while !self.eof() {
            match (self.peek(), self.peek_at(1)) {
                (Some('/'), Some('*')) => {
                    self.advance_by(2);
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.advance_by(2);
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => self.advance_char(),
            }
        }

        Err(LexError::new("Unterminated block comment", start))
    }

    fn scan_name(&mut self, start: Position) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }
        let mut token = self.make_token(TokenKind::Name, start);
        if let Some(kind) = KEYWORDS.get(token.text.as_str()) {
            token.kind = *kind;
        }
        token
    }

    fn scan_number(&mut self, start: Position) -> Token {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance_by(2);
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance_char();
            }
            return self.make_token(TokenKind::Number, start);
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }

        // A '.' only continues the number when a digit follows, so `1..2` and
        // `1.abs` keep their dots.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance_char();
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.advance_by(digit_at);
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance_char();
                }
            }
        }

        self.make_token(TokenKind::Number, start)
    }

    fn scan_raw_string(&mut self, start: Position) -> Result<Token, LexError> {
        self.advance_by(3);
        while !self.eof() {
            if self.peek() == Some('"') && self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
                self.advance_by(3);
                return Ok(self.make_token(TokenKind::String, start));
            }
            self.advance_char();
        }
        Err(LexError::new("Unterminated raw string", start))
    }

    /// Consumes a quoted string including `%(...)` interpolations. Quotes that
    /// appear inside an interpolation open nested strings.
    fn scan_string_body(&mut self, start: Position) -> Result<(), LexError> {
        // opening quote
        self.advance_char();

        loop {
            let Some(c) = self.peek() else {
                return Err(LexError::new("Unterminated string", start));
            };
            match c {
                '"' => {
                    self.advance_char();
                    return Ok(());
                }
                '\\' => {
                    self.advance_char();
                    if self.eof() {
                        return Err(LexError::new("Incomplete escape sequence", start));
                    }
                    self.advance_char();
                }
                '%' if self.peek_at(1) == Some('(') => {
                    self.advance_by(2);
                    let mut depth = 1usize;
                    while depth > 0 {
                        let Some(inner) = self.peek() else {
                            return Err(LexError::new("Unterminated string interpolation", start));
                        };
                        match inner {
                            '(' => {
                                depth += 1;
                                self.advance_char();
                            }
                            ')' => {
                                depth -= 1;
                                self.advance_char();
                            }
                            '"' => {
                                let nested = self.current_position();
                                self.scan_string_body(nested)?;
                            }
                            _ => self.advance_char(),
                        }
                    }
                }
                _ => self.advance_char(),
            }
        }
    }

    fn scan_string(&mut self, start: Position) -> Result<Token, LexError> {
        if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
            return self.scan_raw_string(start);
        }
        self.scan_string_body(start)?;
        Ok(self.make_token(TokenKind::String, start))
    }

    /// Picks the longest punctuation match at the cursor.
    fn punctuation(&self, c: char) -> Option<(TokenKind, usize)> {
        let next = self.peek_at(1);
        let kind = match c {
            '(' => (TokenKind::LeftParen, 1),
            ')' => (TokenKind::RightParen, 1),
            '[' => (TokenKind::LeftBracket, 1),
            ']' => (TokenKind::RightBracket, 1),
            '{' => (TokenKind::LeftBrace, 1),
            '}' => (TokenKind::RightBrace, 1),
            ':' => (TokenKind::Colon, 1),
            ',' => (TokenKind::Comma, 1),
            '*' => (TokenKind::Star, 1),
            '/' => (TokenKind::Slash, 1),
            '%' => (TokenKind::Percent, 1),
            '#' => (TokenKind::Hash, 1),
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '^' => (TokenKind::Caret, 1),
            '~' => (TokenKind::Tilde, 1),
            '?' => (TokenKind::Question, 1),
            '.' => match (next, self.peek_at(2)) {
                (Some('.'), Some('.')) => (TokenKind::DotDotDot, 3),
                (Some('.'), _) => (TokenKind::DotDot, 2),
                _ => (TokenKind::Dot, 1),
            },
            '|' if next == Some('|') => (TokenKind::PipePipe, 2),
            '|' => (TokenKind::Pipe, 1),
            '&' if next == Some('&') => (TokenKind::AmpAmp, 2),
            '&' => (TokenKind::Amp, 1),
            '!' if next == Some('=') => (TokenKind::BangEq, 2),
            '!' => (TokenKind::Bang, 1),
            '=' if next == Some('=') => (TokenKind::EqEq, 2),
            '=' => (TokenKind::Eq, 1),
            '<' if next == Some('<') => (TokenKind::LtLt, 2),
            '<' if next == Some('=') => (TokenKind::LtEq, 2),
            '<' => (TokenKind::Lt, 1),
            '>' if next == Some('>') => (TokenKind::GtGt, 2),
            '>' if next == Some('=') => (TokenKind::GtEq, 2),
            '>' => (TokenKind::Gt, 1),
            _ => return None,
        };
        Some(kind)
    }

    fn scan_token(&mut self) -> Option<Result<Token, LexError>> {
        loop {
            self.skip_whitespace();
            let start = self.current_position();

            let Some(c) = self.peek() else {
                self.done = true;
                return Some(Ok(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    line: start.line,
                    column: start.column,
                    length: 0,
                    offset: start.offset,
                }));
            };

            match c {
                '\n' => {
                    self.advance_char();
                    return Some(Ok(self.make_token(TokenKind::Line, start)));
                }
                '/' if self.peek_at(1) == Some('/') => {
                    self.skip_line_comment();
                }
                '/' if self.peek_at(1) == Some('*') => {
                    if let Err(err) = self.skip_block_comment() {
                        return Some(Err(err));
                    }
                }
                '#' if self.idx == 0 && self.peek_at(1) == Some('!') => {
                    self.skip_line_comment();
                }
                '"' => return Some(self.scan_string(start)),
                c if c.is_ascii_digit() => return Some(Ok(self.scan_number(start))),
                c if c.is_alphabetic() || c == '_' => return Some(Ok(self.scan_name(start))),
                c => {
                    return match self.punctuation(c) {
                        Some((kind, len)) => {
                            self.advance_by(len);
                            Some(Ok(self.make_token(kind, start)))
                        }
                        None => Some(Err(LexError::new(format!("Unrecognized character '{}'", c), start))),
                    };
                }
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.scan_token();
        if matches!(item, Some(Err(_))) {
            self.done = true;
        }
        item
    }
}

pub struct Tokenizer;

impl Tokenizer {
    /// Tokenize a whole unit, ending with the `Eof` token.
    pub fn tokenize(s: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(s).collect()
    }

    /// Tokens up to the first lexical error. Never fails; used where a best
    /// effort over half-typed text is wanted.
    pub fn tokenize_prefix(s: &str) -> Vec<Token> {
        Lexer::new(s).map_while(Result::ok).collect()
    }
}
