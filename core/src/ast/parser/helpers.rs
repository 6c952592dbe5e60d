use super::{MAX_NESTING, PResult, Parser};
use crate::token::{ParseError, Token, TokenKind};

impl<'a> Parser<'a> {
    pub(super) fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.end)
    }

    pub(super) fn peek_ahead(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&self.end)
    }

    pub(super) fn eof(&self) -> bool {
        self.pos >= self.len || self.current().kind == TokenKind::Eof
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.eof() {
            self.pos += 1;
        }
        token
    }

    pub(super) fn match_token(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) { Some(self.advance()) } else { None }
    }

    pub(super) fn expect_token(&mut self, kind: TokenKind, expected: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.err(expected))
        }
    }

    pub(super) fn expect_name(&mut self, expected: &str) -> PResult<Token> {
        self.expect_token(TokenKind::Name, expected)
    }

    /// Error at the current token.
    pub(super) fn err(&self, expected: &str) -> ParseError {
        let found = self.current();
        ParseError::new(found.position(), expected, found.describe())
    }

    pub(super) fn skip_lines(&mut self) {
        while self.check(TokenKind::Line) {
            self.pos += 1;
        }
    }

    /// Skips newlines only when `kind` follows them. Returns whether it did.
    pub(super) fn skip_lines_before(&mut self, kind: TokenKind) -> bool {
        let mut ahead = 0;
        while self.peek_ahead(ahead).kind == TokenKind::Line {
            ahead += 1;
        }
        if ahead > 0 && self.peek_ahead(ahead).kind == kind {
            self.pos += ahead;
            true
        } else {
            false
        }
    }

    /// Attributes (`#key = value`, `#!runtime`, `#group(...)`) are not modeled.
    pub(super) fn skip_attribute(&mut self) {
        while !self.eof() && !self.check(TokenKind::Line) {
            self.pos += 1;
        }
    }

    /// A statement ends at a newline, a closing brace or the end of input.
    /// Only the newlines are consumed.
    pub(super) fn end_of_statement(&mut self) -> PResult<()> {
        match self.current().kind {
            TokenKind::Line => {
                self.skip_lines();
                Ok(())
            }
            TokenKind::RightBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.err("newline")),
        }
    }

    /// Runs `f` one nesting level deeper, failing once [`MAX_NESTING`] is
    /// exceeded.
    pub(super) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.err("shallower nesting"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}
