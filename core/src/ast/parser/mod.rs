use crate::ast::Module;
use crate::token::{ParseError, Token, TokenKind, Tokenizer};

mod control;
mod declarations;
mod expr;
mod helpers;
mod program;

/// Maximum statement/expression nesting before the parser gives up. Each
/// level costs several frames, so this must stay safe on a 2 MiB debug-build
/// thread stack.
pub const MAX_NESTING: usize = 64;

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over a token slice ending with `Eof`.
pub struct Parser<'a> {
    pub(crate) tokens: &'a [Token],
    pub(crate) pos: usize,
    pub(crate) len: usize,
    pub(crate) depth: usize,
    end: Token,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let len = tokens.len();
        let end = match tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => last.clone(),
            Some(last) => Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line: last.line,
                column: last.column + last.length,
                length: 0,
                offset: last.offset + last.length as usize,
            },
            None => Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line: 1,
                column: 0,
                length: 0,
                offset: 0,
            },
        };
        Self {
            tokens,
            pos: 0,
            len,
            depth: 0,
            end,
        }
    }

    pub fn parse(&mut self) -> Result<Module, ParseError> {
        self.parse_module()
    }
}

/// Tokenize and parse one unit. Lexical errors surface as [`ParseError`]s.
pub fn parse_source(text: &str) -> Result<Module, ParseError> {
    let tokens = Tokenizer::tokenize(text)?;
    Parser::new(&tokens).parse()
}
