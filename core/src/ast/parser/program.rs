use super::{PResult, Parser};
use crate::ast::{Module, Stmt};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_module(&mut self) -> PResult<Module> {
        let mut statements = Vec::new();
        self.skip_lines();

        while !self.eof() {
            if self.check(TokenKind::Hash) {
                self.skip_attribute();
                self.skip_lines();
                continue;
            }
            statements.push(self.parse_definition()?);
            if self.check(TokenKind::RightBrace) {
                return Err(self.err("newline"));
            }
            self.end_of_statement()?;
        }

        Ok(Module::new(statements))
    }

    pub(super) fn parse_definition(&mut self) -> PResult<Stmt> {
        self.nested(|p| match p.current().kind {
            TokenKind::Class => p.parse_class(),
            TokenKind::Foreign if p.peek_ahead(1).kind == TokenKind::Class => p.parse_class(),
            TokenKind::Import => p.parse_import(),
            TokenKind::Var => p.parse_var(),
            _ => p.parse_statement(),
        })
    }

    /// Statements up to and including the closing `}`. The opening brace has
    /// already been consumed.
    pub(super) fn parse_block_body(&mut self) -> PResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        loop {
            self.skip_lines();
            if self.match_token(TokenKind::RightBrace).is_some() {
                return Ok(statements);
            }
            if self.eof() {
                return Err(self.err("'}'"));
            }
            if self.check(TokenKind::Hash) {
                self.skip_attribute();
                continue;
            }
            statements.push(self.parse_definition()?);
            self.end_of_statement()?;
        }
    }
}
