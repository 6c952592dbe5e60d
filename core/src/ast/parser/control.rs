use super::{PResult, Parser};
use crate::ast::{Expr, Stmt};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.current().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                let keyword = self.advance();
                let value = match self.current().kind {
                    TokenKind::Line | TokenKind::RightBrace | TokenKind::Eof => None,
                    _ => Some(self.parse_expression()?),
                };
                Ok(Stmt::Return { keyword, value })
            }
            TokenKind::Break => Ok(Stmt::Break(self.advance())),
            TokenKind::Continue => Ok(Stmt::Continue(self.advance())),
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.parse_block_body()?))
            }
            _ => Ok(Stmt::Expr(self.parse_expression()?)),
        }
    }

    /// Body of `if`/`while`/`for`: a block or a single statement.
    fn parse_branch(&mut self) -> PResult<Box<Stmt>> {
        self.nested(|p| p.parse_statement()).map(Box::new)
    }

    fn parse_condition(&mut self, keyword: &str) -> PResult<Expr> {
        self.expect_token(TokenKind::LeftParen, &format!("'(' after '{}'", keyword))?;
        self.skip_lines();
        let condition = self.parse_expression()?;
        self.skip_lines();
        self.expect_token(TokenKind::RightParen, "')' after condition")?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let keyword = self.advance();
        let condition = self.parse_condition("if")?;
        let then_branch = self.parse_branch()?;

        let else_branch = if self.check(TokenKind::Else) || self.skip_lines_before(TokenKind::Else) {
            self.advance();
            Some(self.parse_branch()?)
        } else {
            None
        };

        Ok(Stmt::If {
            keyword,
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let keyword = self.advance();
        let condition = self.parse_condition("while")?;
        let body = self.parse_branch()?;
        Ok(Stmt::While {
            keyword,
            condition,
            body,
        })
    }

    /// `'for' '(' Name 'in' expr ')' statement`
    fn parse_for(&mut self) -> PResult<Stmt> {
        let keyword = self.advance();
        self.expect_token(TokenKind::LeftParen, "'(' after 'for'")?;
        self.skip_lines();
        let variable = self.expect_name("loop variable name")?;
        self.expect_token(TokenKind::In, "'in' after loop variable")?;
        self.skip_lines();
        let iterator = self.parse_expression()?;
        self.skip_lines();
        self.expect_token(TokenKind::RightParen, "')' after loop expression")?;
        let body = self.parse_branch()?;
        Ok(Stmt::For {
            keyword,
            variable,
            iterator,
            body,
        })
    }
}
