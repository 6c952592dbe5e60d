use super::{PResult, Parser};
use crate::ast::{ClassStmt, ImportStmt, ImportVariable, Method, MethodKind, Stmt, VarStmt};
use crate::token::{Token, TokenKind};

fn is_operator_name(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::Amp
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::LtLt
            | TokenKind::GtGt
            | TokenKind::DotDot
            | TokenKind::DotDotDot
            | TokenKind::Is
            | TokenKind::Bang
            | TokenKind::Tilde
    )
}

impl<'a> Parser<'a> {
    /// `['foreign'] 'class' Name ['is' Name] '{' method* '}'`
    pub(super) fn parse_class(&mut self) -> PResult<Stmt> {
        let foreign = self.match_token(TokenKind::Foreign).is_some();
        self.expect_token(TokenKind::Class, "'class'")?;
        let name = self.expect_name("class name")?;
        let superclass = match self.match_token(TokenKind::Is) {
            Some(_) => Some(self.expect_name("superclass name")?),
            None => None,
        };
        self.expect_token(TokenKind::LeftBrace, "'{' after class name")?;

        let mut methods = Vec::new();
        loop {
            self.skip_lines();
            if self.match_token(TokenKind::RightBrace).is_some() {
                break;
            }
            if self.eof() {
                return Err(self.err("'}' after class body"));
            }
            if self.check(TokenKind::Hash) {
                self.skip_attribute();
                continue;
            }
            methods.push(self.parse_method()?);
            self.end_of_statement()?;
        }

        Ok(Stmt::Class(ClassStmt {
            foreign,
            name,
            superclass,
            methods,
        }))
    }

    fn parse_method(&mut self) -> PResult<Method> {
        let mut is_construct = false;
        let mut is_foreign = false;
        let mut is_static = false;
        loop {
            match self.current().kind {
                TokenKind::Construct => is_construct = true,
                TokenKind::Foreign => is_foreign = true,
                TokenKind::Static => is_static = true,
                _ => break,
            }
            self.advance();
        }

        let (name, kind, parameters) = self.parse_signature()?;

        let body = if self.match_token(TokenKind::LeftBrace).is_some() {
            self.parse_block_body()?
        } else if is_foreign {
            Vec::new()
        } else {
            return Err(self.err("'{' before method body"));
        };

        Ok(Method {
            name,
            kind,
            parameters,
            is_construct,
            is_foreign,
            is_static,
            body,
        })
    }

    fn parse_signature(&mut self) -> PResult<(Token, MethodKind, Option<Vec<Token>>)> {
        let kind = self.current().kind;

        if kind == TokenKind::Name {
            let name = self.advance();
            if self.match_token(TokenKind::Eq).is_some() {
                let value = self.parse_setter_value()?;
                return Ok((name, MethodKind::Setter, Some(vec![value])));
            }
            let parameters = if self.check(TokenKind::LeftParen) {
                Some(self.parse_parameter_list()?)
            } else {
                None
            };
            return Ok((name, MethodKind::Named, parameters));
        }

        if kind == TokenKind::LeftBracket {
            let bracket = self.advance();
            let mut parameters = self.parse_names_until(TokenKind::RightBracket, "']'")?;
            if self.match_token(TokenKind::Eq).is_some() {
                parameters.push(self.parse_setter_value()?);
                return Ok((bracket, MethodKind::SubscriptSetter, Some(parameters)));
            }
            return Ok((bracket, MethodKind::Subscript, Some(parameters)));
        }

        if is_operator_name(kind) {
            let operator = self.advance();
            let parameters = if self.check(TokenKind::LeftParen) {
                Some(self.parse_parameter_list()?)
            } else {
                None
            };
            return Ok((operator, MethodKind::Operator, parameters));
        }

        Err(self.err("method name"))
    }

    /// `'(' Name ')'` after a setter's `=`.
    fn parse_setter_value(&mut self) -> PResult<Token> {
        self.expect_token(TokenKind::LeftParen, "'(' after '='")?;
        let value = self.expect_name("setter parameter")?;
        self.expect_token(TokenKind::RightParen, "')' after setter parameter")?;
        Ok(value)
    }

    pub(super) fn parse_parameter_list(&mut self) -> PResult<Vec<Token>> {
        self.expect_token(TokenKind::LeftParen, "'('")?;
        self.parse_names_until(TokenKind::RightParen, "')' after parameters")
    }

    /// Comma-separated names up to and including `close`.
    fn parse_names_until(&mut self, close: TokenKind, expected: &str) -> PResult<Vec<Token>> {
        let mut names = Vec::new();
        self.skip_lines();
        if self.match_token(close).is_some() {
            return Ok(names);
        }

        loop {
            names.push(self.expect_name("parameter name")?);
            self.skip_lines();
            if self.match_token(TokenKind::Comma).is_some() {
                self.skip_lines();
                continue;
            }
            self.expect_token(close, expected)?;
            return Ok(names);
        }
    }

    /// `'import' String ['for' Name ['as' Name] {',' Name ['as' Name]}]`
    pub(super) fn parse_import(&mut self) -> PResult<Stmt> {
        self.expect_token(TokenKind::Import, "'import'")?;
        let path = self.expect_token(TokenKind::String, "module path string")?;

        let mut variables = Vec::new();
        if self.match_token(TokenKind::For).is_some() {
            loop {
                self.skip_lines();
                let name = self.expect_name("imported variable name")?;
                let alias = match self.match_token(TokenKind::As) {
                    Some(_) => Some(self.expect_name("alias after 'as'")?),
                    None => None,
                };
                variables.push(ImportVariable { name, alias });
                if self.match_token(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        Ok(Stmt::Import(ImportStmt { path, variables }))
    }

    /// `'var' Name ['=' expr]`
    pub(super) fn parse_var(&mut self) -> PResult<Stmt> {
        self.expect_token(TokenKind::Var, "'var'")?;
        let name = self.expect_name("variable name")?;
        let initializer = if self.match_token(TokenKind::Eq).is_some() {
            self.skip_lines();
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Stmt::Var(VarStmt { name, initializer }))
    }
}
