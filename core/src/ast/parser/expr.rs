use super::{PResult, Parser};
use crate::ast::{AssignTarget, BlockArgument, Expr};
use crate::token::{NameClass, ParseError, TokenKind};

/// Binding power of infix operators, loosest first.
fn infix_precedence(kind: TokenKind) -> Option<u8> {
    let precedence = match kind {
        TokenKind::PipePipe => 1,
        TokenKind::AmpAmp => 2,
        TokenKind::EqEq | TokenKind::BangEq => 3,
        TokenKind::Is => 4,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => 5,
        TokenKind::Pipe => 6,
        TokenKind::Caret => 7,
        TokenKind::Amp => 8,
        TokenKind::LtLt | TokenKind::GtGt => 9,
        TokenKind::DotDot | TokenKind::DotDotDot => 10,
        TokenKind::Plus | TokenKind::Minus => 11,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 12,
        _ => return None,
    };
    Some(precedence)
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> PResult<Expr> {
        self.nested(|p| p.parse_assignment())
    }

    fn parse_assignment(&mut self) -> PResult<Expr> {
        let expr = self.parse_conditional()?;
        if !self.check(TokenKind::Eq) {
            return Ok(expr);
        }

        let eq = self.current().clone();
        let target = match expr {
            Expr::Call {
                receiver: None,
                name,
                arguments: None,
                block_argument: None,
            } => AssignTarget::from_name(name),
            Expr::Field(name) => AssignTarget::Field(name),
            Expr::StaticField(name) => AssignTarget::StaticField(name),
            setter @ Expr::Call {
                receiver: Some(_),
                arguments: None,
                block_argument: None,
                ..
            } => AssignTarget::Setter(Box::new(setter)),
            setter @ Expr::Subscript { .. } => AssignTarget::Setter(Box::new(setter)),
            _ => {
                return Err(ParseError::new(eq.position(), "assignable target before '='", eq.describe()));
            }
        };

        self.advance();
        self.skip_lines();
        let value = self.parse_expression()?;
        Ok(Expr::Assignment {
            target,
            value: Box::new(value),
        })
    }

    /// `cond ? then : else`, right associative.
    fn parse_conditional(&mut self) -> PResult<Expr> {
        let condition = self.parse_infix(1)?;
        if self.match_token(TokenKind::Question).is_none() {
            return Ok(condition);
        }

        self.skip_lines();
        let then_branch = self.nested(|p| p.parse_conditional())?;
        self.skip_lines();
        self.expect_token(TokenKind::Colon, "':' in conditional expression")?;
        self.skip_lines();
        let else_branch = self.nested(|p| p.parse_conditional())?;

        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    /// Precedence climbing over the left-associative binary operators.
    fn parse_infix(&mut self, min_precedence: u8) -> PResult<Expr> {
        let mut left = self.parse_prefix()?;

        while let Some(precedence) = infix_precedence(self.current().kind) {
            if precedence < min_precedence {
                break;
            }
            let operator = self.advance();
            self.skip_lines();
            let right = self.nested(|p| p.parse_infix(precedence + 1))?;
            left = Expr::Infix {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> PResult<Expr> {
        match self.current().kind {
            TokenKind::Minus | TokenKind::Bang | TokenKind::Tilde => {
                let operator = self.advance();
                let operand = self.nested(|p| p.parse_prefix())?;
                Ok(Expr::Prefix {
                    operator,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    /// Method calls, subscripts and chains continued on the next line with a
    /// leading `.`.
    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            let kind = self.current().kind;
            match kind {
                TokenKind::Dot => {
                    self.advance();
                    self.skip_lines();
                    let name = self.expect_name("method name after '.'")?;
                    let (arguments, block_argument) = self.parse_call_tail()?;
                    expr = Expr::Call {
                        receiver: Some(Box::new(expr)),
                        name,
                        arguments,
                        block_argument,
                    };
                }
                TokenKind::LeftBracket => {
                    let bracket = self.advance();
                    let arguments = self.parse_arguments_until(TokenKind::RightBracket, "']' after subscript")?;
                    expr = Expr::Subscript {
                        receiver: Box::new(expr),
                        bracket,
                        arguments,
                    };
                }
                TokenKind::Line if self.skip_lines_before(TokenKind::Dot) => {}
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.current().kind {
            TokenKind::Null => Ok(Expr::Null(self.advance())),
            TokenKind::True | TokenKind::False => Ok(Expr::Bool(self.advance())),
            TokenKind::Number => Ok(Expr::Num(self.advance())),
            TokenKind::String => Ok(Expr::Str(self.advance())),
            TokenKind::This => Ok(Expr::This(self.advance())),
            TokenKind::Super => {
                let keyword = self.advance();
                let name = match self.match_token(TokenKind::Dot) {
                    Some(_) => Some(self.expect_name("method name after 'super.'")?),
                    None => None,
                };
                let (arguments, block_argument) = self.parse_call_tail()?;
                Ok(Expr::Super {
                    keyword,
                    name,
                    arguments,
                    block_argument,
                })
            }
            TokenKind::Name => {
                let name = self.advance();
                match name.name_class() {
                    NameClass::Field => Ok(Expr::Field(name)),
                    NameClass::StaticField => Ok(Expr::StaticField(name)),
                    NameClass::Local => {
                        let (arguments, block_argument) = self.parse_call_tail()?;
                        Ok(Expr::Call {
                            receiver: None,
                            name,
                            arguments,
                            block_argument,
                        })
                    }
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                self.skip_lines();
                let inner = self.parse_expression()?;
                self.skip_lines();
                self.expect_token(TokenKind::RightParen, "')' after expression")?;
                Ok(Expr::Grouping(Box::new(inner)))
            }
            TokenKind::LeftBracket => {
                let bracket = self.advance();
                let elements = self.parse_arguments_until(TokenKind::RightBracket, "']' after list elements")?;
                Ok(Expr::List { bracket, elements })
            }
            TokenKind::LeftBrace => self.parse_map(),
            _ => Err(self.err("expression")),
        }
    }

    /// Optional `(args)` then optional block argument.
    fn parse_call_tail(&mut self) -> PResult<(Option<Vec<Expr>>, Option<BlockArgument>)> {
        let arguments = if self.match_token(TokenKind::LeftParen).is_some() {
            Some(self.parse_arguments_until(TokenKind::RightParen, "')' after arguments")?)
        } else {
            None
        };
        let block_argument = if self.check(TokenKind::LeftBrace) {
            Some(self.parse_block_argument()?)
        } else {
            None
        };
        Ok((arguments, block_argument))
    }

    /// Comma-separated expressions up to and including `close`. Newlines and a
    /// trailing comma are allowed.
    fn parse_arguments_until(&mut self, close: TokenKind, expected: &str) -> PResult<Vec<Expr>> {
        let mut arguments = Vec::new();

        loop {
            self.skip_lines();
            if self.match_token(close).is_some() {
                return Ok(arguments);
            }
            arguments.push(self.parse_expression()?);
            self.skip_lines();
            if self.match_token(TokenKind::Comma).is_none() {
                self.expect_token(close, expected)?;
                return Ok(arguments);
            }
        }
    }

    /// `'{' ['|' Name {',' Name} '|'] body '}'`
    fn parse_block_argument(&mut self) -> PResult<BlockArgument> {
        self.expect_token(TokenKind::LeftBrace, "'{'")?;

        let mut parameters = Vec::new();
        if self.match_token(TokenKind::PipePipe).is_none() && self.match_token(TokenKind::Pipe).is_some() {
            loop {
                parameters.push(self.expect_name("block parameter name")?);
                if self.match_token(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect_token(TokenKind::Pipe, "'|' after block parameters")?;
        }

        let body = self.parse_block_body()?;
        Ok(BlockArgument { parameters, body })
    }

    fn parse_map(&mut self) -> PResult<Expr> {
        let brace = self.expect_token(TokenKind::LeftBrace, "'{'")?;
        let mut entries = Vec::new();

        loop {
            self.skip_lines();
            if self.match_token(TokenKind::RightBrace).is_some() {
                break;
            }
            let key = self.parse_expression()?;
            self.skip_lines();
            self.expect_token(TokenKind::Colon, "':' after map key")?;
            self.skip_lines();
            let value = self.parse_expression()?;
            entries.push((key, value));
            self.skip_lines();
            if self.match_token(TokenKind::Comma).is_none() {
                self.expect_token(TokenKind::RightBrace, "'}' after map entries")?;
                break;
            }
        }

        Ok(Expr::Map { brace, entries })
    }
}
