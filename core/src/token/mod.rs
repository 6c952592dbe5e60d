mod error;
mod lexer;

#[cfg(test)]
mod token_test;

pub use error::{LexError, ParseError, Position};
pub use lexer::{Lexer, NameClass, Token, TokenKind, Tokenizer, is_class_shaped};
