mod node;
mod parser;

#[cfg(test)]
mod ast_test;

pub use node::*;
pub use parser::{MAX_NESTING, Parser, parse_source};
